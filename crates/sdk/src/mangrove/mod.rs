//! [`crate::dex`] implementation on top of the Mangrove contracts.

mod market;
mod provider;

use std::collections::HashMap;

use alloy::{
    primitives::{Address, U256},
    providers::{DynProvider, Provider},
    rpc::types::TransactionReceipt,
};
use itertools::Itertools;
pub use market::MangroveMarket;
pub use provider::MangroveLiquidityProvider;
use tracing::debug;

use crate::{
    Deployment,
    abi::{
        erc20::IERC20,
        mangrove::{MgvReader, OLKey},
    },
    dex::Dex,
    error::DexError,
    types::{MarketDescriptor, OrderSide, Token, TxSummary},
};

/// Gas reserved for the maker side of a posted offer when it is taken.
pub const DEFAULT_OFFER_GASREQ: u64 = 100_000;

/// Client of the exchange acting on behalf of the provider's signer.
///
/// Provider is expected to be built with a wallet filler for `signer`, so that
/// sent transactions get signed and nonces get assigned by the provider.
#[derive(Clone)]
pub struct MangroveClient {
    provider: DynProvider,
    deployment: Deployment,
    signer: Address,
    offer_gasreq: u64,
}

impl MangroveClient {
    pub fn new(provider: DynProvider, deployment: Deployment, signer: Address) -> Self {
        Self { provider, deployment, signer, offer_gasreq: DEFAULT_OFFER_GASREQ }
    }

    /// Overrides gas requirement of offers posted through this client.
    pub fn with_offer_gasreq(mut self, offer_gasreq: u64) -> Self {
        self.offer_gasreq = offer_gasreq;
        self
    }

    pub fn provider(&self) -> &DynProvider { &self.provider }

    pub fn deployment(&self) -> Deployment { self.deployment }

    /// Fetches token metadata.
    pub async fn token(&self, address: Address) -> Result<Token, DexError> {
        let erc20 = IERC20::new(address, self.provider.clone());
        let (symbol, decimals) = futures::try_join!(
            async { erc20.symbol().call().await },
            async { erc20.decimals().call().await },
        )?;
        Ok(Token::new(address, symbol, decimals))
    }
}

impl Dex for MangroveClient {
    type Market = MangroveMarket;

    fn address(&self) -> Address { self.signer }

    async fn open_markets(&self) -> Result<Vec<MarketDescriptor>, DexError> {
        let reader = MgvReader::new(self.deployment.reader(), self.provider.clone());
        let num_markets = reader.numOpenMarkets().call().await?;
        let markets = reader
            .openMarkets(U256::ZERO, num_markets, false)
            .call()
            .await?
            .markets;
        debug!(num_markets = markets.len(), "fetched open markets");

        let addresses: Vec<Address> = markets
            .iter()
            .flat_map(|m| [m.tkn0, m.tkn1])
            .unique()
            .collect();
        let tokens: HashMap<Address, Token> =
            futures::future::try_join_all(addresses.into_iter().map(|a| self.token(a)))
                .await?
                .into_iter()
                .map(|t| (t.address(), t))
                .collect();

        let token = |address: &Address| {
            tokens.get(address).cloned().ok_or_else(|| {
                DexError::InvalidRequest(format!("no metadata for token {address}"))
            })
        };
        markets
            .iter()
            .map(|m| {
                Ok(MarketDescriptor {
                    tkn0: token(&m.tkn0)?,
                    tkn1: token(&m.tkn1)?,
                    tick_spacing: u64::try_from(m.tickSpacing).ok().filter(|ts| *ts > 0),
                })
            })
            .collect()
    }

    async fn market(
        &self,
        base: &Token,
        quote: &Token,
        tick_spacing: u64,
    ) -> Result<MangroveMarket, DexError> {
        Ok(MangroveMarket::new(
            self.provider.clone(),
            self.deployment,
            self.signer,
            base.clone(),
            quote.clone(),
            tick_spacing,
            self.offer_gasreq,
        ))
    }

    async fn transaction_count(&self) -> Result<u64, DexError> {
        Ok(self
            .provider
            .get_transaction_count(self.signer)
            .pending()
            .await?)
    }

    async fn native_balance(&self, owner: Address) -> Result<U256, DexError> {
        Ok(self.provider.get_balance(owner).await?)
    }
}

/// Key of the offer list holding the offers of the given side.
/// Asks give base for quote, bids give quote for base.
pub(crate) fn ol_key(base: &Token, quote: &Token, tick_spacing: u64, side: OrderSide) -> OLKey {
    let (outbound, inbound) = match side {
        OrderSide::Ask => (base, quote),
        OrderSide::Bid => (quote, base),
    };
    OLKey {
        outbound_tkn: outbound.address(),
        inbound_tkn: inbound.address(),
        tickSpacing: U256::from(tick_spacing),
    }
}

/// Summary of the mined transaction, failing if it reverted.
pub(crate) fn summarize(receipt: &TransactionReceipt) -> Result<TxSummary, DexError> {
    if !receipt.status() {
        return Err(DexError::Reverted(receipt.transaction_hash));
    }
    Ok(TxSummary {
        tx_hash: receipt.transaction_hash,
        block_number: receipt.block_number,
        gas_used: receipt.gas_used,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ol_key() {
        let base = Token::new(Address::repeat_byte(1), "WETH", 18);
        let quote = Token::new(Address::repeat_byte(2), "USDB", 18);

        let asks = ol_key(&base, &quote, 1, OrderSide::Ask);
        assert_eq!(asks.outbound_tkn, base.address());
        assert_eq!(asks.inbound_tkn, quote.address());
        assert_eq!(asks.tickSpacing, U256::from(1));

        let bids = ol_key(&base, &quote, 1, OrderSide::Bid);
        assert_eq!(bids.outbound_tkn, quote.address());
        assert_eq!(bids.inbound_tkn, base.address());
    }
}
