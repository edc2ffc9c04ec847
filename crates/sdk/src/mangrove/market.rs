use alloy::{
    primitives::{Address, I256, U256},
    providers::DynProvider,
};
use fastnum::UD128;
use tracing::{debug, info};

use super::{MangroveLiquidityProvider, ol_key, summarize};
use crate::{
    Deployment,
    abi::{
        erc20::IERC20,
        mangrove::{self as abi, Mangrove, MgvReader, OLKey},
    },
    dex::Market,
    error::DexError,
    num,
    types::{Offer, OrderSide, TakeParams, TakeResult, Token, TokenRole, TxSummary},
};

/// Number of offers fetched per `offerList` call.
const OFFER_PAGE_SIZE: u64 = 100;

/// Market handle bound to the client's signer.
#[derive(Clone)]
pub struct MangroveMarket {
    provider: DynProvider,
    deployment: Deployment,
    signer: Address,
    base: Token,
    quote: Token,
    tick_spacing: u64,
    offer_gasreq: u64,
}

impl MangroveMarket {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        provider: DynProvider,
        deployment: Deployment,
        signer: Address,
        base: Token,
        quote: Token,
        tick_spacing: u64,
        offer_gasreq: u64,
    ) -> Self {
        Self { provider, deployment, signer, base, quote, tick_spacing, offer_gasreq }
    }

    pub(crate) fn provider(&self) -> &DynProvider { &self.provider }

    pub(crate) fn deployment(&self) -> Deployment { self.deployment }

    pub(crate) fn signer(&self) -> Address { self.signer }

    pub(crate) fn offer_gasreq(&self) -> u64 { self.offer_gasreq }

    pub(crate) fn ol_key(&self, side: OrderSide) -> OLKey {
        ol_key(&self.base, &self.quote, self.tick_spacing, side)
    }

    pub(crate) fn token(&self, role: TokenRole) -> &Token {
        match role {
            TokenRole::Base => &self.base,
            TokenRole::Quote => &self.quote,
        }
    }

    /// Token given by the makers of the side.
    pub(crate) fn outbound(&self, side: OrderSide) -> &Token {
        match side {
            OrderSide::Ask => &self.base,
            OrderSide::Bid => &self.quote,
        }
    }

    /// Token wanted by the makers of the side.
    pub(crate) fn inbound(&self, side: OrderSide) -> &Token { self.outbound(side.opposite()) }

    /// Price in quote per base of an offer at `tick` on the side.
    fn price(&self, side: OrderSide, tick: I256) -> Result<UD128, DexError> {
        let ratio = num::tick_to_ratio(tick)?;
        let scale = num::pow10(self.base.decimals()) / num::pow10(self.quote.decimals());
        match side {
            // quote/base in raw units
            OrderSide::Ask => Ok(ratio * scale),
            // base/quote in raw units
            OrderSide::Bid => Ok(scale / ratio),
        }
    }

    /// Offers of the side, best first, optionally only those of one maker.
    pub(crate) async fn offers(
        &self,
        side: OrderSide,
        maker: Option<Address>,
    ) -> Result<Vec<Offer>, DexError> {
        let reader = MgvReader::new(self.deployment.reader(), self.provider.clone());
        let ol_key = self.ol_key(side);
        let gives_converter = self.outbound(side).converter();

        let mut offers = Vec::new();
        let mut from_id = U256::ZERO;
        loop {
            let page = reader
                .offerList(ol_key.clone(), from_id, U256::from(OFFER_PAGE_SIZE))
                .call()
                .await?;
            for ((id, offer), detail) in page.offerIds.iter().zip(&page.offers).zip(&page.details) {
                if maker.is_some_and(|m| m != detail.maker) {
                    continue;
                }
                offers.push(Offer {
                    id: u64::try_from(*id)
                        .map_err(|_| DexError::Conversion(format!("offer id out of range: {id}")))?,
                    side,
                    maker: detail.maker,
                    price: self.price(side, offer.tick)?,
                    gives: gives_converter.from_unsigned(offer.gives)?,
                });
            }
            if page.nextId.is_zero() {
                break;
            }
            from_id = page.nextId;
        }
        debug!(%side, num_offers = offers.len(), "fetched offers");
        Ok(offers)
    }

    /// Executes market order against the offers of `side`.
    /// `wants`/`gives` are raw amounts from the taker perspective.
    async fn take(
        &self,
        side: OrderSide,
        wants: U256,
        gives: U256,
        fill_wants: bool,
        fill_or_kill: bool,
    ) -> Result<TakeResult, DexError> {
        let mangrove = Mangrove::new(self.deployment.mangrove(), self.provider.clone());
        let order = mangrove
            .marketOrderByVolume(self.ol_key(side), wants, gives, fill_wants)
            .from(self.signer);

        let got_token = self.outbound(side).clone();
        let gave_token = self.inbound(side).clone();

        if fill_or_kill {
            // Dry run first, nothing gets sent unless the order fills completely
            let simulated = order.call().await?;
            let (filled, target) = if fill_wants {
                (simulated.takerGot, wants)
            } else {
                (simulated.takerGave, gives)
            };
            if filled < target {
                let converter =
                    if fill_wants { got_token.converter() } else { gave_token.converter() };
                return Err(DexError::NotFilled {
                    wanted: converter.from_unsigned(target)?.to_string(),
                    got: converter.from_unsigned(filled)?.to_string(),
                });
            }
        }

        let got_erc20 = IERC20::new(got_token.address(), self.provider.clone());
        let gave_erc20 = IERC20::new(gave_token.address(), self.provider.clone());
        let (got_before, gave_before) = futures::try_join!(
            async { got_erc20.balanceOf(self.signer).call().await },
            async { gave_erc20.balanceOf(self.signer).call().await },
        )?;

        let receipt = order.send().await?.get_receipt().await?;
        let tx = summarize(&receipt)?;

        let (got_after, gave_after) = futures::try_join!(
            async { got_erc20.balanceOf(self.signer).call().await },
            async { gave_erc20.balanceOf(self.signer).call().await },
        )?;

        let result = TakeResult {
            got: got_token
                .converter()
                .from_unsigned(got_after.saturating_sub(got_before))?,
            gave: gave_token
                .converter()
                .from_unsigned(gave_before.saturating_sub(gave_after))?,
            tx,
        };
        info!(
            %side,
            got = %result.got,
            gave = %result.gave,
            tx = %result.tx.tx_hash,
            "market order executed"
        );
        Ok(result)
    }
}

impl Market for MangroveMarket {
    type LiquidityProvider = MangroveLiquidityProvider;

    fn base(&self) -> &Token { &self.base }

    fn quote(&self) -> &Token { &self.quote }

    fn tick_spacing(&self) -> u64 { self.tick_spacing }

    async fn is_active(&self) -> Result<bool, DexError> {
        let reader = MgvReader::new(self.deployment.reader(), self.provider.clone());
        let market = abi::Market {
            tkn0: self.base.address(),
            tkn1: self.quote.address(),
            tickSpacing: U256::from(self.tick_spacing),
        };
        Ok(reader.isMarketOpen(market).call().await?)
    }

    async fn semibook(&self, side: OrderSide) -> Result<Vec<Offer>, DexError> {
        self.offers(side, None).await
    }

    async fn buy(&self, params: TakeParams) -> Result<TakeResult, DexError> {
        // Taking asks: wants base, gives quote
        let wants = self.base.converter().to_unsigned(params.volume)?;
        let gives = self
            .quote
            .converter()
            .to_unsigned(params.volume * params.limit_price)?;
        self.take(OrderSide::Ask, wants, gives, true, params.fill_or_kill)
            .await
    }

    async fn sell(&self, params: TakeParams) -> Result<TakeResult, DexError> {
        // Taking bids: wants quote, gives base
        let wants = self
            .quote
            .converter()
            .to_unsigned(params.volume * params.limit_price)?;
        let gives = self.base.converter().to_unsigned(params.volume)?;
        self.take(OrderSide::Bid, wants, gives, false, params.fill_or_kill)
            .await
    }

    async fn balance_of(&self, token: TokenRole, owner: Address) -> Result<UD128, DexError> {
        let token = self.token(token);
        let balance = IERC20::new(token.address(), self.provider.clone())
            .balanceOf(owner)
            .call()
            .await?;
        token.converter().from_unsigned(balance)
    }

    async fn approve(&self, token: TokenRole, amount: UD128) -> Result<TxSummary, DexError> {
        let token = self.token(token);
        let raw_amount = token.converter().to_unsigned(amount)?;
        let receipt = IERC20::new(token.address(), self.provider.clone())
            .approve(self.deployment.mangrove(), raw_amount)
            .send()
            .await?
            .get_receipt()
            .await?;
        let tx = summarize(&receipt)?;
        info!(token = %token, %amount, tx = %tx.tx_hash, "approved exchange spending");
        Ok(tx)
    }

    async fn liquidity_provider(&self) -> Result<MangroveLiquidityProvider, DexError> {
        Ok(MangroveLiquidityProvider::new(self.clone()))
    }
}
