use alloy::{primitives::U256, rpc::types::TransactionReceipt, sol_types::SolEvent};
use fastnum::UD128;
use tracing::info;

use super::{MangroveMarket, summarize};
use crate::{
    abi::mangrove::{Mangrove, MgvReader},
    dex::LiquidityProvider,
    error::DexError,
    num::Converter,
    types::{Offer, OfferId, OfferParams, OrderSide, PlacedOffer, TxSummary},
};

/// Posts and retracts offers of the signer itself (no maker contract).
#[derive(Clone)]
pub struct MangroveLiquidityProvider {
    market: MangroveMarket,
}

impl MangroveLiquidityProvider {
    pub(crate) fn new(market: MangroveMarket) -> Self { Self { market } }

    async fn provision(&self, side: OrderSide) -> Result<UD128, DexError> {
        let reader =
            MgvReader::new(self.market.deployment().reader(), self.market.provider().clone());
        let wei = reader
            .getProvisionWithDefaultGasPrice(
                self.market.ol_key(side),
                U256::from(self.market.offer_gasreq()),
            )
            .call()
            .await?;
        Converter::native().from_unsigned(wei)
    }

    async fn new_offer(
        &self,
        side: OrderSide,
        params: OfferParams,
    ) -> Result<PlacedOffer, DexError> {
        let wants = self.market.inbound(side).converter().to_unsigned(params.wants)?;
        let gives = self.market.outbound(side).converter().to_unsigned(params.gives)?;
        let fund = Converter::native().to_unsigned(params.fund)?;

        let mangrove =
            Mangrove::new(self.market.deployment().mangrove(), self.market.provider().clone());
        let receipt = mangrove
            .newOfferByVolume(
                self.market.ol_key(side),
                wants,
                gives,
                U256::from(self.market.offer_gasreq()),
                // Zero means current exchange gas price
                U256::ZERO,
            )
            .value(fund)
            .send()
            .await?
            .get_receipt()
            .await?;
        let tx = summarize(&receipt)?;
        let id = self.written_offer_id(&receipt)?;

        info!(
            %side,
            id,
            wants = %params.wants,
            gives = %params.gives,
            tx = %tx.tx_hash,
            "offer posted"
        );
        Ok(PlacedOffer {
            id,
            side,
            wants: params.wants,
            gives: params.gives,
            provision: params.fund,
            tx,
        })
    }

    /// ID of the offer written by the signer in the transaction.
    fn written_offer_id(&self, receipt: &TransactionReceipt) -> Result<OfferId, DexError> {
        for log in receipt.inner.logs() {
            let Ok(event) = Mangrove::OfferWrite::decode_log(&log.inner) else {
                continue;
            };
            if event.data.maker == self.market.signer() {
                return u64::try_from(event.data.id).map_err(|_| {
                    DexError::Conversion(format!("offer id out of range: {}", event.data.id))
                });
            }
        }
        Err(DexError::InvalidRequest(format!(
            "no offer written in transaction {}",
            receipt.transaction_hash
        )))
    }

    async fn retract(
        &self,
        side: OrderSide,
        id: OfferId,
        deprovision: bool,
    ) -> Result<TxSummary, DexError> {
        let mangrove =
            Mangrove::new(self.market.deployment().mangrove(), self.market.provider().clone());
        let receipt = mangrove
            .retractOffer(self.market.ol_key(side), U256::from(id), deprovision)
            .send()
            .await?
            .get_receipt()
            .await?;
        let tx = summarize(&receipt)?;
        info!(%side, id, deprovision, tx = %tx.tx_hash, "offer retracted");
        Ok(tx)
    }
}

impl LiquidityProvider for MangroveLiquidityProvider {
    async fn compute_ask_provision(&self) -> Result<UD128, DexError> {
        self.provision(OrderSide::Ask).await
    }

    async fn compute_bid_provision(&self) -> Result<UD128, DexError> {
        self.provision(OrderSide::Bid).await
    }

    async fn new_ask(&self, params: OfferParams) -> Result<PlacedOffer, DexError> {
        self.new_offer(OrderSide::Ask, params).await
    }

    async fn new_bid(&self, params: OfferParams) -> Result<PlacedOffer, DexError> {
        self.new_offer(OrderSide::Bid, params).await
    }

    async fn asks(&self) -> Result<Vec<Offer>, DexError> {
        self.market
            .offers(OrderSide::Ask, Some(self.market.signer()))
            .await
    }

    async fn bids(&self) -> Result<Vec<Offer>, DexError> {
        self.market
            .offers(OrderSide::Bid, Some(self.market.signer()))
            .await
    }

    async fn retract_ask(&self, id: OfferId, deprovision: bool) -> Result<TxSummary, DexError> {
        self.retract(OrderSide::Ask, id, deprovision).await
    }

    async fn retract_bid(&self, id: OfferId, deprovision: bool) -> Result<TxSummary, DexError> {
        self.retract(OrderSide::Bid, id, deprovision).await
    }
}
