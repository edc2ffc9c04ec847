//! Capabilities of the exchange consumed by trading operations.
//!
//! Implemented by [`crate::mangrove::MangroveClient`] for the live chain and by
//! `testing::StubDex` for tests.

use std::future::Future;

use alloy::primitives::{Address, U256};
use fastnum::UD128;

use crate::{
    book::OrderBook,
    error::DexError,
    types::{
        MarketDescriptor, Offer, OfferId, OfferParams, OrderSide, PlacedOffer, TakeParams,
        TakeResult, Token, TokenRole, TxSummary,
    },
};

/// Connection to the exchange on behalf of a signer.
pub trait Dex: Send + Sync {
    type Market: Market;

    /// Address of the signer all transactions are sent from.
    fn address(&self) -> Address;

    /// Markets currently open on the exchange.
    fn open_markets(&self) -> impl Future<Output = Result<Vec<MarketDescriptor>, DexError>> + Send;

    /// Market handle for the base/quote pair on the given price grid.
    fn market(
        &self,
        base: &Token,
        quote: &Token,
        tick_spacing: u64,
    ) -> impl Future<Output = Result<Self::Market, DexError>> + Send;

    /// Number of transactions sent by the signer, including pending ones.
    /// The next transaction is sent with this nonce.
    fn transaction_count(&self) -> impl Future<Output = Result<u64, DexError>> + Send;

    /// Native token balance, in wei.
    fn native_balance(&self, owner: Address) -> impl Future<Output = Result<U256, DexError>> + Send;
}

/// Handle of a single base/quote market.
pub trait Market: Send + Sync {
    type LiquidityProvider: LiquidityProvider;

    fn base(&self) -> &Token;

    fn quote(&self) -> &Token;

    fn tick_spacing(&self) -> u64;

    /// Whether both sides of the market accept orders.
    fn is_active(&self) -> impl Future<Output = Result<bool, DexError>> + Send;

    /// All resting orders of one side, best first.
    fn semibook(
        &self,
        side: OrderSide,
    ) -> impl Future<Output = Result<Vec<Offer>, DexError>> + Send;

    /// Snapshot of both sides.
    fn book(&self) -> impl Future<Output = Result<OrderBook, DexError>> + Send {
        async {
            let (asks, bids) =
                futures::try_join!(self.semibook(OrderSide::Ask), self.semibook(OrderSide::Bid))?;
            Ok(OrderBook::new(asks, bids))
        }
    }

    /// Buys `volume` of base token paying at most `limit_price` quote per base.
    fn buy(&self, params: TakeParams) -> impl Future<Output = Result<TakeResult, DexError>> + Send;

    /// Sells `volume` of base token receiving at least `limit_price` quote per
    /// base.
    fn sell(&self, params: TakeParams)
    -> impl Future<Output = Result<TakeResult, DexError>> + Send;

    /// Token balance of the owner.
    fn balance_of(
        &self,
        token: TokenRole,
        owner: Address,
    ) -> impl Future<Output = Result<UD128, DexError>> + Send;

    /// Allows the exchange contract to spend up to `amount` of the signer's
    /// token.
    fn approve(
        &self,
        token: TokenRole,
        amount: UD128,
    ) -> impl Future<Output = Result<TxSummary, DexError>> + Send;

    /// Handle for posting and retracting the signer's resting orders.
    fn liquidity_provider(
        &self,
    ) -> impl Future<Output = Result<Self::LiquidityProvider, DexError>> + Send;
}

/// Signer's resting orders ("liquidity") in a market.
pub trait LiquidityProvider: Send + Sync {
    /// Native token bond required to post an ask.
    fn compute_ask_provision(&self) -> impl Future<Output = Result<UD128, DexError>> + Send;

    /// Native token bond required to post a bid.
    fn compute_bid_provision(&self) -> impl Future<Output = Result<UD128, DexError>> + Send;

    fn new_ask(
        &self,
        params: OfferParams,
    ) -> impl Future<Output = Result<PlacedOffer, DexError>> + Send;

    fn new_bid(
        &self,
        params: OfferParams,
    ) -> impl Future<Output = Result<PlacedOffer, DexError>> + Send;

    /// Signer's asks, best first.
    fn asks(&self) -> impl Future<Output = Result<Vec<Offer>, DexError>> + Send;

    /// Signer's bids, best first.
    fn bids(&self) -> impl Future<Output = Result<Vec<Offer>, DexError>> + Send;

    /// Removes the ask from the book, optionally withdrawing its provision.
    fn retract_ask(
        &self,
        id: OfferId,
        deprovision: bool,
    ) -> impl Future<Output = Result<TxSummary, DexError>> + Send;

    /// Removes the bid from the book, optionally withdrawing its provision.
    fn retract_bid(
        &self,
        id: OfferId,
        deprovision: bool,
    ) -> impl Future<Output = Result<TxSummary, DexError>> + Send;
}
