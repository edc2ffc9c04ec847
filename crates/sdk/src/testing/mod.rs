//! In-memory exchange for exercising trading flows without a chain.
//!
//! [`StubDex`] serves canned markets, books and balances, and records every
//! capability call in order, so tests can assert on both the sequence of
//! calls and their arguments.

use std::{
    future::Future,
    pin::Pin,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
    task::{Context, Poll},
};

use alloy::primitives::{Address, TxHash, U256, keccak256};
use fastnum::UD128;

use crate::{
    dex::{Dex, LiquidityProvider, Market},
    error::DexError,
    types::{
        MarketDescriptor, Offer, OfferId, OfferParams, OrderSide, PlacedOffer, TakeParams,
        TakeResult, Token, TokenRole, TxSummary,
    },
};

/// Capability call made against the stub.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    OpenMarkets,
    Market { base: String, quote: String, tick_spacing: u64 },
    TransactionCount,
    NativeBalance(Address),
    IsActive,
    Semibook(OrderSide),
    Buy(TakeParams),
    Sell(TakeParams),
    BalanceOf(TokenRole, Address),
    Approve(TokenRole, UD128),
    LiquidityProvider,
    AskProvision,
    BidProvision,
    NewAsk(OfferParams),
    NewBid(OfferParams),
    Asks,
    Bids,
    RetractAsk { id: OfferId, deprovision: bool },
    RetractBid { id: OfferId, deprovision: bool },
}

/// Token with an address derived from its symbol.
pub fn token(symbol: &str, decimals: u8) -> Token {
    Token::new(Address::from_word(keccak256(symbol.as_bytes())), symbol, decimals)
}

/// Canned state of one market.
#[derive(Clone, Debug)]
pub struct StubMarket {
    tkn0: Token,
    tkn1: Token,
    tick_spacing: Option<u64>,
    active: bool,
    asks: Vec<Offer>,
    bids: Vec<Offer>,
    own_asks: Vec<Offer>,
    own_bids: Vec<Offer>,
    base_balance: UD128,
    quote_balance: UD128,
    ask_provision: UD128,
    bid_provision: UD128,
}

impl StubMarket {
    /// Active market listed as `tkn0/tkn1` with tick spacing 1 and an empty
    /// book.
    pub fn new(tkn0: Token, tkn1: Token) -> Self {
        Self {
            tkn0,
            tkn1,
            tick_spacing: Some(1),
            active: true,
            asks: Vec::new(),
            bids: Vec::new(),
            own_asks: Vec::new(),
            own_bids: Vec::new(),
            base_balance: UD128::ZERO,
            quote_balance: UD128::ZERO,
            ask_provision: UD128::ZERO,
            bid_provision: UD128::ZERO,
        }
    }

    pub fn tick_spacing(mut self, tick_spacing: Option<u64>) -> Self {
        self.tick_spacing = tick_spacing;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Appends an ask to the book. Asks are kept in the order added.
    pub fn ask(mut self, id: OfferId, price: UD128, gives: UD128) -> Self {
        self.asks.push(offer(OrderSide::Ask, id, Address::ZERO, price, gives));
        self
    }

    /// Appends a bid to the book. Bids are kept in the order added.
    pub fn bid(mut self, id: OfferId, price: UD128, gives: UD128) -> Self {
        self.bids.push(offer(OrderSide::Bid, id, Address::ZERO, price, gives));
        self
    }

    /// Appends an ask owned by the signer.
    pub fn own_ask(mut self, id: OfferId, price: UD128, gives: UD128) -> Self {
        self.own_asks.push(offer(OrderSide::Ask, id, Address::ZERO, price, gives));
        self
    }

    /// Appends a bid owned by the signer.
    pub fn own_bid(mut self, id: OfferId, price: UD128, gives: UD128) -> Self {
        self.own_bids.push(offer(OrderSide::Bid, id, Address::ZERO, price, gives));
        self
    }

    /// Balances reported for any owner.
    pub fn balances(mut self, base: UD128, quote: UD128) -> Self {
        self.base_balance = base;
        self.quote_balance = quote;
        self
    }

    pub fn provisions(mut self, ask: UD128, bid: UD128) -> Self {
        self.ask_provision = ask;
        self.bid_provision = bid;
        self
    }

    fn descriptor(&self) -> MarketDescriptor {
        MarketDescriptor {
            tkn0: self.tkn0.clone(),
            tkn1: self.tkn1.clone(),
            tick_spacing: self.tick_spacing,
        }
    }

    fn matches(&self, base: &Token, quote: &Token) -> bool {
        let pair = [self.tkn0.address(), self.tkn1.address()];
        pair.contains(&base.address()) && pair.contains(&quote.address())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn offer(side: OrderSide, id: OfferId, maker: Address, price: UD128, gives: UD128) -> Offer {
    Offer { id, side, maker, price, gives }
}

#[derive(Debug, Default)]
struct StubState {
    calls: Mutex<Vec<Call>>,
    sent: AtomicU64,
    next_offer_id: AtomicU64,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    failing_retraction: Mutex<Option<(OrderSide, OfferId)>>,
}

impl StubState {
    fn record(&self, call: Call) { lock(&self.calls).push(call); }

    fn send(&self) -> TxSummary {
        let n = self.sent.fetch_add(1, Ordering::SeqCst) + 1;
        TxSummary {
            tx_hash: TxHash::from(U256::from(n)),
            block_number: Some(n),
            gas_used: 21_000,
        }
    }
}

/// In-memory [`Dex`] recording its calls.
#[derive(Clone, Debug)]
pub struct StubDex {
    signer: Address,
    native_balance: U256,
    nonce: u64,
    markets: Vec<StubMarket>,
    state: Arc<StubState>,
}

impl StubDex {
    pub fn new(signer: Address) -> Self {
        let state = StubState { next_offer_id: AtomicU64::new(1000), ..Default::default() };
        Self {
            signer,
            native_balance: U256::ZERO,
            nonce: 0,
            markets: Vec::new(),
            state: Arc::new(state),
        }
    }

    pub fn with_market(mut self, market: StubMarket) -> Self {
        self.markets.push(market);
        self
    }

    pub fn with_native_balance(mut self, wei: U256) -> Self {
        self.native_balance = wei;
        self
    }

    /// Number of transactions sent before the stub was created.
    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    /// Makes retraction of the given offer fail.
    pub fn fail_retraction(self, side: OrderSide, id: OfferId) -> Self {
        *lock(&self.state.failing_retraction) = Some((side, id));
        self
    }

    /// Calls made so far, in order.
    pub fn calls(&self) -> Vec<Call> { lock(&self.state.calls).clone() }

    /// Highest number of retractions observed in progress at once.
    pub fn max_retractions_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Dex for StubDex {
    type Market = StubMarketHandle;

    fn address(&self) -> Address { self.signer }

    async fn open_markets(&self) -> Result<Vec<MarketDescriptor>, DexError> {
        self.state.record(Call::OpenMarkets);
        Ok(self.markets.iter().map(StubMarket::descriptor).collect())
    }

    async fn market(
        &self,
        base: &Token,
        quote: &Token,
        tick_spacing: u64,
    ) -> Result<StubMarketHandle, DexError> {
        self.state.record(Call::Market {
            base: base.symbol().to_owned(),
            quote: quote.symbol().to_owned(),
            tick_spacing,
        });
        let market = self
            .markets
            .iter()
            .find(|m| m.matches(base, quote))
            .cloned()
            .ok_or_else(|| DexError::InvalidRequest(format!("no stub market {base}/{quote}")))?;
        Ok(StubMarketHandle {
            base: base.clone(),
            quote: quote.clone(),
            tick_spacing,
            signer: self.signer,
            market,
            state: self.state.clone(),
        })
    }

    async fn transaction_count(&self) -> Result<u64, DexError> {
        self.state.record(Call::TransactionCount);
        Ok(self.nonce + self.state.sent.load(Ordering::SeqCst))
    }

    async fn native_balance(&self, owner: Address) -> Result<U256, DexError> {
        self.state.record(Call::NativeBalance(owner));
        Ok(self.native_balance)
    }
}

/// [`Market`] served by [`StubDex`].
#[derive(Clone, Debug)]
pub struct StubMarketHandle {
    base: Token,
    quote: Token,
    tick_spacing: u64,
    signer: Address,
    market: StubMarket,
    state: Arc<StubState>,
}

impl Market for StubMarketHandle {
    type LiquidityProvider = StubLiquidityProvider;

    fn base(&self) -> &Token { &self.base }

    fn quote(&self) -> &Token { &self.quote }

    fn tick_spacing(&self) -> u64 { self.tick_spacing }

    async fn is_active(&self) -> Result<bool, DexError> {
        self.state.record(Call::IsActive);
        Ok(self.market.active)
    }

    async fn semibook(&self, side: OrderSide) -> Result<Vec<Offer>, DexError> {
        self.state.record(Call::Semibook(side));
        Ok(match side {
            OrderSide::Ask => self.market.asks.clone(),
            OrderSide::Bid => self.market.bids.clone(),
        })
    }

    async fn buy(&self, params: TakeParams) -> Result<TakeResult, DexError> {
        self.state.record(Call::Buy(params));
        Ok(TakeResult {
            got: params.volume,
            gave: params.volume * params.limit_price,
            tx: self.state.send(),
        })
    }

    async fn sell(&self, params: TakeParams) -> Result<TakeResult, DexError> {
        self.state.record(Call::Sell(params));
        Ok(TakeResult {
            got: params.volume * params.limit_price,
            gave: params.volume,
            tx: self.state.send(),
        })
    }

    async fn balance_of(&self, token: TokenRole, owner: Address) -> Result<UD128, DexError> {
        self.state.record(Call::BalanceOf(token, owner));
        Ok(match token {
            TokenRole::Base => self.market.base_balance,
            TokenRole::Quote => self.market.quote_balance,
        })
    }

    async fn approve(&self, token: TokenRole, amount: UD128) -> Result<TxSummary, DexError> {
        self.state.record(Call::Approve(token, amount));
        Ok(self.state.send())
    }

    async fn liquidity_provider(&self) -> Result<StubLiquidityProvider, DexError> {
        self.state.record(Call::LiquidityProvider);
        Ok(StubLiquidityProvider { market: self.clone() })
    }
}

/// [`LiquidityProvider`] served by [`StubDex`].
#[derive(Clone, Debug)]
pub struct StubLiquidityProvider {
    market: StubMarketHandle,
}

impl StubLiquidityProvider {
    fn state(&self) -> &StubState { &self.market.state }

    fn place(&self, side: OrderSide, params: OfferParams) -> PlacedOffer {
        PlacedOffer {
            id: self.state().next_offer_id.fetch_add(1, Ordering::SeqCst),
            side,
            wants: params.wants,
            gives: params.gives,
            provision: params.fund,
            tx: self.state().send(),
        }
    }

    async fn retract(&self, side: OrderSide, id: OfferId) -> Result<TxSummary, DexError> {
        let state = self.state();
        let in_flight = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        state.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        // Give concurrently polled retractions a chance to start
        YieldNow(false).await;
        state.in_flight.fetch_sub(1, Ordering::SeqCst);

        if *lock(&state.failing_retraction) == Some((side, id)) {
            return Err(DexError::Reverted(TxHash::from(U256::from(id))));
        }
        Ok(state.send())
    }
}

impl LiquidityProvider for StubLiquidityProvider {
    async fn compute_ask_provision(&self) -> Result<UD128, DexError> {
        self.state().record(Call::AskProvision);
        Ok(self.market.market.ask_provision)
    }

    async fn compute_bid_provision(&self) -> Result<UD128, DexError> {
        self.state().record(Call::BidProvision);
        Ok(self.market.market.bid_provision)
    }

    async fn new_ask(&self, params: OfferParams) -> Result<PlacedOffer, DexError> {
        self.state().record(Call::NewAsk(params));
        Ok(self.place(OrderSide::Ask, params))
    }

    async fn new_bid(&self, params: OfferParams) -> Result<PlacedOffer, DexError> {
        self.state().record(Call::NewBid(params));
        Ok(self.place(OrderSide::Bid, params))
    }

    async fn asks(&self) -> Result<Vec<Offer>, DexError> {
        self.state().record(Call::Asks);
        Ok(with_maker(&self.market.market.own_asks, self.market.signer))
    }

    async fn bids(&self) -> Result<Vec<Offer>, DexError> {
        self.state().record(Call::Bids);
        Ok(with_maker(&self.market.market.own_bids, self.market.signer))
    }

    async fn retract_ask(&self, id: OfferId, deprovision: bool) -> Result<TxSummary, DexError> {
        self.state().record(Call::RetractAsk { id, deprovision });
        self.retract(OrderSide::Ask, id).await
    }

    async fn retract_bid(&self, id: OfferId, deprovision: bool) -> Result<TxSummary, DexError> {
        self.state().record(Call::RetractBid { id, deprovision });
        self.retract(OrderSide::Bid, id).await
    }
}

fn with_maker(offers: &[Offer], maker: Address) -> Vec<Offer> {
    offers
        .iter()
        .map(|o| Offer { maker, ..o.clone() })
        .collect()
}

/// Future that is pending exactly once.
struct YieldNow(bool);

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            return Poll::Ready(());
        }
        self.0 = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

#[cfg(test)]
mod tests {
    use fastnum::udec128;

    use super::*;

    #[tokio::test]
    async fn test_stub_records_calls() {
        let signer = Address::repeat_byte(0xaa);
        let dex = StubDex::new(signer).with_market(
            StubMarket::new(token("USDC", 6), token("USDT", 6))
                .ask(1, udec128!(1.0001), udec128!(10)),
        );

        let market = dex
            .market(&token("USDC", 6), &token("USDT", 6), 1)
            .await
            .unwrap();
        let book = market.book().await.unwrap();
        assert_eq!(book.asks().len(), 1);
        assert!(book.bids().is_empty());

        market.approve(TokenRole::Base, udec128!(5)).await.unwrap();
        assert_eq!(dex.transaction_count().await.unwrap(), 1);

        let calls = dex.calls();
        assert_eq!(calls[0], Call::Market {
            base: "USDC".to_owned(),
            quote: "USDT".to_owned(),
            tick_spacing: 1
        });
        assert!(calls.contains(&Call::Semibook(OrderSide::Ask)));
        assert!(calls.contains(&Call::Semibook(OrderSide::Bid)));
        assert_eq!(calls[3], Call::Approve(TokenRole::Base, udec128!(5)));
    }

    #[tokio::test]
    async fn test_concurrent_retractions_are_observed() {
        let dex = StubDex::new(Address::ZERO)
            .with_market(StubMarket::new(token("WETH", 18), token("USDC", 6)));
        let market = dex
            .market(&token("WETH", 18), &token("USDC", 6), 1)
            .await
            .unwrap();
        let lp = market.liquidity_provider().await.unwrap();

        let (a, b) = tokio::join!(lp.retract_ask(1, true), lp.retract_ask(2, true));
        a.unwrap();
        b.unwrap();
        assert_eq!(dex.max_retractions_in_flight(), 2);
    }

    #[tokio::test]
    async fn test_failing_retraction() {
        let dex = StubDex::new(Address::ZERO)
            .with_market(StubMarket::new(token("WETH", 18), token("USDC", 6)))
            .fail_retraction(OrderSide::Bid, 7);
        let market = dex
            .market(&token("WETH", 18), &token("USDC", 6), 1)
            .await
            .unwrap();
        let lp = market.liquidity_provider().await.unwrap();

        assert!(lp.retract_bid(6, true).await.is_ok());
        assert!(matches!(lp.retract_bid(7, true).await, Err(DexError::Reverted(_))));
        assert!(lp.retract_ask(7, true).await.is_ok());
    }
}
