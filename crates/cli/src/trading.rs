//! Trading operations behind the commands.
//!
//! Every operation resolves the market by token symbols first, then drives the
//! exchange through the [`Dex`] capabilities. Nothing is retried and nothing is
//! rolled back: the first failure is returned as is.

use alloy::primitives::Address;
use fastnum::UD128;
use groovyswap_sdk::{
    book::{OrderBook, total_gives},
    dex::{Dex, LiquidityProvider, Market},
    error::DexError,
    types::{
        MarketDescriptor, Offer, OfferId, OfferParams, OrderSide, PlacedOffer, TakeParams,
        TakeResult, Token, TokenRole, TxSummary,
    },
};
use thiserror::Error;
use tracing::{debug, warn};

/// Tick spacing of markets not reporting one.
pub const DEFAULT_TICK_SPACING: u64 = 1;

#[derive(Debug, Error)]
pub enum TradeError {
    #[error("market {base}/{quote} not found")]
    MarketNotFound { base: String, quote: String },

    #[error("market {base}/{quote} is not active")]
    MarketInactive { base: String, quote: String },

    #[error("no {side} offers in the book")]
    EmptyBook { side: OrderSide },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Upstream(#[from] DexError),
}

/// Market of the base/quote symbol pair.
///
/// Symbols must match the listed base and quote exactly, the first match wins.
pub async fn get_market<D: Dex>(dex: &D, base: &str, quote: &str) -> Result<D::Market, TradeError> {
    let markets = dex.open_markets().await?;
    let descriptor = markets
        .iter()
        .find(|m| m.is_pair(base, quote))
        .ok_or_else(|| TradeError::MarketNotFound {
            base: base.to_string(),
            quote: quote.to_string(),
        })?;
    let tick_spacing = descriptor.tick_spacing.unwrap_or(DEFAULT_TICK_SPACING);
    debug!(market = %descriptor, tick_spacing, "market found");
    Ok(dex
        .market(&descriptor.tkn0, &descriptor.tkn1, tick_spacing)
        .await?)
}

/// Market of the pair that currently accepts orders.
pub async fn active_market<D: Dex>(
    dex: &D,
    base: &str,
    quote: &str,
) -> Result<D::Market, TradeError> {
    let market = get_market(dex, base, quote).await?;
    if !market.is_active().await? {
        return Err(TradeError::MarketInactive {
            base: base.to_string(),
            quote: quote.to_string(),
        });
    }
    Ok(market)
}

/// Buys `volume` of base paying at most `limit_price` quote per base.
pub async fn market_buy<D: Dex>(
    dex: &D,
    base: &str,
    quote: &str,
    limit_price: UD128,
    volume: UD128,
) -> Result<TakeResult, TradeError> {
    ensure_positive("amount", volume)?;
    let market = active_market(dex, base, quote).await?;
    Ok(market
        .buy(TakeParams { volume, limit_price, fill_or_kill: false })
        .await?)
}

/// Sells `volume` of base receiving at least `limit_price` quote per base.
pub async fn market_sell<D: Dex>(
    dex: &D,
    base: &str,
    quote: &str,
    limit_price: UD128,
    volume: UD128,
) -> Result<TakeResult, TradeError> {
    ensure_positive("amount", volume)?;
    let market = active_market(dex, base, quote).await?;
    Ok(market
        .sell(TakeParams { volume, limit_price, fill_or_kill: false })
        .await?)
}

/// Offers posted by a liquidity operation.
#[derive(Clone, Debug, Default)]
pub struct AddedLiquidity {
    pub ask: Option<PlacedOffer>,
    pub bid: Option<PlacedOffer>,
}

/// Posts an ask and a bid around the best prices of the book.
pub async fn add_liquidity<D: Dex>(
    dex: &D,
    base: &str,
    quote: &str,
    amount: UD128,
    slippage: Option<UD128>,
) -> Result<AddedLiquidity, TradeError> {
    provide(dex, base, quote, amount, slippage, &[OrderSide::Ask, OrderSide::Bid]).await
}

/// Posts only an ask or only a bid.
pub async fn add_one_sided_liquidity<D: Dex>(
    dex: &D,
    base: &str,
    quote: &str,
    amount: UD128,
    side: OrderSide,
    slippage: Option<UD128>,
) -> Result<AddedLiquidity, TradeError> {
    provide(dex, base, quote, amount, slippage, &[side]).await
}

/// Amount given by a new offer of the side, derived from the best price of
/// that side and moved away from it by `slippage`.
pub fn offer_gives(side: OrderSide, amount: UD128, best_price: UD128, slippage: UD128) -> UD128 {
    match side {
        OrderSide::Ask => amount * best_price * (UD128::ONE - slippage),
        OrderSide::Bid => amount * best_price * (UD128::ONE + slippage),
    }
}

async fn provide<D: Dex>(
    dex: &D,
    base: &str,
    quote: &str,
    amount: UD128,
    slippage: Option<UD128>,
    sides: &[OrderSide],
) -> Result<AddedLiquidity, TradeError> {
    ensure_positive("amount", amount)?;
    let slippage = slippage.unwrap_or(UD128::ZERO);
    if slippage > UD128::ONE {
        return Err(TradeError::InvalidArgument(format!(
            "slippage must be between 0 and 1, got {slippage}"
        )));
    }

    let market = active_market(dex, base, quote).await?;
    let provider = market.liquidity_provider().await?;

    // Both provisions are read even when posting a single side
    let ask_provision = provider.compute_ask_provision().await?;
    let bid_provision = provider.compute_bid_provision().await?;

    // Both prices are checked before anything gets approved
    let book = market.book().await?;
    let mut best_prices = Vec::with_capacity(sides.len());
    for side in sides {
        let best = book
            .side(*side)
            .first()
            .ok_or(TradeError::EmptyBook { side: *side })?;
        best_prices.push(best.price);
    }

    market.approve(TokenRole::Base, amount).await?;
    market.approve(TokenRole::Quote, amount).await?;

    let mut added = AddedLiquidity::default();
    for (side, best_price) in sides.iter().zip(best_prices) {
        let fund = match side {
            OrderSide::Ask => ask_provision,
            OrderSide::Bid => bid_provision,
        };
        let params = OfferParams {
            wants: amount,
            gives: offer_gives(*side, amount, best_price, slippage),
            fund,
        };
        debug!(%side, ?params, "posting offer");
        match side {
            OrderSide::Ask => added.ask = Some(provider.new_ask(params).await?),
            OrderSide::Bid => added.bid = Some(provider.new_bid(params).await?),
        }
    }
    Ok(added)
}

/// Retractions done by [`remove_liquidity`], in order.
#[derive(Clone, Debug, Default)]
pub struct RemovedLiquidity {
    pub asks: Vec<(OfferId, TxSummary)>,
    pub bids: Vec<(OfferId, TxSummary)>,
}

/// Retracts every resting offer of the signer, asks first, withdrawing the
/// provisions.
///
/// Retractions are sent one at a time, each waiting for the previous one to be
/// mined, so the signer's nonces stay in order.
pub async fn remove_liquidity<D: Dex>(
    dex: &D,
    base: &str,
    quote: &str,
) -> Result<RemovedLiquidity, TradeError> {
    let market = active_market(dex, base, quote).await?;
    let provider = market.liquidity_provider().await?;
    let (asks, bids) = futures::try_join!(provider.asks(), provider.bids())?;
    debug!(num_asks = asks.len(), num_bids = bids.len(), "fetched own offers");

    let allowance = total_gives(&asks).max(total_gives(&bids));
    market.approve(TokenRole::Base, allowance).await?;
    market.approve(TokenRole::Quote, allowance).await?;

    let mut removed = RemovedLiquidity::default();

    let nonce = dex.transaction_count().await?;
    warn!(nonce, num_asks = asks.len(), "retracting asks");
    for ask in &asks {
        let tx = provider.retract_ask(ask.id, true).await?;
        removed.asks.push((ask.id, tx));
    }

    let nonce = dex.transaction_count().await?;
    warn!(nonce, num_bids = bids.len(), "retracting bids");
    for bid in &bids {
        let tx = provider.retract_bid(bid.id, true).await?;
        removed.bids.push((bid.id, tx));
    }
    Ok(removed)
}

/// Order book snapshot of a market.
#[derive(Clone, Debug)]
pub struct MarketInfo {
    pub base: Token,
    pub quote: Token,
    pub book: OrderBook,
}

impl MarketInfo {
    pub fn spread(&self) -> Option<UD128> { self.book.spread() }

    pub fn best_ask(&self) -> Option<UD128> { self.book.best_ask().map(|o| o.price) }

    pub fn best_bid(&self) -> Option<UD128> { self.book.best_bid().map(|o| o.price) }

    pub fn total_asks(&self) -> UD128 { self.book.total_asks() }

    pub fn total_bids(&self) -> UD128 { self.book.total_bids() }
}

/// Snapshot of the market book, regardless of whether the market is active.
pub async fn market_info<D: Dex>(
    dex: &D,
    base: &str,
    quote: &str,
) -> Result<MarketInfo, TradeError> {
    let market = get_market(dex, base, quote).await?;
    let book = market.book().await?;
    Ok(MarketInfo {
        base: market.base().clone(),
        quote: market.quote().clone(),
        book,
    })
}

/// Token balances of an owner and the signer's resting offers in a market.
#[derive(Clone, Debug)]
pub struct Positions {
    pub owner: Address,
    pub base: Token,
    pub quote: Token,
    pub base_balance: UD128,
    pub quote_balance: UD128,
    pub asks: Vec<Offer>,
    pub bids: Vec<Offer>,
}

pub async fn positions<D: Dex>(
    dex: &D,
    base: &str,
    quote: &str,
    owner: Address,
) -> Result<Positions, TradeError> {
    let market = get_market(dex, base, quote).await?;
    let (base_balance, quote_balance) = futures::try_join!(
        market.balance_of(TokenRole::Base, owner),
        market.balance_of(TokenRole::Quote, owner),
    )?;
    let provider = market.liquidity_provider().await?;
    let (asks, bids) = futures::try_join!(provider.asks(), provider.bids())?;
    Ok(Positions {
        owner,
        base: market.base().clone(),
        quote: market.quote().clone(),
        base_balance,
        quote_balance,
        asks,
        bids,
    })
}

/// Markets currently open on the exchange.
pub async fn list_markets<D: Dex>(dex: &D) -> Result<Vec<MarketDescriptor>, TradeError> {
    Ok(dex.open_markets().await?)
}

fn ensure_positive(name: &str, value: UD128) -> Result<(), TradeError> {
    if value.is_zero() {
        return Err(TradeError::InvalidArgument(format!("{name} must be positive")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use fastnum::udec128;

    use super::*;

    #[test]
    fn test_offer_gives() {
        let amount = udec128!(100);
        let slippage = udec128!(0.05);
        assert_eq!(offer_gives(OrderSide::Ask, amount, udec128!(1.05), slippage), udec128!(99.75));
        assert_eq!(offer_gives(OrderSide::Bid, amount, udec128!(0.95), slippage), udec128!(99.75));
        assert_eq!(offer_gives(OrderSide::Ask, amount, udec128!(2), UD128::ZERO), udec128!(200));
    }

    #[test]
    fn test_ensure_positive() {
        assert!(ensure_positive("amount", udec128!(0.000001)).is_ok());
        assert!(matches!(
            ensure_positive("amount", UD128::ZERO),
            Err(TradeError::InvalidArgument(_))
        ));
    }
}
