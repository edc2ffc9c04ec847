use std::{fmt::Display, str::FromStr};

use alloy::primitives::{Address, TxHash};
use fastnum::UD128;

use crate::error::DexError;

/// Side of the resting order.
///
/// * [`OrderSide::Ask`] offers base token in exchange for quote token.
/// * [`OrderSide::Bid`] offers quote token in exchange for base token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OrderSide {
    Ask,
    Bid,
}

impl OrderSide {
    pub fn opposite(&self) -> OrderSide {
        match self {
            OrderSide::Ask => OrderSide::Bid,
            OrderSide::Bid => OrderSide::Ask,
        }
    }
}

impl Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Ask => write!(f, "Ask"),
            OrderSide::Bid => write!(f, "Bid"),
        }
    }
}

impl FromStr for OrderSide {
    type Err = DexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ask" => Ok(OrderSide::Ask),
            "bid" => Ok(OrderSide::Bid),
            _ => Err(DexError::InvalidArgument(format!(
                "invalid order side: {s} (expected `ask` or `bid`)"
            ))),
        }
    }
}

/// Exchange ID of the offer.
/// Unique only within particular offer list (market side).
pub type OfferId = u64;

/// Resting order in the book.
#[derive(Clone, PartialEq, Eq, derive_more::Debug)]
pub struct Offer {
    pub id: OfferId,
    pub side: OrderSide,
    pub maker: Address,
    /// Price in quote token per base token.
    #[debug("{price}")]
    pub price: UD128,
    /// Amount offered: base token for asks, quote token for bids.
    #[debug("{gives}")]
    pub gives: UD128,
}

/// Market order request.
#[derive(Clone, Copy, PartialEq, Eq, derive_more::Debug)]
pub struct TakeParams {
    /// Amount of base token to buy or sell.
    #[debug("{volume}")]
    pub volume: UD128,
    /// Worst acceptable price in quote token per base token.
    #[debug("{limit_price}")]
    pub limit_price: UD128,
    /// Whether the order must be filled completely or fail.
    pub fill_or_kill: bool,
}

/// Summary of executed market order.
#[derive(Clone, derive_more::Debug)]
pub struct TakeResult {
    /// Amount received by the taker (base when buying, quote when selling).
    #[debug("{got}")]
    pub got: UD128,
    /// Amount paid by the taker (quote when buying, base when selling).
    #[debug("{gave}")]
    pub gave: UD128,
    pub tx: TxSummary,
}

/// New resting order request.
#[derive(Clone, Copy, PartialEq, Eq, derive_more::Debug)]
pub struct OfferParams {
    #[debug("{wants}")]
    pub wants: UD128,
    #[debug("{gives}")]
    pub gives: UD128,
    /// Native token sent along to cover the offer provision.
    #[debug("{fund}")]
    pub fund: UD128,
}

/// Resting order placed by the signer.
#[derive(Clone, derive_more::Debug)]
pub struct PlacedOffer {
    pub id: OfferId,
    pub side: OrderSide,
    #[debug("{wants}")]
    pub wants: UD128,
    #[debug("{gives}")]
    pub gives: UD128,
    #[debug("{provision}")]
    pub provision: UD128,
    pub tx: TxSummary,
}

/// Mined transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TxSummary {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

impl Display for TxSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.block_number {
            Some(block) => write!(f, "{} (block #{}, gas {})", self.tx_hash, block, self.gas_used),
            None => write!(f, "{} (gas {})", self.tx_hash, self.gas_used),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_side_from_str() {
        assert_eq!("ask".parse::<OrderSide>().unwrap(), OrderSide::Ask);
        assert_eq!("BID".parse::<OrderSide>().unwrap(), OrderSide::Bid);
        assert!(matches!("both".parse::<OrderSide>(), Err(DexError::InvalidArgument(_))));
        assert_eq!(OrderSide::Ask.opposite(), OrderSide::Bid);
    }
}
