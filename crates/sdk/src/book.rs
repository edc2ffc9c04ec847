//! Read-only snapshot of the market order book.

use fastnum::UD128;

use crate::types::{Offer, OrderSide};

/// Snapshot of both sides of the market.
/// Each side is ordered best first: asks by ascending price, bids by
/// descending price.
#[derive(Clone, Debug, Default)]
pub struct OrderBook {
    asks: Vec<Offer>,
    bids: Vec<Offer>,
}

impl OrderBook {
    pub fn new(asks: Vec<Offer>, bids: Vec<Offer>) -> Self { Self { asks, bids } }

    pub fn asks(&self) -> &[Offer] { &self.asks }

    pub fn bids(&self) -> &[Offer] { &self.bids }

    pub fn side(&self, side: OrderSide) -> &[Offer] {
        match side {
            OrderSide::Ask => &self.asks,
            OrderSide::Bid => &self.bids,
        }
    }

    /// Best (lowest) ask.
    pub fn best_ask(&self) -> Option<&Offer> { self.asks.first() }

    /// Best (highest) bid.
    pub fn best_bid(&self) -> Option<&Offer> { self.bids.first() }

    /// Difference between the best ask and best bid prices.
    /// `None` if any side is empty or the book is crossed.
    pub fn spread(&self) -> Option<UD128> {
        let (ask, bid) = self.best_ask().zip(self.best_bid())?;
        (ask.price >= bid.price).then(|| ask.price - bid.price)
    }

    /// Total amount offered by the asks, in base token.
    pub fn total_asks(&self) -> UD128 { total_gives(&self.asks) }

    /// Total amount offered by the bids, in quote token.
    pub fn total_bids(&self) -> UD128 { total_gives(&self.bids) }
}

/// Sum of `gives` of the offers.
pub fn total_gives<'a>(offers: impl IntoIterator<Item = &'a Offer>) -> UD128 {
    offers
        .into_iter()
        .fold(UD128::ZERO, |total, o| total + o.gives)
}

#[cfg(feature = "display")]
impl tabled::Tabled for Offer {
    const LENGTH: usize = 5;

    fn fields(&self) -> Vec<std::borrow::Cow<'_, str>> {
        use colored::Colorize;

        let colorize = |s: String| match self.side {
            OrderSide::Ask => s.red().to_string(),
            OrderSide::Bid => s.green().to_string(),
        };

        vec![
            colorize(self.side.to_string()).into(),
            colorize(self.price.to_string()).into(),
            colorize(self.gives.to_string()).into(),
            self.id.to_string().into(),
            self.maker.to_string().into(),
        ]
    }

    fn headers() -> Vec<std::borrow::Cow<'static, str>> {
        vec!["Side".into(), "Price".into(), "Gives".into(), "Offer ID".into(), "Maker".into()]
    }
}

#[cfg(feature = "display")]
impl std::fmt::Display for OrderBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use tabled::{
            Table,
            settings::{Alignment, Panel, Style, object::Row},
        };

        if f.alternate() {
            // Totals only
            return write!(
                f,
                "ASK offers: {}, total: {} :: BID offers: {}, total: {}",
                self.asks.len(),
                self.total_asks(),
                self.bids.len(),
                self.total_bids(),
            );
        }

        // Asks on top with the best ask closest to the spread
        let mut table = Table::new(self.asks.iter().rev().chain(self.bids.iter()));
        if let Some((ask, bid)) = self.best_ask().zip(self.best_bid()) {
            table.with(Panel::horizontal(
                self.asks.len() + 1,
                format!(
                    "Best ASK: {} :: Best BID: {} :: Spread: {}",
                    ask.price,
                    bid.price,
                    self.spread()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "crossed".to_string()),
                ),
            ));
            table.modify(Row::from(self.asks.len() + 1), Alignment::right());
        }
        table.with(Style::sharp());
        writeln!(f, "{}", table)
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::Address;
    use fastnum::udec128;

    use super::*;

    fn offer(id: u64, side: OrderSide, price: UD128, gives: UD128) -> Offer {
        Offer { id, side, maker: Address::ZERO, price, gives }
    }

    #[test]
    fn test_totals_and_spread() {
        let book = OrderBook::new(
            vec![
                offer(1, OrderSide::Ask, udec128!(1.05), udec128!(10)),
                offer(2, OrderSide::Ask, udec128!(1.10), udec128!(5)),
            ],
            vec![offer(3, OrderSide::Bid, udec128!(0.95), udec128!(7.5))],
        );

        assert_eq!(book.total_asks(), udec128!(15));
        assert_eq!(book.total_bids(), udec128!(7.5));
        assert_eq!(book.best_ask().map(|o| o.id), Some(1));
        assert_eq!(book.best_bid().map(|o| o.id), Some(3));
        assert_eq!(book.spread(), Some(udec128!(0.10)));
    }

    #[test]
    fn test_empty_and_crossed() {
        let empty = OrderBook::default();
        assert_eq!(empty.total_asks(), UD128::ZERO);
        assert_eq!(empty.spread(), None);

        let crossed = OrderBook::new(
            vec![offer(1, OrderSide::Ask, udec128!(0.9), udec128!(1))],
            vec![offer(2, OrderSide::Bid, udec128!(1.0), udec128!(1))],
        );
        assert_eq!(crossed.spread(), None);
    }

    #[cfg(feature = "display")]
    #[test]
    fn test_display() {
        let book = OrderBook::new(
            vec![offer(1, OrderSide::Ask, udec128!(1.05), udec128!(10))],
            vec![offer(2, OrderSide::Bid, udec128!(0.95), udec128!(5))],
        );
        let rendered = book.to_string();
        assert!(rendered.contains("Best ASK: 1.05"));
        assert!(rendered.contains("Offer ID"));
        assert_eq!(
            format!("{:#}", book),
            "ASK offers: 1, total: 10 :: BID offers: 1, total: 5"
        );
    }
}
