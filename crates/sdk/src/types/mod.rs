mod order;

use std::fmt::Display;

use alloy::primitives::Address;
pub use order::*;

use crate::num;

/// ERC-20 token traded on the exchange.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Token {
    address: Address,
    symbol: String,
    decimals: u8,
}

impl Token {
    pub fn new(address: Address, symbol: impl Into<String>, decimals: u8) -> Self {
        Self { address, symbol: symbol.into(), decimals }
    }

    pub fn address(&self) -> Address { self.address }

    pub fn symbol(&self) -> &str { &self.symbol }

    pub fn decimals(&self) -> u8 { self.decimals }

    /// Converter of raw token amounts to decimals and back.
    pub fn converter(&self) -> num::Converter { num::Converter::new(self.decimals) }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            write!(f, "{} ({})", self.symbol, self.address)
        } else {
            write!(f, "{}", self.symbol)
        }
    }
}

/// Which of the two market tokens an operation refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenRole {
    Base,
    Quote,
}

/// Open market as listed by the exchange, `tkn0` being the base token and
/// `tkn1` the quote token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarketDescriptor {
    pub tkn0: Token,
    pub tkn1: Token,
    /// Price grid granularity, if the exchange reports one.
    pub tick_spacing: Option<u64>,
}

impl MarketDescriptor {
    /// Whether the market is exactly the base/quote symbol pair. The reversed
    /// pair is a different market.
    pub fn is_pair(&self, base: &str, quote: &str) -> bool {
        self.tkn0.symbol == base && self.tkn1.symbol == quote
    }
}

impl Display for MarketDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.tkn0, self.tkn1)?;
        if let Some(tick_spacing) = self.tick_spacing {
            write!(f, " (tick spacing {})", tick_spacing)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> MarketDescriptor {
        MarketDescriptor {
            tkn0: Token::new(Address::repeat_byte(1), "USDC", 6),
            tkn1: Token::new(Address::repeat_byte(2), "USDT", 6),
            tick_spacing: Some(1),
        }
    }

    #[test]
    fn test_is_pair() {
        let market = descriptor();
        assert!(market.is_pair("USDC", "USDT"));
        assert!(!market.is_pair("USDT", "USDC"));
        assert!(!market.is_pair("USDC", "WETH"));
        assert!(!market.is_pair("usdc", "usdt"));
    }

    #[test]
    fn test_display() {
        assert_eq!(descriptor().to_string(), "USDC/USDT (tick spacing 1)");
    }
}
