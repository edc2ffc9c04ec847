//! Conversions between on-chain fixed-point integers and decimals.

use alloy::primitives::{I256, U256};
use fastnum::UD128;

use crate::error::DexError;

/// Base of the exchange price grid: `price(tick) = 1.0001^tick`.
const TICK_BASE: &str = "1.0001";

/// Converter of token amounts between raw integer units and decimals, for a
/// token with the given number of decimals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Converter {
    decimals: u8,
}

impl Converter {
    pub fn new(decimals: u8) -> Self { Self { decimals } }

    /// Converter for the chain native token (wei).
    pub fn native() -> Self { Self::new(18) }

    pub fn decimals(&self) -> u8 { self.decimals }

    /// Decimal value of the raw on-chain amount.
    ///
    /// Fails when the amount exceeds the decimal precision (`u128::MAX` raw
    /// units).
    pub fn from_unsigned(&self, value: U256) -> Result<UD128, DexError> {
        let raw = u128::try_from(value)
            .map_err(|_| DexError::Conversion(format!("amount out of range: {value}")))?;
        let raw = UD128::try_from(raw)
            .map_err(|_| DexError::Conversion(format!("amount out of range: {value}")))?;
        Ok(raw / pow10(self.decimals))
    }

    /// Raw on-chain amount of the decimal value.
    /// Digits beyond token precision are truncated.
    pub fn to_unsigned(&self, value: UD128) -> Result<U256, DexError> {
        let scaled = (value * pow10(self.decimals)).floor();
        let raw = u128::try_from(scaled)
            .map_err(|_| DexError::Conversion(format!("amount out of range: {value}")))?;
        Ok(U256::from(raw))
    }
}

/// Ratio `inbound / outbound` in raw token units of an offer at `tick`.
pub fn tick_to_ratio(tick: I256) -> Result<UD128, DexError> {
    let exp = i64::try_from(tick)
        .map_err(|_| DexError::Conversion(format!("tick out of range: {tick}")))?;
    let base: UD128 = TICK_BASE
        .parse()
        .map_err(|_| DexError::Conversion(TICK_BASE.to_string()))?;
    let pow = pow(base, exp.unsigned_abs());
    if exp < 0 { Ok(UD128::ONE / pow) } else { Ok(pow) }
}

/// `10^exp` as decimal.
pub fn pow10(exp: u8) -> UD128 { pow(UD128::from(10u32), exp as u64) }

/// Exponentiation by squaring.
fn pow(base: UD128, mut exp: u64) -> UD128 {
    let mut result = UD128::ONE;
    let mut square = base;
    while exp > 0 {
        if exp & 1 == 1 {
            result *= square;
        }
        exp >>= 1;
        if exp > 0 {
            square *= square;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use fastnum::udec128;

    use super::*;

    #[test]
    fn test_from_unsigned() {
        let usdc = Converter::new(6);
        assert_eq!(usdc.from_unsigned(U256::from(1_500_000u64)).unwrap(), udec128!(1.5));
        assert_eq!(usdc.from_unsigned(U256::from(42u64)).unwrap(), udec128!(0.000042));
        assert_eq!(usdc.from_unsigned(U256::ZERO).unwrap(), UD128::ZERO);

        let raw = Converter::new(0);
        assert_eq!(raw.from_unsigned(U256::from(7u64)).unwrap(), udec128!(7));
    }

    #[test]
    fn test_from_unsigned_out_of_range() {
        let weth = Converter::native();
        assert!(matches!(weth.from_unsigned(U256::MAX), Err(DexError::Conversion(_))));
        assert!(matches!(
            weth.from_unsigned(U256::from(u128::MAX) + U256::ONE),
            Err(DexError::Conversion(_))
        ));
        assert_eq!(
            weth.from_unsigned(U256::from(u128::MAX)).unwrap(),
            UD128::try_from(u128::MAX).unwrap() / pow10(18)
        );
    }

    #[test]
    fn test_to_unsigned() {
        let usdc = Converter::new(6);
        assert_eq!(usdc.to_unsigned(udec128!(99.75)).unwrap(), U256::from(99_750_000u64));
        assert_eq!(usdc.to_unsigned(udec128!(0.0000019)).unwrap(), U256::from(1u64));
        assert_eq!(usdc.to_unsigned(UD128::ZERO).unwrap(), U256::ZERO);

        let weth = Converter::native();
        assert_eq!(
            weth.to_unsigned(udec128!(2)).unwrap(),
            U256::from(2_000_000_000_000_000_000u128)
        );
        assert_eq!(weth.to_unsigned(udec128!(0.000000000000000015)).unwrap(), U256::from(15u64));
        assert_eq!(weth.to_unsigned(pow10(3)).unwrap(), U256::from(10u128.pow(21)));
    }

    #[test]
    fn test_to_unsigned_out_of_range() {
        let weth = Converter::native();
        assert!(matches!(weth.to_unsigned(pow10(30)), Err(DexError::Conversion(_))));
    }

    #[test]
    fn test_tick_to_ratio() {
        assert_eq!(tick_to_ratio(I256::ZERO).unwrap(), UD128::ONE);
        assert_eq!(tick_to_ratio(I256::ONE).unwrap(), udec128!(1.0001));
        assert_eq!(tick_to_ratio(I256::try_from(2i64).unwrap()).unwrap(), udec128!(1.00020001));
        assert!(tick_to_ratio(I256::MINUS_ONE).unwrap() < UD128::ONE);
    }

    #[test]
    fn test_pow10() {
        assert_eq!(pow10(0), UD128::ONE);
        assert_eq!(pow10(6), udec128!(1000000));
    }
}
