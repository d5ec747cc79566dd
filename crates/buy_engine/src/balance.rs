//! Base-currency balance snapshots

use amount_model::{from_units, parse_amount, to_units, AmountError, Decimal};

/// Caller's holdings of the base currency at one point in time
///
/// The raw and decimal figures are built together, so they always describe
/// the same value exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceSnapshot {
    value_raw: u128,
    value_decimal: Decimal,
    decimals: u32,
}

impl BalanceSnapshot {
    /// Snapshot from smallest units (e.g. wei)
    pub fn new(value_raw: u128, decimals: u32) -> Result<Self, AmountError> {
        let value_decimal = from_units(value_raw, decimals)?;
        Ok(Self {
            value_raw,
            value_decimal,
            decimals,
        })
    }

    /// Snapshot from a human-readable amount such as `"2.5"`
    pub fn from_decimal_str(amount: &str, decimals: u32) -> Result<Self, AmountError> {
        let value_raw = to_units(parse_amount(amount)?, decimals)?;
        Self::new(value_raw, decimals)
    }

    pub fn zero(decimals: u32) -> Self {
        Self {
            value_raw: 0,
            value_decimal: Decimal::ZERO,
            decimals,
        }
    }

    pub fn value_raw(&self) -> u128 {
        self.value_raw
    }

    pub fn value_decimal(&self) -> Decimal {
        self.value_decimal
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    pub fn is_zero(&self) -> bool {
        self.value_raw == 0
    }
}

/// Reader for the current balance, consulted on every render
///
/// `None` means no balance is known yet (wallet not connected or still
/// loading).
pub trait BalanceSource {
    fn current_balance(&self) -> Option<BalanceSnapshot>;
}

impl BalanceSource for BalanceSnapshot {
    fn current_balance(&self) -> Option<BalanceSnapshot> {
        Some(*self)
    }
}

impl BalanceSource for Option<BalanceSnapshot> {
    fn current_balance(&self) -> Option<BalanceSnapshot> {
        *self
    }
}

impl<T: BalanceSource + ?Sized> BalanceSource for &T {
    fn current_balance(&self) -> Option<BalanceSnapshot> {
        (**self).current_balance()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_raw_and_decimal_agree() {
        let balance = BalanceSnapshot::new(2_500_001_000_000_000_000, 18).unwrap();
        assert_eq!(balance.value_decimal(), Decimal::from_str("2.500001").unwrap());

        let parsed = BalanceSnapshot::from_decimal_str("2.500001", 18).unwrap();
        assert_eq!(parsed, balance);
    }

    #[test]
    fn test_from_decimal_str_rejects_dust_below_unit() {
        assert_eq!(
            BalanceSnapshot::from_decimal_str("0.0000001", 6),
            Err(AmountError::PrecisionExceeded)
        );
        assert_eq!(
            BalanceSnapshot::from_decimal_str("lots", 6),
            Err(AmountError::Malformed)
        );
    }

    #[test]
    fn test_sources() {
        let balance = BalanceSnapshot::zero(18);
        assert!(balance.is_zero());
        assert_eq!(balance.current_balance(), Some(balance));

        let missing: Option<BalanceSnapshot> = None;
        assert_eq!(missing.current_balance(), None);
        assert_eq!((&Some(balance)).current_balance(), Some(balance));
    }
}
