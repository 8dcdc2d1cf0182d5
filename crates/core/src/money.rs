//! Fixed-point rupee amounts.
//!
//! All amounts are held in paise (1/100 rupee) as unsigned integers. Division
//! only happens through the explicit helpers below, which state their rounding.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Non-negative amount in paise.
#[derive(
    Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_paise(paise: u64) -> Self {
        Self(paise)
    }

    pub fn from_rupees(rupees: u64) -> Option<Self> {
        rupees.checked_mul(100).map(Self)
    }

    pub const fn paise(self) -> u64 {
        self.0
    }

    /// Whole rupees, fraction discarded.
    pub const fn whole_rupees(self) -> u64 {
        self.0 / 100
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    pub fn saturating_sub(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0))
    }

    pub fn checked_mul(self, quantity: u64) -> Option<Money> {
        self.0.checked_mul(quantity).map(Money)
    }

    /// `self * numerator / denominator`, rounded half up to the paisa.
    ///
    /// `None` when the denominator is zero or the result does not fit.
    pub fn scale(self, numerator: Money, denominator: Money) -> Option<Money> {
        mul_div_half_up(self.0, numerator.0, denominator.0).map(Money)
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Money {
    type Err = DomainError;

    /// Parses rupees with at most two decimals ("200", "200.5", "200.50").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with('-') {
            return Err(DomainError::validation("amount must not be negative"));
        }

        let (whole, fraction) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::validation(format!("invalid amount '{s}'")));
        }
        if fraction.len() > 2 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::validation(format!(
                "invalid amount '{s}': at most two decimal places"
            )));
        }

        let overflow = || DomainError::validation(format!("amount '{s}' is too large"));

        let rupees: u64 = whole.parse().map_err(|_| overflow())?;
        let paise: u64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<u64>().map_err(|_| overflow())? * 10,
            _ => fraction.parse::<u64>().map_err(|_| overflow())?,
        };

        rupees
            .checked_mul(100)
            .and_then(|p| p.checked_add(paise))
            .map(Money)
            .ok_or_else(overflow)
    }
}

/// Tax rate in basis points (1800 = 18%).
#[derive(
    Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TaxRate(u32);

impl TaxRate {
    pub const ZERO: TaxRate = TaxRate(0);

    pub const fn from_bps(bps: u32) -> Self {
        Self(bps)
    }

    pub const fn bps(self) -> u32 {
        self.0
    }

    /// Tax owed on `subtotal`, rounded half up.
    pub fn tax_on(self, subtotal: Money) -> Option<Money> {
        mul_div_half_up(subtotal.0, u64::from(self.0), 10_000).map(Money)
    }
}

impl core::fmt::Display for TaxRate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

/// `value * numerator / denominator` rounded half up, computed in 128 bits.
pub fn mul_div_half_up(value: u64, numerator: u64, denominator: u64) -> Option<u64> {
    if denominator == 0 {
        return None;
    }
    let n = u128::from(value) * u128::from(numerator);
    let d = u128::from(denominator);
    u64::try_from((n + d / 2) / d).ok()
}

/// `value * numerator / denominator` rounded up, computed in 128 bits.
pub fn mul_div_ceil(value: u64, numerator: u64, denominator: u64) -> Option<u64> {
    if denominator == 0 {
        return None;
    }
    let n = u128::from(value) * u128::from(numerator);
    let d = u128::from(denominator);
    u64::try_from(n.div_ceil(d)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_rupee_strings() {
        assert_eq!("200".parse::<Money>().unwrap(), Money::from_paise(20_000));
        assert_eq!("200.5".parse::<Money>().unwrap(), Money::from_paise(20_050));
        assert_eq!(" 0.07 ".parse::<Money>().unwrap(), Money::from_paise(7));
    }

    #[test]
    fn rejects_malformed_amounts() {
        for bad in ["", "-1", "1.234", "abc", ".5", "1.x", "99999999999999999999"] {
            assert!(bad.parse::<Money>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn displays_two_decimals() {
        assert_eq!(Money::from_paise(5).to_string(), "0.05");
        assert_eq!(Money::from_paise(123_456).to_string(), "1234.56");
    }

    #[test]
    fn scale_rounds_half_up() {
        // 1.00 * 1 / 3 = 0.333.. -> 0.33
        let one = Money::from_paise(100);
        assert_eq!(
            one.scale(Money::from_paise(1), Money::from_paise(3)),
            Some(Money::from_paise(33))
        );
        // 0.03 * 1 / 2 = 0.015 -> 0.02
        assert_eq!(
            Money::from_paise(3).scale(Money::from_paise(1), Money::from_paise(2)),
            Some(Money::from_paise(2))
        );
        assert_eq!(one.scale(one, Money::ZERO), None);
    }

    #[test]
    fn tax_on_subtotal() {
        let rate = TaxRate::from_bps(1800);
        assert_eq!(rate.to_string(), "18.00%");
        assert_eq!(
            rate.tax_on(Money::from_paise(20_000)),
            Some(Money::from_paise(3_600))
        );
        assert_eq!(TaxRate::ZERO.tax_on(Money::from_paise(999)), Some(Money::ZERO));
    }

    #[test]
    fn serializes_as_plain_paise() {
        let json = serde_json::to_string(&Money::from_paise(4_250)).unwrap();
        assert_eq!(json, "4250");
    }

    proptest! {
        #[test]
        fn ceil_is_never_below_half_up(v in 0u64..1_000_000, n in 0u64..1_000_000, d in 1u64..1_000_000) {
            let up = mul_div_ceil(v, n, d).unwrap();
            let half = mul_div_half_up(v, n, d).unwrap();
            prop_assert!(up >= half);
            prop_assert!(up - half <= 1);
        }

        #[test]
        fn display_then_parse_is_identity(p in 0u64..10_000_000_000) {
            let m = Money::from_paise(p);
            prop_assert_eq!(m.to_string().parse::<Money>().unwrap(), m);
        }
    }
}
