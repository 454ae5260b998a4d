//! # Monetary Amount Module
//!
//! This module provides the `Amount` type used for every price flowing
//! through the capture pipeline. Values are stored as integer cents so that
//! "1,29" round-trips exactly; binary floating point never enters the type.
//!
//! Display and parsing follow the Portuguese locale convention: decimal
//! comma, trailing euro symbol ("1,29 €"). A dot separator is accepted
//! defensively on input because scanned labels and transcripts are noisy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An exact monetary value in euro cents.
///
/// Signed so that out-of-range manual input (e.g. "-1,00") can still be
/// represented and rejected by validation instead of being silently clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    /// Create an amount from euro cents.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use carrinho_core::amount::Amount;
    ///
    /// let price = Amount::from_cents(129);
    /// assert_eq!(price.cents(), 129);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Amount(cents)
    }

    /// Create an amount from whole euros and a cent part.
    ///
    /// For negative amounts only the euro part carries the sign:
    /// `from_euros_cents(-1, 50)` is -1,50 €.
    #[inline]
    pub const fn from_euros_cents(euros: i64, cents: i64) -> Self {
        if euros < 0 {
            Amount(euros * 100 - cents)
        } else {
            Amount(euros * 100 + cents)
        }
    }

    /// The value in euro cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// The whole-euro part (truncated towards zero).
    #[inline]
    pub const fn euros_part(&self) -> i64 {
        self.0 / 100
    }

    /// The cent part, always 0-99.
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Zero euros.
    #[inline]
    pub const fn zero() -> Self {
        Amount(0)
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Parse a plain decimal price string ("1,29", defensively "1.29", "2").
    ///
    /// At most two decimal digits are accepted; a single decimal digit means
    /// tenths ("1,5" is 1,50 €). Anything else returns `None` — this
    /// function never panics and never goes through floating point.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use carrinho_core::amount::Amount;
    ///
    /// assert_eq!(Amount::parse_decimal("1,29"), Some(Amount::from_cents(129)));
    /// assert_eq!(Amount::parse_decimal("1.29"), Some(Amount::from_cents(129)));
    /// assert_eq!(Amount::parse_decimal("2"), Some(Amount::from_cents(200)));
    /// assert_eq!(Amount::parse_decimal("abc"), None);
    /// ```
    pub fn parse_decimal(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        if digits.is_empty() {
            return None;
        }

        let (euros_str, cents_str) = match digits.find([',', '.']) {
            Some(pos) => (&digits[..pos], &digits[pos + 1..]),
            None => (digits, ""),
        };

        if euros_str.is_empty() || !euros_str.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if !cents_str.is_empty()
            && (cents_str.len() > 2 || !cents_str.bytes().all(|b| b.is_ascii_digit()))
        {
            return None;
        }

        let euros: i64 = euros_str.parse().ok()?;
        let cents: i64 = match cents_str.len() {
            0 => 0,
            1 => cents_str.parse::<i64>().ok()? * 10,
            _ => cents_str.parse().ok()?,
        };

        let total = euros.checked_mul(100)?.checked_add(cents)?;
        Some(Amount(if negative { -total } else { total }))
    }

    /// Round to the nearest multiple of `increment`, ties rounding up.
    ///
    /// Idempotent: rounding an already-rounded value returns it unchanged.
    /// A zero or negative increment leaves the amount untouched.
    pub fn rounded_to_increment(&self, increment: Amount) -> Amount {
        let inc = increment.0;
        if inc <= 0 {
            return *self;
        }
        let rem = self.0.rem_euclid(inc);
        let base = self.0 - rem;
        if rem * 2 >= inc {
            Amount(base + inc)
        } else {
            Amount(base)
        }
    }

    /// Decimal-comma rendering without the currency symbol ("1,29").
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{},{:02}", sign, self.euros_part().abs(), self.cents_part())
    }
}

/// Portuguese-locale rendering with the euro symbol: "1,29 €".
impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} €", self.to_decimal_string())
    }
}

impl Default for Amount {
    fn default() -> Self {
        Amount::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents_parts() {
        let amount = Amount::from_cents(1099);
        assert_eq!(amount.cents(), 1099);
        assert_eq!(amount.euros_part(), 10);
        assert_eq!(amount.cents_part(), 99);
    }

    #[test]
    fn test_from_euros_cents() {
        assert_eq!(Amount::from_euros_cents(2, 29).cents(), 229);
        assert_eq!(Amount::from_euros_cents(-1, 50).cents(), -150);
    }

    #[test]
    fn test_parse_decimal_comma_and_dot() {
        assert_eq!(Amount::parse_decimal("1,29"), Some(Amount::from_cents(129)));
        assert_eq!(Amount::parse_decimal("1.29"), Some(Amount::from_cents(129)));
        assert_eq!(Amount::parse_decimal("0,05"), Some(Amount::from_cents(5)));
        assert_eq!(Amount::parse_decimal("150"), Some(Amount::from_cents(15000)));
        assert_eq!(Amount::parse_decimal("1,5"), Some(Amount::from_cents(150)));
        assert_eq!(Amount::parse_decimal("-1,00"), Some(Amount::from_cents(-100)));
    }

    #[test]
    fn test_parse_decimal_rejects_garbage() {
        assert_eq!(Amount::parse_decimal(""), None);
        assert_eq!(Amount::parse_decimal("abc"), None);
        assert_eq!(Amount::parse_decimal("1,299"), None);
        assert_eq!(Amount::parse_decimal(","), None);
        assert_eq!(Amount::parse_decimal(",29"), None);
        assert_eq!(Amount::parse_decimal("1,2a"), None);
        assert_eq!(Amount::parse_decimal("-"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Amount::from_cents(129)), "1,29 €");
        assert_eq!(format!("{}", Amount::from_cents(500)), "5,00 €");
        assert_eq!(format!("{}", Amount::from_cents(-150)), "-1,50 €");
        assert_eq!(format!("{}", Amount::zero()), "0,00 €");
    }

    #[test]
    fn test_rounding_to_cent_is_identity() {
        let cent = Amount::from_cents(1);
        let amount = Amount::from_cents(129);
        assert_eq!(amount.rounded_to_increment(cent), amount);
    }

    #[test]
    fn test_rounding_to_five_cents() {
        let inc = Amount::from_cents(5);
        assert_eq!(Amount::from_cents(129).rounded_to_increment(inc).cents(), 130);
        assert_eq!(Amount::from_cents(127).rounded_to_increment(inc).cents(), 125);
        // Tie rounds up
        assert_eq!(Amount::from_cents(128).rounded_to_increment(inc).cents(), 130);
    }

    #[test]
    fn test_rounding_is_idempotent() {
        let inc = Amount::from_cents(5);
        for cents in [0, 1, 37, 128, 999, -13] {
            let once = Amount::from_cents(cents).rounded_to_increment(inc);
            assert_eq!(once.rounded_to_increment(inc), once);
        }
    }
}
