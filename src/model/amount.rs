//! Amount type for expense values.
//!
//! This module provides the `Amount` type which wraps `Decimal`. Amounts are written to the ledger
//! in plain, locale-free numeric form (e.g. `-12.5`, `1000`), and parsed from the same form or from
//! scientific notation (e.g. `1.5e3`).

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// Represents a decimal expense amount.
///
/// # Examples
///
/// ```
/// # use daybook::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str(" 12.50 ").unwrap();
/// assert_eq!(amount.to_string(), "12.50");
/// assert!(Amount::from_str("twelve").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    /// Creates a new Amount from a Decimal value.
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// `self + rhs`, or `None` when the sum is outside the range of `Decimal` (about ±7.9e28).
    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    /// Renders the amount with two decimals and thousands separators, e.g. `1,234.50`. Used for
    /// display only; the ledger file always holds the plain form.
    pub fn grouped(&self) -> String {
        format_num::format_num!(",.2", self.0.to_f64().unwrap_or_default())
    }
}

/// An error that can occur when parsing strings into `Amount` values.
pub struct AmountError {
    input: String,
    source: rust_decimal::Error,
}

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.source, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a valid amount: {}", self.input, self.source)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let plain = trimmed.strip_prefix('+').unwrap_or(trimmed);
        let value = match Decimal::from_str(plain) {
            Ok(value) => value,
            Err(plain_err) => {
                if plain.contains(['e', 'E']) {
                    Decimal::from_scientific(plain).map_err(|source| AmountError {
                        input: s.to_string(),
                        source,
                    })?
                } else {
                    return Err(AmountError {
                        input: s.to_string(),
                        source: plain_err,
                    });
                }
            }
        };
        Ok(Amount(value))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_plain() {
        assert_eq!(Amount::from_str("50.00").unwrap().value(), dec("50"));
        assert_eq!(Amount::from_str("-4.5").unwrap().value(), dec("-4.5"));
        assert_eq!(Amount::from_str("+7").unwrap().value(), dec("7"));
    }

    #[test]
    fn test_parse_whitespace() {
        assert_eq!(Amount::from_str("  12.25 \n").unwrap().value(), dec("12.25"));
    }

    #[test]
    fn test_parse_scientific() {
        assert_eq!(Amount::from_str("1.5e3").unwrap().value(), dec("1500"));
        assert_eq!(Amount::from_str("2e-2").unwrap().value(), dec("0.02"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "abc", "12,50", "$5", "1.2.3", "nan", "inf"] {
            let err = Amount::from_str(bad).unwrap_err();
            assert!(err.to_string().contains("is not a valid amount"), "{bad}");
        }
    }

    #[test]
    fn test_display_is_plain() {
        assert_eq!(Amount::from_str("1000.50").unwrap().to_string(), "1000.50");
        assert_eq!(Amount::from_str("-3").unwrap().to_string(), "-3");
    }

    #[test]
    fn test_grouped() {
        assert_eq!(Amount::from_str("1234.5").unwrap().grouped(), "1,234.50");
    }

    #[test]
    fn test_checked_add() {
        let a = Amount::from_str("10").unwrap();
        let b = Amount::from_str("5.25").unwrap();
        assert_eq!(a.checked_add(b).unwrap().value(), dec("15.25"));

        let big = Amount::from_str("7e28").unwrap();
        assert_eq!(big.checked_add(big), None);
    }

    #[test]
    fn test_parse_rejects_out_of_range() {
        assert!(Amount::from_str("1e300").is_err());
        assert!(Amount::from_str("1e28").is_ok());
    }

    #[test]
    fn test_serde_as_string() {
        let amount = Amount::from_str("9.99").unwrap();
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"9.99\"");
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, amount);
        assert!(serde_json::from_str::<Amount>("\"x\"").is_err());
    }
}
