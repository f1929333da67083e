//! Exact decimal money amounts.
//!
//! Amounts are never floating point. The wire format is deliberately narrow:
//!
//! - `Digits[.[Digits]]`, e.g. `10`, `10.`, `10.25`
//! - `[Digits].Digits`, e.g. `.5`, `0.5`
//!
//! An optional leading `-` is accepted so that negative values can reach the
//! validation layer and be rejected there with a meaningful error. Exponents,
//! thousands separators, whitespace and a leading `+` are all rejected.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// An exact decimal amount of money.
///
/// Negative values are representable; every operation that must not accept
/// them checks [`Amount::is_negative`] explicitly.
#[derive(Clone, Copy, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(Decimal);

impl Amount {
    /// The zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap a decimal value.
    #[must_use]
    pub const fn from_decimal(value: Decimal) -> Self {
        Self(value)
    }

    /// Return the underlying decimal.
    #[must_use]
    pub const fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Parse an amount from its wire representation.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidAmountFormat` if the string does not match
    /// the wire grammar, and `LedgerError::InvalidArgument` if the value has
    /// more than 28 significant fractional digits or exceeds the 96-bit range.
    pub fn parse(input: &str) -> Result<Self, LedgerError> {
        let invalid = || LedgerError::InvalidAmountFormat(input.to_string());

        let (negative, unsigned) = match input.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, input),
        };

        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (unsigned, None),
        };

        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) || !frac_part.map_or(true, all_digits) {
            return Err(invalid());
        }

        // At least one digit must appear on one side of the point.
        let frac_digits = frac_part.unwrap_or("");
        if int_part.is_empty() && frac_digits.is_empty() {
            return Err(invalid());
        }

        // Leading and trailing zeros do not count against precision.
        let int_digits = int_part.trim_start_matches('0');
        let frac_digits = frac_digits.trim_end_matches('0');

        let mut canonical = String::with_capacity(input.len() + 2);
        if negative {
            canonical.push('-');
        }
        canonical.push_str(if int_digits.is_empty() { "0" } else { int_digits });
        if !frac_digits.is_empty() {
            canonical.push('.');
            canonical.push_str(frac_digits);
        }

        Decimal::from_str_exact(&canonical).map(Self).map_err(|_| {
            LedgerError::InvalidArgument(format!("amount {input} is out of range"))
        })
    }

    /// Whether the amount is strictly below zero. `-0` is not negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        *self < Self::ZERO
    }

    /// Whether the amount is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Add two amounts, returning `None` on overflow.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Subtract `other` from `self`, returning `None` on overflow.
    #[must_use]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }
}

impl FromStr for Amount {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Amount {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        amount.to_string()
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(Decimal::from(value))
    }
}

// Equality and ordering are numeric: `1.50 == 1.5`.
impl PartialEq for Amount {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Amount {}

impl PartialOrd for Amount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Amount {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount({})", self.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
