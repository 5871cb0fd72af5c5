//! Amount type for handling money in the smallest currency unit.
//!
//! An `Amount` is always a positive whole number. Signs are carried by `TransactionKind`, never by
//! the amount itself, so a zero or negative `Amount` cannot be constructed.

use crate::error::{pub_bail, ErrorType};
use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A positive integer amount of money, in the smallest currency unit.
///
/// # Examples
///
/// ```
/// # use ledger_quest::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("100,000").unwrap();
/// assert_eq!(amount.value(), 100_000);
/// assert!(Amount::new(0).is_err());
/// assert!(Amount::from_str("12.50").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(i64);

impl Amount {
    /// Creates an `Amount`, rejecting zero and negative values with `ErrorType::Validation`.
    pub fn new(value: i64) -> Result<Self> {
        if value <= 0 {
            pub_bail!(
                ErrorType::Validation,
                "Amount must be a positive integer, got {value}"
            );
        }
        Ok(Self(value))
    }

    /// Returns the underlying integer value.
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Returns the value as a `Decimal` for use in experience calculations.
    pub fn to_decimal(&self) -> Decimal {
        Decimal::from(self.0)
    }
}

impl FromStr for Amount {
    type Err = Error;

    /// Parses a whole number, allowing thousands separators (`,`, `_`) between groups of three
    /// digits. Fractional input is rejected rather than truncated.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            pub_bail!(ErrorType::Validation, "Amount is required");
        }
        let digits = match ungroup(trimmed) {
            Some(digits) => digits,
            None => pub_bail!(
                ErrorType::Validation,
                "Thousands separators must split the amount into groups of three digits, got \
                '{trimmed}'"
            ),
        };
        match digits.parse::<i64>() {
            Ok(value) => Amount::new(value),
            Err(_) => pub_bail!(
                ErrorType::Validation,
                "Amount must be a positive integer, got '{trimmed}'"
            ),
        }
    }
}

/// Strips thousands separators (`,` or `_`) from a number. A separator is only accepted in the
/// whole part, where the first group holds one to three digits and every later group exactly
/// three. Returns `None` when the grouping is wrong, e.g. `1,2,3` or `1,0000`.
pub(crate) fn ungroup(s: &str) -> Option<String> {
    let (sign, unsigned) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s),
    };
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };
    if fraction.is_some_and(|f| f.contains(SEPARATORS)) {
        return None;
    }
    if whole.contains(SEPARATORS) {
        let mut groups = whole.split(SEPARATORS);
        let first = groups.next()?;
        if first.is_empty() || first.len() > 3 || !groups.all(|group| group.len() == 3) {
            return None;
        }
    }

    let mut out = String::with_capacity(s.len());
    out.push_str(sign);
    out.extend(whole.chars().filter(|c| !SEPARATORS.contains(c)));
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    Some(out)
}

const SEPARATORS: [char; 2] = [',', '_'];

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(self.0)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = i64::deserialize(deserializer)?;
        Amount::new(value).map_err(serde::de::Error::custom)
    }
}
