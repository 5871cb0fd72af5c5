//! Command handlers for the ledger-quest CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod add;
mod delete;
mod init;
mod profile;
mod show;

use crate::progression::ProgressionPolicy;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

pub use add::add;
pub use delete::delete;
pub use init::init;
pub use profile::{rename, target};
pub use show::{list, show};

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// Formats a whole amount with thousands separators, e.g. `-1,250,000`.
fn money(value: i64) -> String {
    let digits = format_num::format_num!(",.0", value.unsigned_abs() as f64);
    if value < 0 {
        format!("-{digits}")
    } else {
        digits
    }
}

/// Formats a decimal amount with thousands separators and up to two decimal places.
fn money_decimal(value: Decimal) -> String {
    let rounded = value.round_dp(2).abs();
    let digits = if rounded.fract().is_zero() {
        format_num::format_num!(",.0", rounded.to_f64().unwrap_or_default())
    } else {
        format_num::format_num!(",.2", rounded.to_f64().unwrap_or_default())
    };
    if value.is_sign_negative() && !rounded.is_zero() {
        format!("-{digits}")
    } else {
        digits
    }
}

/// Formats experience or a percentage with at most two decimal places.
fn short(value: Decimal) -> String {
    value.round_dp(2).normalize().to_string()
}

/// Formats the experience within the current level, or `MAX` once the level cap is reached.
fn experience_label(policy: &ProgressionPolicy, level: u32, experience: Decimal) -> String {
    if policy.is_capped(level) {
        "MAX experience".to_string()
    } else {
        format!("{}/100 experience", short(experience))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_money() {
        assert_eq!(money(0), "0");
        assert_eq!(money(150_000), "150,000");
        assert_eq!(money(-1_250_000), "-1,250,000");
    }

    #[test]
    fn test_money_decimal() {
        assert_eq!(money_decimal(Decimal::from(5_000_000)), "5,000,000");
        assert_eq!(
            money_decimal(Decimal::from_str("2500.5").unwrap()),
            "2,500.50"
        );
    }

    #[test]
    fn test_short() {
        assert_eq!(short(Decimal::from_str("20.0000").unwrap()), "20");
        assert_eq!(short(Decimal::from_str("37.456").unwrap()), "37.46");
    }

    #[test]
    fn test_experience_label() {
        let policy = ProgressionPolicy::default();
        let exp = Decimal::from_str("37.5").unwrap();
        assert_eq!(experience_label(&policy, 4, exp), "37.5/100 experience");
        assert_eq!(
            experience_label(&policy, 200, Decimal::ONE_HUNDRED),
            "MAX experience"
        );
        let uncapped = policy.with_level_cap(None);
        assert_eq!(experience_label(&uncapped, 200, exp), "37.5/100 experience");
    }

    #[test]
    fn test_out_from_message() {
        let out: Out<()> = "done".into();
        assert_eq!(out.message(), "done");
        assert!(out.structure().is_none());
    }
}
