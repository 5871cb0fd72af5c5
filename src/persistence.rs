//! Reads and writes the session state as named string entries in a `KeyValueStore`.
//!
//! | key             | encoding           |
//! |-----------------|--------------------|
//! | `transactions`  | JSON array         |
//! | `savingsTarget` | JSON number        |
//! | `username`      | plain text         |
//! | `level`         | plain text integer |
//! | `exp`           | plain text decimal |
//!
//! Loading never fails. A missing, unreadable or malformed entry is replaced by its default and a
//! warning is logged.

use crate::error::{ErrorType, IntoResult, Res};
use crate::ledger::Ledger;
use crate::model::Transaction;
use crate::progression::Progression;
use crate::session::SessionState;
use crate::store::KeyValueStore;
use crate::Result;
use anyhow::{bail, Context};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::{debug, warn};

pub const TRANSACTIONS_KEY: &str = "transactions";
pub const SAVINGS_TARGET_KEY: &str = "savingsTarget";
pub const USERNAME_KEY: &str = "username";
pub const LEVEL_KEY: &str = "level";
pub const EXP_KEY: &str = "exp";

/// Moves `SessionState` in and out of a `KeyValueStore`.
pub struct PersistenceGateway {
    store: Box<dyn KeyValueStore + Send>,
}

impl PersistenceGateway {
    pub fn new(store: Box<dyn KeyValueStore + Send>) -> Self {
        Self { store }
    }

    /// Loads every entry, substituting defaults for anything missing or malformed. The returned
    /// progression is exactly what was stored; the caller normalizes it.
    pub async fn load(&mut self, default_username: &str) -> SessionState {
        let transactions = self.read(TRANSACTIONS_KEY).await;
        let transactions = decode_or_default(
            TRANSACTIONS_KEY,
            transactions,
            decode_transactions,
            Vec::new,
        );

        let target = self.read(SAVINGS_TARGET_KEY).await;
        let target = decode_or_default(
            SAVINGS_TARGET_KEY,
            target,
            decode_savings_target,
            || Decimal::ZERO,
        );

        let username = self.read(USERNAME_KEY).await;
        let username = decode_or_default(USERNAME_KEY, username, decode_username, || {
            default_username.to_string()
        });

        let level = self.read(LEVEL_KEY).await;
        let level = decode_or_default(LEVEL_KEY, level, decode_level, || 0);

        let exp = self.read(EXP_KEY).await;
        let exp = decode_or_default(EXP_KEY, exp, decode_experience, || Decimal::ZERO);

        SessionState::new(
            Ledger::new(transactions),
            Progression::new(level, exp),
            target,
            username,
        )
    }

    /// Writes every entry. All entries are attempted even if one fails.
    ///
    /// # Errors
    /// - `ErrorType::Persistence` if any entry could not be encoded or written. Entries written
    ///   before and after the failure are not rolled back.
    pub async fn save(&mut self, state: &SessionState) -> Result<()> {
        self.save_inner(state)
            .await
            .context("The change was applied but may not survive a reload")
            .pub_result(ErrorType::Persistence)
    }

    async fn save_inner(&mut self, state: &SessionState) -> Res<()> {
        let entries = [
            (
                TRANSACTIONS_KEY,
                encode_transactions(state.ledger().transactions()),
            ),
            (
                SAVINGS_TARGET_KEY,
                encode_savings_target(state.savings_target()),
            ),
            (USERNAME_KEY, Ok(state.username().to_string())),
            (LEVEL_KEY, Ok(state.progression().level().to_string())),
            (
                EXP_KEY,
                Ok(encode_experience(state.progression().experience())),
            ),
        ];

        let mut failed = Vec::new();
        for (key, value) in entries {
            let result = match value {
                Ok(value) => self.store.set(key, &value).await,
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                warn!("Unable to persist '{key}': {e:#}");
                failed.push(key);
            }
        }

        if !failed.is_empty() {
            bail!("Unable to persist {}", failed.join(", "));
        }
        debug!("Persisted session state");
        Ok(())
    }

    async fn read(&mut self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Unable to read '{key}', using the default: {e:#}");
                None
            }
        }
    }
}

fn decode_or_default<T>(
    key: &str,
    raw: Option<String>,
    decode: impl FnOnce(&str) -> Res<T>,
    default: impl FnOnce() -> T,
) -> T {
    match raw {
        None => {
            debug!("No stored value for '{key}', using the default");
            default()
        }
        Some(raw) => match decode(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("The stored value for '{key}' is malformed, using the default: {e:#}");
                default()
            }
        },
    }
}

pub(crate) fn encode_transactions(transactions: &[Transaction]) -> Res<String> {
    serde_json::to_string(transactions).context("Unable to serialize transactions")
}

pub(crate) fn decode_transactions(raw: &str) -> Res<Vec<Transaction>> {
    serde_json::from_str(raw).context("Unable to parse transactions")
}

pub(crate) fn encode_savings_target(target: Decimal) -> Res<String> {
    let number = serde_json::Number::from_str(&target.normalize().to_string())
        .with_context(|| format!("Unable to represent savings target {target} as a number"))?;
    serde_json::to_string(&serde_json::Value::Number(number))
        .context("Unable to serialize savings target")
}

pub(crate) fn decode_savings_target(raw: &str) -> Res<Decimal> {
    let value: serde_json::Value =
        serde_json::from_str(raw).context("Unable to parse savings target")?;
    let target = match &value {
        serde_json::Value::Number(n) => parse_decimal(&n.to_string())?,
        serde_json::Value::String(s) => parse_decimal(s)?,
        other => bail!("Expected a number for the savings target, found {other}"),
    };
    if target.is_sign_negative() && !target.is_zero() {
        bail!("The savings target must not be negative, found {target}");
    }
    Ok(target)
}

fn decode_username(raw: &str) -> Res<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("The username is empty");
    }
    Ok(trimmed.to_string())
}

fn decode_level(raw: &str) -> Res<u32> {
    raw.trim()
        .parse::<u32>()
        .with_context(|| format!("Expected a non-negative integer level, found '{raw}'"))
}

fn decode_experience(raw: &str) -> Res<Decimal> {
    parse_decimal(raw)
}

pub(crate) fn encode_experience(experience: Decimal) -> String {
    experience.normalize().to_string()
}

/// Parses plain or scientific decimal notation, e.g. `12.5` or `1.5e-7`.
fn parse_decimal(raw: &str) -> Res<Decimal> {
    let trimmed = raw.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .with_context(|| format!("Expected a number, found '{raw}'"))
}
