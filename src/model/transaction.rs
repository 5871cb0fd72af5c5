use crate::error::{pub_bail, ErrorType};
use crate::model::Amount;
use crate::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a transaction adds to or subtracts from the balance.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

serde_plain::derive_display_from_serialize!(TransactionKind);
serde_plain::derive_fromstr_from_deserialize!(TransactionKind);

impl TransactionKind {
    /// Parses user input, ignoring case and surrounding whitespace. Anything other than `income`
    /// or `expense` is rejected with `ErrorType::Validation`.
    pub fn parse(s: impl AsRef<str>) -> Result<Self> {
        let normalized = s.as_ref().trim().to_lowercase();
        match normalized.parse::<TransactionKind>() {
            Ok(kind) => Ok(kind),
            Err(_) => pub_bail!(
                ErrorType::Validation,
                "Unknown transaction type '{}', expected 'income' or 'expense'",
                s.as_ref()
            ),
        }
    }

    /// The sign applied to the amount when computing a balance.
    pub fn signum(&self) -> i64 {
        match self {
            TransactionKind::Income => 1,
            TransactionKind::Expense => -1,
        }
    }
}

/// A single recorded income or expense.
///
/// The experience delta is computed once, when the transaction is created, and is stored with
/// it. Deleting the transaction reverses exactly that value, regardless of the progression policy
/// in effect at deletion time.
///
/// The serialized field names (`type`, `date`, `expChange`) are those of the stored
/// `transactions` entry. `kind`, `timestamp` and `experienceDelta` are accepted when reading.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Stable identity. Records stored without an id are given a new one when loaded.
    #[serde(default = "Uuid::new_v4")]
    id: Uuid,
    description: String,
    amount: Amount,
    #[serde(rename = "type", alias = "kind")]
    kind: TransactionKind,
    #[serde(rename = "date", alias = "timestamp")]
    timestamp: DateTime<Utc>,
    #[serde(rename = "expChange", alias = "experienceDelta", default)]
    experience_delta: Decimal,
}

impl Transaction {
    /// Creates a transaction with a new id. `description` must already be validated.
    pub(crate) fn new(
        description: impl Into<String>,
        amount: Amount,
        kind: TransactionKind,
        timestamp: DateTime<Utc>,
        experience_delta: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            amount,
            kind,
            timestamp,
            experience_delta,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn experience_delta(&self) -> Decimal {
        self.experience_delta
    }

    /// The amount with the sign of its kind applied.
    pub fn signed_amount(&self) -> i64 {
        self.amount.value() * self.kind.signum()
    }
}
