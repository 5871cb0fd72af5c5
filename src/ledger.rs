//! The ordered list of transactions and the values derived from it.
//!
//! Nothing here is cached. The balance, the weekly report and the savings progress are
//! recomputed from the full sequence each time they are asked for.

use crate::error::{pub_bail, ErrorType};
use crate::model::{Amount, Transaction, TransactionKind};
use crate::progression::{Progression, ProgressionPolicy};
use crate::Result;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The length of the trailing report window, in days.
pub const REPORT_WINDOW_DAYS: i64 = 7;

/// Income and expense totals over the trailing report window.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct WeeklyReport {
    pub income: i64,
    pub expense: i64,
}

/// All recorded transactions, newest first.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    transactions: Vec<Transaction>,
}

impl Ledger {
    /// Wraps an already-ordered (newest first) list of transactions.
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Returns the position of the transaction with `id`, if any.
    pub fn position_of(&self, id: Uuid) -> Option<usize> {
        self.transactions.iter().position(|t| t.id() == id)
    }

    /// Validates the input and builds a transaction without adding it. The experience delta is
    /// computed from `current` under `policy` and fixed on the returned transaction.
    ///
    /// # Errors
    /// - `ErrorType::Validation` if the description is empty after trimming.
    pub fn prepare(
        description: &str,
        amount: Amount,
        kind: TransactionKind,
        now: DateTime<Utc>,
        policy: &ProgressionPolicy,
        current: &Progression,
    ) -> Result<Transaction> {
        let description = description.trim();
        if description.is_empty() {
            pub_bail!(ErrorType::Validation, "Description must not be empty");
        }
        let delta = policy.compute_delta(kind, amount, current);
        Ok(Transaction::new(description, amount, kind, now, delta))
    }

    /// Puts an already-built transaction at the front of the list.
    pub(crate) fn push_front(&mut self, transaction: Transaction) {
        self.transactions.insert(0, transaction);
    }

    /// Builds a transaction (see `prepare`) and puts it at the front of the list. Progression is
    /// not changed; the caller applies the returned transaction's delta.
    pub fn add_transaction(
        &mut self,
        description: &str,
        amount: Amount,
        kind: TransactionKind,
        now: DateTime<Utc>,
        policy: &ProgressionPolicy,
        current: &Progression,
    ) -> Result<Transaction> {
        let transaction = Self::prepare(description, amount, kind, now, policy, current)?;
        self.push_front(transaction.clone());
        Ok(transaction)
    }

    /// Removes and returns the transaction at `position`. Progression is not changed; the caller
    /// reverses the returned transaction's delta.
    ///
    /// # Errors
    /// - `ErrorType::Index` if `position` is out of bounds. The ledger is unchanged.
    pub fn remove_transaction(&mut self, position: usize) -> Result<Transaction> {
        if position >= self.transactions.len() {
            pub_bail!(
                ErrorType::Index,
                "No transaction at position {position}, the ledger has {} transaction{}",
                self.transactions.len(),
                if self.transactions.len() == 1 { "" } else { "s" }
            );
        }
        Ok(self.transactions.remove(position))
    }

    /// Removes and returns the transaction with `id`.
    ///
    /// # Errors
    /// - `ErrorType::Index` if no transaction has that id. The ledger is unchanged.
    pub fn remove_transaction_by_id(&mut self, id: Uuid) -> Result<Transaction> {
        match self.position_of(id) {
            Some(position) => self.remove_transaction(position),
            None => pub_bail!(ErrorType::Index, "Transaction not found: {id}"),
        }
    }

    /// The sum of all income amounts minus the sum of all expense amounts.
    pub fn balance(&self) -> i64 {
        self.transactions
            .iter()
            .fold(0i64, |acc, t| acc.saturating_add(t.signed_amount()))
    }

    /// Totals of income and expense recorded at or after `now - 7 days`.
    pub fn weekly_report(&self, now: DateTime<Utc>) -> WeeklyReport {
        let since = now - Duration::days(REPORT_WINDOW_DAYS);
        self.transactions
            .iter()
            .filter(|t| t.timestamp() >= since)
            .fold(WeeklyReport::default(), |mut report, t| {
                let amount = t.amount().value();
                match t.kind() {
                    TransactionKind::Income => report.income = report.income.saturating_add(amount),
                    TransactionKind::Expense => {
                        report.expense = report.expense.saturating_add(amount)
                    }
                }
                report
            })
    }
}

/// Percentage of `target` reached by `balance`, clamped to `[0, 100]`. A target of zero (or
/// less) means no target is set and always gives 0.
pub fn savings_progress(balance: i64, target: Decimal) -> Decimal {
    if target <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let percent = Decimal::from(balance)
        .checked_div(target)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(if balance < 0 {
            Decimal::ZERO
        } else {
            Decimal::ONE_HUNDRED
        });
    percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
}
