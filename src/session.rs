//! The single owner of the user's state. Every mutation goes through `Session`, which validates,
//! applies the change in memory, notifies subscribers and persists.

use crate::error::{pub_bail, ErrorType};
use crate::ledger::{self, Ledger, WeeklyReport};
use crate::model::{ungroup, Amount, Rank, Transaction, TransactionKind};
use crate::persistence::PersistenceGateway;
use crate::progression::{Progression, ProgressionPolicy};
use crate::store::KeyValueStore;
use crate::{Config, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;
use tokio::sync::watch;
use tracing::{debug, info};
use uuid::Uuid;

/// Everything that is persisted: the ledger, the progression, the savings target and the profile.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct SessionState {
    ledger: Ledger,
    progression: Progression,
    savings_target: Decimal,
    username: String,
}

impl SessionState {
    pub fn new(
        ledger: Ledger,
        progression: Progression,
        savings_target: Decimal,
        username: String,
    ) -> Self {
        Self {
            ledger,
            progression,
            savings_target,
            username,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn progression(&self) -> &Progression {
        &self.progression
    }

    pub fn savings_target(&self) -> Decimal {
        self.savings_target
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

/// A snapshot of the derived values shown to the user.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Summary {
    pub username: String,
    pub level: u32,
    pub experience: Decimal,
    pub rank: Rank,
    pub balance: i64,
    pub savings_target: Decimal,
    pub savings_progress: Decimal,
    pub weekly: WeeklyReport,
    pub transaction_count: usize,
}

pub struct Session {
    state: SessionState,
    policy: ProgressionPolicy,
    gateway: PersistenceGateway,
    changes: watch::Sender<u64>,
}

impl Session {
    /// Loads the state from `store`, falling back to defaults for anything missing or malformed,
    /// and normalizes the loaded progression under `policy`.
    pub async fn open(
        store: Box<dyn KeyValueStore + Send>,
        policy: ProgressionPolicy,
        default_username: &str,
    ) -> Self {
        let mut gateway = PersistenceGateway::new(store);
        let mut state = gateway.load(default_username).await;
        let loaded = state.progression;
        state.progression.normalize(&policy);
        if state.progression != loaded {
            debug!(
                "Normalized stored progression from level {} / {} to level {} / {}",
                loaded.level(),
                loaded.experience(),
                state.progression.level(),
                state.progression.experience()
            );
        }
        debug!(
            "Opened session for '{}' with {} transaction(s)",
            state.username,
            state.ledger.len()
        );
        let (changes, _) = watch::channel(0);
        Self {
            state,
            policy,
            gateway,
            changes,
        }
    }

    /// Opens a session on the database and progression policy of `config`.
    pub async fn from_config(config: &Config) -> Self {
        Self::open(
            Box::new(config.db().clone()),
            config.progression().clone(),
            config.default_username(),
        )
        .await
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn policy(&self) -> &ProgressionPolicy {
        &self.policy
    }

    /// Returns a receiver whose value is bumped after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    /// Records a transaction dated now. See `add_transaction_at`.
    pub async fn add_transaction(
        &mut self,
        description: &str,
        amount: i64,
        kind: TransactionKind,
    ) -> Result<Transaction> {
        self.add_transaction_at(description, amount, kind, Utc::now())
            .await
    }

    /// Records a transaction dated `now` and applies its experience delta.
    ///
    /// # Errors
    /// - `ErrorType::Validation` if the description is empty or the amount is not positive.
    ///   Nothing changes.
    /// - `ErrorType::Persistence` if the change could not be stored. The change is kept in memory.
    pub async fn add_transaction_at(
        &mut self,
        description: &str,
        amount: i64,
        kind: TransactionKind,
        now: DateTime<Utc>,
    ) -> Result<Transaction> {
        let amount = Amount::new(amount)?;
        let transaction = Ledger::prepare(
            description,
            amount,
            kind,
            now,
            &self.policy,
            &self.state.progression,
        )?;
        let mut progression = self.state.progression;
        progression.apply_delta(transaction.experience_delta(), &self.policy);

        self.state.ledger.push_front(transaction.clone());
        self.state.progression = progression;
        info!(
            "Added {} of {} '{}', experience change {}",
            transaction.kind(),
            transaction.amount(),
            transaction.description(),
            transaction.experience_delta()
        );
        self.commit().await?;
        Ok(transaction)
    }

    /// Deletes the transaction at `position` (0 is the newest) and reverses its experience delta.
    ///
    /// # Errors
    /// - `ErrorType::Index` if there is no such position. Nothing changes.
    /// - `ErrorType::Persistence` if the change could not be stored. The change is kept in memory.
    pub async fn delete_transaction(&mut self, position: usize) -> Result<Transaction> {
        let removed = self.state.ledger.remove_transaction(position)?;
        self.reverse(&removed);
        self.commit().await?;
        Ok(removed)
    }

    /// Deletes the transaction with `id` and reverses its experience delta.
    ///
    /// # Errors
    /// - `ErrorType::Index` if there is no such transaction. Nothing changes.
    /// - `ErrorType::Persistence` if the change could not be stored. The change is kept in memory.
    pub async fn delete_transaction_by_id(&mut self, id: Uuid) -> Result<Transaction> {
        let removed = self.state.ledger.remove_transaction_by_id(id)?;
        self.reverse(&removed);
        self.commit().await?;
        Ok(removed)
    }

    /// Sets the savings target. Zero clears it.
    ///
    /// # Errors
    /// - `ErrorType::Validation` if `target` is negative. Nothing changes.
    /// - `ErrorType::Persistence` if the change could not be stored. The change is kept in memory.
    pub async fn set_savings_target(&mut self, target: Decimal) -> Result<()> {
        if target.is_sign_negative() && !target.is_zero() {
            pub_bail!(
                ErrorType::Validation,
                "The savings target must not be negative, got {target}"
            );
        }
        self.state.savings_target = target.normalize();
        info!("Savings target set to {}", self.state.savings_target);
        self.commit().await
    }

    /// Parses a savings target typed by the user, e.g. `1500000`, `1,500,000` or `2500.50`.
    ///
    /// # Errors
    /// - `ErrorType::Validation` if the text is not a non-negative number.
    pub fn parse_target(s: &str) -> Result<Decimal> {
        let cleaned = match ungroup(s.trim()) {
            Some(cleaned) => cleaned,
            None => pub_bail!(
                ErrorType::Validation,
                "Thousands separators in the savings target '{s}' must group digits in threes"
            ),
        };
        let target = match Decimal::from_str(&cleaned) {
            Ok(target) => target,
            Err(_) => match Decimal::from_scientific(&cleaned) {
                Ok(target) => target,
                Err(_) => pub_bail!(
                    ErrorType::Validation,
                    "The savings target '{s}' is not a number"
                ),
            },
        };
        if target.is_sign_negative() && !target.is_zero() {
            pub_bail!(
                ErrorType::Validation,
                "The savings target must not be negative, got {s}"
            );
        }
        Ok(target)
    }

    /// Changes the display name.
    ///
    /// # Errors
    /// - `ErrorType::Validation` if `name` is empty after trimming. Nothing changes.
    /// - `ErrorType::Persistence` if the change could not be stored. The change is kept in memory.
    pub async fn rename_user(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            pub_bail!(ErrorType::Validation, "The name must not be empty");
        }
        self.state.username = name.to_string();
        info!("Renamed user to '{name}'");
        self.commit().await
    }

    pub fn transactions(&self) -> &[Transaction] {
        self.state.ledger.transactions()
    }

    pub fn balance(&self) -> i64 {
        self.state.ledger.balance()
    }

    pub fn weekly_report(&self, now: DateTime<Utc>) -> WeeklyReport {
        self.state.ledger.weekly_report(now)
    }

    pub fn savings_target(&self) -> Decimal {
        self.state.savings_target
    }

    pub fn savings_progress(&self) -> Decimal {
        ledger::savings_progress(self.balance(), self.state.savings_target)
    }

    pub fn level(&self) -> u32 {
        self.state.progression.level()
    }

    pub fn experience(&self) -> Decimal {
        self.state.progression.experience()
    }

    pub fn rank(&self) -> Rank {
        self.state.progression.rank()
    }

    pub fn username(&self) -> &str {
        &self.state.username
    }

    pub fn summary(&self, now: DateTime<Utc>) -> Summary {
        Summary {
            username: self.state.username.clone(),
            level: self.level(),
            experience: self.experience(),
            rank: self.rank(),
            balance: self.balance(),
            savings_target: self.savings_target(),
            savings_progress: self.savings_progress(),
            weekly: self.weekly_report(now),
            transaction_count: self.state.ledger.len(),
        }
    }

    fn reverse(&mut self, removed: &Transaction) {
        self.state
            .progression
            .apply_delta(-removed.experience_delta(), &self.policy);
        info!(
            "Deleted {} of {} '{}', experience change {}",
            removed.kind(),
            removed.amount(),
            removed.description(),
            -removed.experience_delta()
        );
    }

    async fn commit(&mut self) -> Result<()> {
        self.changes
            .send_modify(|revision| *revision = revision.wrapping_add(1));
        self.gateway.save(&self.state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{EXP_KEY, LEVEL_KEY, USERNAME_KEY};
    use crate::progression::EXPERIENCE_PER_LEVEL;
    use crate::store::MemoryStore;
    use crate::test::TestEnv;
    use chrono::Duration;

    const DEFAULT_NAME: &str = "Pengguna";

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    async fn open(store: &MemoryStore) -> Session {
        Session::open(
            Box::new(store.clone()),
            ProgressionPolicy::default(),
            DEFAULT_NAME,
        )
        .await
    }

    #[tokio::test]
    async fn test_fresh_session_defaults() {
        let session = open(&MemoryStore::new()).await;
        assert_eq!(session.username(), DEFAULT_NAME);
        assert_eq!(session.balance(), 0);
        assert_eq!(session.level(), 0);
        assert_eq!(session.experience(), Decimal::ZERO);
        assert_eq!(session.rank(), Rank::Bronze);
        assert_eq!(session.savings_progress(), Decimal::ZERO);
        assert!(session.transactions().is_empty());
    }

    #[tokio::test]
    async fn test_add_income_gains_experience() {
        let mut session = open(&MemoryStore::new()).await;
        let t = session
            .add_transaction("Gaji", 100_000, TransactionKind::Income)
            .await
            .unwrap();
        assert_eq!(t.experience_delta(), dec("20"));
        assert_eq!(session.balance(), 100_000);
        assert_eq!(session.level(), 0);
        assert_eq!(session.experience(), dec("20"));
    }

    #[tokio::test]
    async fn test_level_up_from_95() {
        let store = MemoryStore::with_data([(LEVEL_KEY, "0"), (EXP_KEY, "95")]);
        let mut session = open(&store).await;
        session
            .add_transaction("Bonus", 50_000, TransactionKind::Income)
            .await
            .unwrap();
        assert_eq!(session.level(), 1);
        assert_eq!(session.experience(), dec("5"));
    }

    #[tokio::test]
    async fn test_delete_after_level_up_keeps_level() {
        let store = MemoryStore::with_data([(LEVEL_KEY, "0"), (EXP_KEY, "95")]);
        let mut session = open(&store).await;
        session
            .add_transaction("Bonus", 50_000, TransactionKind::Income)
            .await
            .unwrap();
        assert_eq!(session.level(), 1);
        assert_eq!(session.experience(), dec("5"));

        session.delete_transaction(0).await.unwrap();
        assert_eq!(session.level(), 1);
        assert_eq!(session.experience(), Decimal::ZERO);
        assert_eq!(store.value(LEVEL_KEY).await.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_open_with_large_stored_experience() {
        let store = MemoryStore::with_data([(LEVEL_KEY, "0"), (EXP_KEY, "123456789012.5")]);
        let policy = ProgressionPolicy::default().with_level_cap(None);
        let session = Session::open(Box::new(store), policy, DEFAULT_NAME).await;
        assert_eq!(session.level(), 1_234_567_890);
        assert_eq!(session.experience(), dec("12.5"));
        assert_eq!(session.rank(), Rank::Platinum);
    }

    #[tokio::test]
    async fn test_add_then_delete_round_trip() {
        let store = MemoryStore::with_data([(LEVEL_KEY, "3"), (EXP_KEY, "40")]);
        let mut session = open(&store).await;
        let before = *session.state().progression();

        let t = session
            .add_transaction("Kopi", 30_000, TransactionKind::Expense)
            .await
            .unwrap();
        assert_eq!(session.experience(), dec("37"));
        session.delete_transaction_by_id(t.id()).await.unwrap();

        assert_eq!(*session.state().progression(), before);
        assert!(session.transactions().is_empty());
        assert_eq!(session.balance(), 0);
    }

    #[tokio::test]
    async fn test_delete_only_transaction_empties_ledger() {
        let mut session = open(&MemoryStore::new()).await;
        session
            .add_transaction("Gaji", 100_000, TransactionKind::Income)
            .await
            .unwrap();
        session.delete_transaction(0).await.unwrap();
        assert!(session.transactions().is_empty());
        assert_eq!(session.balance(), 0);
        assert_eq!(session.level(), 0);
        assert_eq!(session.experience(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_expense_floors_experience_at_zero() {
        let store = MemoryStore::with_data([(LEVEL_KEY, "2"), (EXP_KEY, "5")]);
        let mut session = open(&store).await;
        session
            .add_transaction("Sewa", 2_000_000, TransactionKind::Expense)
            .await
            .unwrap();
        assert_eq!(session.level(), 2);
        assert_eq!(session.experience(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_delete_restores_exact_experience_within_band() {
        let mut session = open(&MemoryStore::new()).await;
        session
            .add_transaction("Gaji", 100_000, TransactionKind::Income)
            .await
            .unwrap();
        session
            .add_transaction("Freelance", 12_345, TransactionKind::Income)
            .await
            .unwrap();
        assert_eq!(session.experience(), dec("22.469"));
        session.delete_transaction(0).await.unwrap();
        assert_eq!(session.experience(), dec("20"));
        assert_eq!(session.transactions()[0].description(), "Gaji");
    }

    #[tokio::test]
    async fn test_invalid_input_changes_nothing() {
        let store = MemoryStore::new();
        let mut session = open(&store).await;
        let changes = session.subscribe();

        let err = session
            .add_transaction("  ", 10, TransactionKind::Income)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        let err = session
            .add_transaction("Gaji", 0, TransactionKind::Income)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        let err = session.delete_transaction(0).await.unwrap_err();
        assert!(err.is_index());
        let err = session
            .delete_transaction_by_id(Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(err.is_index());
        let err = session.rename_user(" ").await.unwrap_err();
        assert!(err.is_validation());
        let err = session.set_savings_target(dec("-1")).await.unwrap_err();
        assert!(err.is_validation());

        assert!(!changes.has_changed().unwrap());
        assert!(store.is_empty().await);
        assert_eq!(session.username(), DEFAULT_NAME);
    }

    #[tokio::test]
    async fn test_mutations_notify_subscribers() {
        let mut session = open(&MemoryStore::new()).await;
        let mut changes = session.subscribe();
        assert_eq!(*changes.borrow_and_update(), 0);

        session.rename_user("Budi").await.unwrap();
        assert!(changes.has_changed().unwrap());
        assert_eq!(*changes.borrow_and_update(), 1);

        session
            .add_transaction("Gaji", 1_000, TransactionKind::Income)
            .await
            .unwrap();
        session.set_savings_target(dec("5000")).await.unwrap();
        session.delete_transaction(0).await.unwrap();
        assert_eq!(*changes.borrow_and_update(), 4);
    }

    #[tokio::test]
    async fn test_savings_target_and_progress() {
        let mut session = open(&MemoryStore::new()).await;
        session
            .add_transaction("Gaji", 50_000, TransactionKind::Income)
            .await
            .unwrap();
        assert_eq!(session.savings_progress(), Decimal::ZERO);

        session.set_savings_target(dec("200000")).await.unwrap();
        assert_eq!(session.savings_progress(), dec("25"));

        session.set_savings_target(Decimal::ZERO).await.unwrap();
        assert_eq!(session.savings_progress(), Decimal::ZERO);
    }

    #[test]
    fn test_parse_target() {
        assert_eq!(Session::parse_target("1500000").unwrap(), dec("1500000"));
        assert_eq!(Session::parse_target(" 1,500,000 ").unwrap(), dec("1500000"));
        assert_eq!(Session::parse_target("2500.50").unwrap(), dec("2500.50"));
        assert_eq!(Session::parse_target("0").unwrap(), Decimal::ZERO);
        assert!(Session::parse_target("banyak").unwrap_err().is_validation());
        assert!(Session::parse_target("").unwrap_err().is_validation());
        assert!(Session::parse_target("-10").unwrap_err().is_validation());
        assert_eq!(
            Session::parse_target("1,500,000.25").unwrap(),
            dec("1500000.25")
        );
        assert!(Session::parse_target("1,2,3").unwrap_err().is_validation());
        assert!(Session::parse_target("15,00").unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn test_persistence_failure_keeps_memory_state() {
        let store = MemoryStore::new();
        let mut session = open(&store).await;
        let changes = session.subscribe();
        store.set_fail_writes(true).await;

        let err = session
            .add_transaction("Gaji", 100_000, TransactionKind::Income)
            .await
            .unwrap_err();
        assert!(err.is_persistence());
        assert_eq!(session.transactions().len(), 1);
        assert_eq!(session.balance(), 100_000);
        assert_eq!(session.experience(), dec("20"));
        assert!(changes.has_changed().unwrap());

        store.set_fail_writes(false).await;
        session.rename_user("Sari").await.unwrap();
        let reloaded = open(&store).await;
        assert_eq!(reloaded.transactions().len(), 1);
        assert_eq!(reloaded.username(), "Sari");
    }

    #[tokio::test]
    async fn test_reload_restores_state() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let mut session = open(&store).await;
        session
            .add_transaction_at("Gaji", 3_100_000, TransactionKind::Income, now)
            .await
            .unwrap();
        session
            .add_transaction_at(
                "Makan",
                75_000,
                TransactionKind::Expense,
                now - Duration::days(10),
            )
            .await
            .unwrap();
        session.set_savings_target(dec("10000000")).await.unwrap();
        session.rename_user("Budi").await.unwrap();

        let reloaded = open(&store).await;
        assert_eq!(reloaded.state(), session.state());
        assert_eq!(reloaded.summary(now), session.summary(now));
        assert_eq!(store.value(USERNAME_KEY).await.unwrap(), "Budi");

        let summary = reloaded.summary(now);
        assert_eq!(summary.level, 6);
        assert_eq!(summary.experience, dec("12.5"));
        assert_eq!(summary.balance, 3_025_000);
        assert_eq!(summary.weekly.income, 3_100_000);
        assert_eq!(summary.weekly.expense, 0);
        assert_eq!(summary.transaction_count, 2);
    }

    #[tokio::test]
    async fn test_out_of_domain_stored_progression_is_normalized() {
        let store = MemoryStore::with_data([(LEVEL_KEY, "0"), (EXP_KEY, "250.5")]);
        let session = open(&store).await;
        assert_eq!(session.level(), 2);
        assert_eq!(session.experience(), dec("50.5"));

        let store = MemoryStore::with_data([(LEVEL_KEY, "999"), (EXP_KEY, "1")]);
        let session = open(&store).await;
        assert_eq!(session.level(), 200);
        assert_eq!(session.experience(), EXPERIENCE_PER_LEVEL);
        assert_eq!(session.rank(), Rank::Platinum);
    }

    #[tokio::test]
    async fn test_session_from_config() {
        let env = TestEnv::new().await;
        let mut session = Session::from_config(&env.config()).await;
        assert_eq!(session.username(), DEFAULT_NAME);
        session
            .add_transaction("Gaji", 100_000, TransactionKind::Income)
            .await
            .unwrap();

        let reloaded = Session::from_config(&env.config()).await;
        assert_eq!(reloaded.transactions().len(), 1);
        assert_eq!(reloaded.experience(), dec("20"));
    }
}
