//! Level, experience and rank.
//!
//! Experience is a decimal value within the current level's band `[0, 100)`. Transactions move it
//! up (income) or down (expense); crossing 100 converts whole bands into levels. When a level cap
//! is configured, reaching it pins experience to exactly 100 and further deltas have no effect.
//!
//! Two behaviours differ between deployments and are therefore part of `ProgressionPolicy`
//! rather than hard-coded:
//! - `DeltaAtCap`: whether a transaction recorded at the cap earns zero experience or its normal
//!   value.
//! - `LevelUpStrategy`: whether levels are gained one band at a time or in a single floor
//!   division. Both give identical results for an uncapped level.

use crate::model::{Amount, Rank, TransactionKind};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// The width of a level band, and the pinned experience value at the level cap.
pub const EXPERIENCE_PER_LEVEL: Decimal = Decimal::ONE_HUNDRED;

/// The level cap used when none is configured explicitly.
pub const DEFAULT_LEVEL_CAP: u32 = 200;

/// Experience deltas are rounded to this many decimal places when a transaction is created.
pub const DELTA_DECIMAL_PLACES: u32 = 4;

/// Default experience per currency unit of income: 0.2 per 1000.
pub const DEFAULT_INCOME_RATE: Decimal = Decimal::from_parts(2, 0, 0, false, 4);

/// Default experience per currency unit of expense: 0.1 per 1000.
pub const DEFAULT_EXPENSE_RATE: Decimal = Decimal::from_parts(1, 0, 0, false, 4);

/// What a new transaction earns when the level is already at its cap.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaAtCap {
    /// The delta is zero, so deleting the transaction later also has no effect.
    #[default]
    Zero,
    /// The delta is computed as usual and stored, even though it cannot change the state.
    Compute,
}

serde_plain::derive_display_from_serialize!(DeltaAtCap);
serde_plain::derive_fromstr_from_deserialize!(DeltaAtCap);

/// How accumulated experience is converted into levels.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelUpStrategy {
    /// One level per iteration, subtracting 100 each time.
    #[default]
    Stepwise,
    /// `floor(experience / 100)` levels at once, keeping `experience mod 100`.
    FloorDivision,
}

serde_plain::derive_display_from_serialize!(LevelUpStrategy);
serde_plain::derive_fromstr_from_deserialize!(LevelUpStrategy);

/// The configurable rules of the progression system. This is stored in the `progression` section
/// of `config.json`; missing fields take their defaults.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct ProgressionPolicy {
    /// Experience gained per currency unit of income.
    income_rate: Decimal,
    /// Experience lost per currency unit of expense.
    expense_rate: Decimal,
    /// The highest reachable level, or `None` for no cap.
    level_cap: Option<u32>,
    delta_at_cap: DeltaAtCap,
    level_up: LevelUpStrategy,
}

impl Default for ProgressionPolicy {
    fn default() -> Self {
        Self {
            income_rate: DEFAULT_INCOME_RATE,
            expense_rate: DEFAULT_EXPENSE_RATE,
            level_cap: Some(DEFAULT_LEVEL_CAP),
            delta_at_cap: DeltaAtCap::default(),
            level_up: LevelUpStrategy::default(),
        }
    }
}

impl ProgressionPolicy {
    pub fn new(
        income_rate: Decimal,
        expense_rate: Decimal,
        level_cap: Option<u32>,
        delta_at_cap: DeltaAtCap,
        level_up: LevelUpStrategy,
    ) -> Self {
        Self {
            income_rate,
            expense_rate,
            level_cap,
            delta_at_cap,
            level_up,
        }
    }

    pub fn with_level_cap(mut self, level_cap: Option<u32>) -> Self {
        self.level_cap = level_cap;
        self
    }

    pub fn with_delta_at_cap(mut self, delta_at_cap: DeltaAtCap) -> Self {
        self.delta_at_cap = delta_at_cap;
        self
    }

    pub fn with_level_up(mut self, level_up: LevelUpStrategy) -> Self {
        self.level_up = level_up;
        self
    }

    pub fn income_rate(&self) -> Decimal {
        self.income_rate
    }

    pub fn expense_rate(&self) -> Decimal {
        self.expense_rate
    }

    pub fn level_cap(&self) -> Option<u32> {
        self.level_cap
    }

    pub fn delta_at_cap(&self) -> DeltaAtCap {
        self.delta_at_cap
    }

    pub fn level_up(&self) -> LevelUpStrategy {
        self.level_up
    }

    /// Whether `level` is at (or beyond) the configured cap.
    pub fn is_capped(&self, level: u32) -> bool {
        self.level_cap.is_some_and(|cap| level >= cap)
    }

    /// Computes the experience delta for a new transaction. Income deltas are never negative and
    /// expense deltas are never positive.
    pub fn compute_delta(
        &self,
        kind: TransactionKind,
        amount: Amount,
        current: &Progression,
    ) -> Decimal {
        if self.delta_at_cap == DeltaAtCap::Zero && self.is_capped(current.level()) {
            return Decimal::ZERO;
        }
        let raw = match kind {
            TransactionKind::Income => amount.to_decimal().saturating_mul(self.income_rate),
            TransactionKind::Expense => -amount.to_decimal().saturating_mul(self.expense_rate),
        };
        raw.round_dp_with_strategy(
            DELTA_DECIMAL_PLACES,
            RoundingStrategy::MidpointAwayFromZero,
        )
    }
}

/// The level and experience of the user. The rank is derived from the level on demand.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct Progression {
    level: u32,
    experience: Decimal,
}

impl Progression {
    /// Creates a progression as-is. Call `normalize` to bring it into its valid domain.
    pub fn new(level: u32, experience: Decimal) -> Self {
        Self { level, experience }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn experience(&self) -> Decimal {
        self.experience
    }

    pub fn rank(&self) -> Rank {
        Rank::for_level(self.level)
    }

    /// Adds `delta` to the experience and normalizes. To reverse a transaction, pass the negation
    /// of its stored delta.
    pub fn apply_delta(&mut self, delta: Decimal, policy: &ProgressionPolicy) {
        self.experience = self.experience.saturating_add(delta);
        self.normalize(policy);
    }

    /// Converts whole bands of experience into levels, stops at the cap, and floors experience
    /// at zero. Calling it again without an intervening delta changes nothing.
    pub fn normalize(&mut self, policy: &ProgressionPolicy) {
        if let Some(cap) = policy.level_cap() {
            if self.level >= cap {
                self.pin(cap);
                return;
            }
        }

        if self.experience >= EXPERIENCE_PER_LEVEL {
            let remainder = self.experience % EXPERIENCE_PER_LEVEL;
            let gained = ((self.experience - remainder) / EXPERIENCE_PER_LEVEL)
                .to_u32()
                .unwrap_or(u32::MAX);
            match policy.level_up() {
                LevelUpStrategy::Stepwise => {
                    // One band at a time, stopping at the cap or at u32::MAX when uncapped.
                    let limit = policy.level_cap().unwrap_or(u32::MAX);
                    self.level += gained.min(limit.saturating_sub(self.level));
                    if policy.is_capped(self.level) {
                        self.pin(self.level);
                        return;
                    }
                }
                LevelUpStrategy::FloorDivision => {
                    let level = self.level.saturating_add(gained);
                    if let Some(cap) = policy.level_cap() {
                        if level >= cap {
                            self.pin(cap);
                            return;
                        }
                    }
                    self.level = level;
                }
            }
            self.experience = remainder;
        }

        if self.experience.is_sign_negative() {
            self.experience = Decimal::ZERO;
        }
    }

    fn pin(&mut self, cap: u32) {
        self.level = cap;
        self.experience = EXPERIENCE_PER_LEVEL;
    }
}
