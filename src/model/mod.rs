//! Types that represent the core data model, such as `Transaction` and `Rank`.
mod amount;
mod rank;
mod transaction;

pub(crate) use amount::ungroup;
pub use amount::Amount;
pub use rank::Rank;
pub use transaction::{Transaction, TransactionKind};
