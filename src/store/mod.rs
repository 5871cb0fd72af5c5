//! The key-value storage seam.
//!
//! The session only ever needs to read and write named string values. `KeyValueStore` captures
//! exactly that, with no transactional guarantees, so the durable SQLite store (`Db`) and the
//! in-memory `MemoryStore` are interchangeable.

mod memory_store;

pub use memory_store::MemoryStore;

/// A durable (or, for tests, not so durable) map of string keys to string values.
#[async_trait::async_trait]
pub trait KeyValueStore {
    /// Returns the value stored under `key`, or `None` if nothing has been stored.
    async fn get(&mut self, key: &str) -> anyhow::Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()>;
}
