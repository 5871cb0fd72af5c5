//! Implements the `KeyValueStore` trait in memory.
//!
//! Note: this is compiled even in the "production" version of this crate so that a session can be
//! run top-to-bottom without a database, e.g. by embedding applications or tests.

use crate::store::KeyValueStore;
use anyhow::bail;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// An in-memory `KeyValueStore`. Clones share the same underlying map, so a test can keep one
/// handle to inspect what a `Session` wrote through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    data: HashMap<String, String>,
    fail_reads: bool,
    fail_writes: bool,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with `data`.
    pub fn with_data<K, V>(data: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let data = data
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                data,
                ..MemoryState::default()
            })),
        }
    }

    /// Makes every subsequent `get` fail, as an unavailable store would.
    pub async fn set_fail_reads(&self, fail: bool) {
        self.state.lock().await.fail_reads = fail;
    }

    /// Makes every subsequent `set` fail, as a full or read-only store would.
    pub async fn set_fail_writes(&self, fail: bool) {
        self.state.lock().await.fail_writes = fail;
    }

    /// Returns the raw value stored under `key`.
    pub async fn value(&self, key: &str) -> Option<String> {
        self.state.lock().await.data.get(key).cloned()
    }

    /// Returns the number of stored keys.
    pub async fn len(&self) -> usize {
        self.state.lock().await.data.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&mut self, key: &str) -> anyhow::Result<Option<String>> {
        let state = self.state.lock().await;
        if state.fail_reads {
            bail!("Unable to read '{key}': the store is unavailable");
        }
        Ok(state.data.get(key).cloned())
    }

    async fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut state = self.state.lock().await;
        if state.fail_writes {
            bail!("Unable to write '{key}': the store is full");
        }
        state.data.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
