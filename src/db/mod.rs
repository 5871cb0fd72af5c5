//! This module is responsible for reading, writing and managing the SQLite database that backs
//! the durable key-value store.

mod migrations;

use crate::error::Res;
use crate::store::KeyValueStore;
use anyhow::{bail, Context};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, trace};

/// A handle to the SQLite database. Cloning is cheap and clones share the same connection pool.
#[derive(Debug, Clone)]
pub(crate) struct Db {
    pool: SqlitePool,
}

impl Db {
    /// - Validates that no file currently exists at `path`
    /// - Creates a new SQLite file at `path`
    /// - Initializes the database schema
    pub(crate) async fn init(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        if path.exists() {
            bail!("A database already exists at '{}'", path.display());
        }
        let pool = connect(path, true).await?;
        migrations::bootstrap(&pool).await?;
        migrations::run(&pool, 0, migrations::CURRENT_VERSION).await?;
        debug!("Created database at {}", path.display());
        Ok(Self { pool })
    }

    /// - Validates that there is a SQLite file at `path`
    /// - Updates the database schema with migrations if it is out-of-date
    pub(crate) async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            bail!("The database file is missing '{}'", path.display());
        }
        let pool = connect(path, false).await?;
        migrations::bootstrap(&pool).await?;
        let version = migrations::current_version(&pool).await?;
        if version > migrations::CURRENT_VERSION {
            bail!(
                "The database schema version {version} is newer than this program supports ({}). \
                Is a newer version of ledger-quest available?",
                migrations::CURRENT_VERSION
            );
        }
        migrations::run(&pool, version, migrations::CURRENT_VERSION).await?;
        Ok(Self { pool })
    }

    #[cfg(test)]
    pub(crate) async fn count_keys(&self) -> Res<u64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM kv")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count stored keys")?;
        Ok(u64::try_from(row.0).unwrap_or_default())
    }
}

async fn connect(path: &Path, create: bool) -> Res<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
        .context("Failed to parse SQLite connection string")?
        .create_if_missing(create);

    // One connection keeps writes strictly ordered.
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open SQLite database at '{}'", path.display()))
}

#[async_trait::async_trait]
impl KeyValueStore for Db {
    async fn get(&mut self, key: &str) -> anyhow::Result<Option<String>> {
        trace!("get '{key}'");
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Unable to read '{key}' from the database"))?;
        Ok(row.map(|(value,)| value))
    }

    async fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        trace!("set '{key}'");
        sqlx::query(
            "INSERT INTO kv (key, value) VALUES (?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, \
             updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Unable to write '{key}' to the database"))?;
        Ok(())
    }
}
