//! Configuration file handling.
//!
//! The configuration file is stored at `$LEDGER_QUEST_HOME/config.json` next to the SQLite
//! database `ledger.sqlite` that holds the user's ledger.

use crate::db::Db;
use crate::error::{ErrorType, IntoResult, Res};
use crate::progression::ProgressionPolicy;
use crate::{utils, Result};
use anyhow::{bail, ensure, Context};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_NAME: &str = "ledger-quest";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const LEDGER_SQLITE: &str = "ledger.sqlite";

/// The username shown until the user picks one.
pub const DEFAULT_USERNAME: &str = "Pengguna";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$LEDGER_QUEST_HOME` and from there it loads `config.json` and opens the database.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    db: Db,
    sqlite_path: PathBuf,
}

impl Config {
    /// Creates the data directory with an initial `config.json` holding default settings and an
    /// empty database.
    ///
    /// # Errors
    /// - `ErrorType::Config` if the directory or the config file cannot be written, or a config
    ///   file already exists.
    /// - `ErrorType::Database` if the database cannot be created.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = dir.into();
        let (root, config_path, config_file) = create_config_file(&maybe_relative)
            .await
            .pub_result(ErrorType::Config)?;

        let sqlite_path = root.join(LEDGER_SQLITE);
        let db = Db::init(&sqlite_path)
            .await
            .context("Unable to create SQLite DB")
            .pub_result(ErrorType::Database)?;

        debug!("Created ledger-quest home at {}", root.display());
        Ok(Self {
            root,
            config_path,
            config_file,
            db,
            sqlite_path,
        })
    }

    /// This will
    /// - validate that the home directory and the config file exist
    /// - load and validate the config file
    /// - open the database, migrating its schema if it is out-of-date
    pub async fn load(home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = home.into();
        let (root, config_path, config_file) = load_config_file(&maybe_relative)
            .await
            .pub_result(ErrorType::Config)?;

        let sqlite_path = root.join(LEDGER_SQLITE);
        let db = Db::load(&sqlite_path)
            .await
            .context("Unable to load SQLite DB")
            .pub_result(ErrorType::Database)?;

        Ok(Self {
            root,
            config_path,
            config_file,
            db,
            sqlite_path,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub(crate) fn db(&self) -> &Db {
        &self.db
    }

    pub fn sqlite_path(&self) -> &Path {
        &self.sqlite_path
    }

    pub fn default_username(&self) -> &str {
        &self.config_file.default_username
    }

    pub fn progression(&self) -> &ProgressionPolicy {
        &self.config_file.progression
    }
}

async fn create_config_file(dir: &Path) -> Res<(PathBuf, PathBuf, ConfigFile)> {
    utils::make_dir(dir)
        .await
        .context("Unable to create the ledger-quest home directory")?;
    let root = utils::canonicalize(dir).await?;
    let config_path = root.join(CONFIG_JSON);
    if config_path.exists() {
        bail!(
            "A config file already exists at '{}'",
            config_path.display()
        );
    }
    let config_file = ConfigFile::default();
    config_file.save(&config_path).await?;
    Ok((root, config_path, config_file))
}

async fn load_config_file(dir: &Path) -> Res<(PathBuf, PathBuf, ConfigFile)> {
    let root = utils::canonicalize(dir)
        .await
        .context("The ledger-quest home directory is missing. Did you run 'ledger-quest init'?")?;
    let config_path = root.join(CONFIG_JSON);
    if !config_path.is_file() {
        bail!("The config file is missing '{}'", config_path.display())
    }
    let config_file = ConfigFile::load(&config_path).await?;
    Ok((root, config_path, config_file))
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "ledger-quest",
///   "config_version": 1,
///   "default_username": "Pengguna",
///   "progression": {
///     "income_rate": "0.0002",
///     "expense_rate": "0.0001",
///     "level_cap": 200,
///     "delta_at_cap": "zero",
///     "level_up": "stepwise"
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "ledger-quest"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// The username used until the user renames themselves
    #[serde(default = "default_username")]
    default_username: String,

    /// Experience rates, the level cap and the levelling rules
    #[serde(default)]
    progression: ProgressionPolicy,
}

fn default_username() -> String {
    DEFAULT_USERNAME.to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            default_username: default_username(),
            progression: ProgressionPolicy::default(),
        }
    }
}

impl ConfigFile {
    /// Loads and validates a ConfigFile from the specified path.
    async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path)
            .await
            .with_context(|| format!("Failed to load config file at {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: impl AsRef<Path>) -> Res<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    fn validate(&self) -> Res<()> {
        ensure!(
            self.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            self.app_name
        );
        ensure!(
            self.config_version <= CONFIG_VERSION,
            "The config file version {} is newer than this program supports ({})",
            self.config_version,
            CONFIG_VERSION
        );
        ensure!(
            !self.default_username.trim().is_empty(),
            "default_username must not be empty"
        );
        let policy = &self.progression;
        ensure!(
            policy.income_rate() >= Decimal::ZERO,
            "progression.income_rate must not be negative, got {}",
            policy.income_rate()
        );
        ensure!(
            policy.expense_rate() >= Decimal::ZERO,
            "progression.expense_rate must not be negative, got {}",
            policy.expense_rate()
        );
        Ok(())
    }
}
