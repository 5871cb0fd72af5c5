use crate::commands::Out;
use crate::{Config, Result};
use std::path::Path;

/// Creates the home directory with a default `config.json` and an empty database.
///
/// # Errors
/// - `ErrorType::Config` if the directory or the config file cannot be created, or the directory
///   is already initialized.
/// - `ErrorType::Database` if the database cannot be created.
pub async fn init(home: &Path) -> Result<Out<()>> {
    let config = Config::create(home).await?;
    Ok(format!(
        "Successfully created the ledger-quest directory at {}",
        config.root().display()
    )
    .into())
}
