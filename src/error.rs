//! Error types for the public interface of the crate.
//!
//! Internally, modules use `anyhow` through the `Res` alias. Anything that crosses the public
//! boundary is converted to an `Error`, which carries an `ErrorType` so that callers can tell a
//! rejected input apart from a failed write.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

/// The internal result type.
pub(crate) type Res<T> = anyhow::Result<T>;

/// The public result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies an `Error`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// Malformed or out-of-range input to a mutating operation. Nothing was changed.
    Validation,
    /// A deletion referenced a transaction that does not exist. Nothing was changed.
    Index,
    /// The key-value store could not be read or written. The in-memory state is still valid for
    /// the current session but the change may not survive a reload.
    Persistence,
    /// The home directory or its configuration file is missing or invalid.
    Config,
    /// The SQLite database could not be opened or migrated.
    Database,
}

serde_plain::derive_display_from_serialize!(ErrorType);
serde_plain::derive_fromstr_from_deserialize!(ErrorType);

/// The public error type.
pub struct Error {
    error_type: ErrorType,
    inner: anyhow::Error,
}

impl Error {
    pub(crate) fn new(error_type: ErrorType, inner: impl Into<anyhow::Error>) -> Self {
        Self {
            error_type,
            inner: inner.into(),
        }
    }

    /// Creates an error from a message.
    pub(crate) fn msg<M>(error_type: ErrorType, message: M) -> Self
    where
        M: Display + Debug + Send + Sync + 'static,
    {
        Self::new(error_type, anyhow::Error::msg(message))
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    pub fn is_validation(&self) -> bool {
        self.error_type == ErrorType::Validation
    }

    pub fn is_index(&self) -> bool {
        self.error_type == ErrorType::Index
    }

    pub fn is_persistence(&self) -> bool {
        self.error_type == ErrorType::Persistence
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {:?}", self.error_type, self.inner)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#}", self.inner)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

/// Converts an internal `Res` into a public `Result` by tagging the error with an `ErrorType`.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T> IntoResult<T> for Res<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| Error::new(error_type, e))
    }
}

/// Returns early with a public `Error` of the given type, formatted like `anyhow::bail!`.
macro_rules! pub_bail {
    ($error_type:expr, $($arg:tt)*) => {
        return Err($crate::error::Error::msg($error_type, format!($($arg)*)))
    };
}

pub(crate) use pub_bail;
