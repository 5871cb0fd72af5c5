//! A personal finance ledger with savings targets and experience-based progression.
//!
//! The core is [`Session`], which owns the user's ledger, progression, savings target and name,
//! and persists them through a [`store::KeyValueStore`] after every change.

pub mod args;
pub mod commands;
mod config;
mod db;
mod error;
pub mod ledger;
pub mod model;
pub mod persistence;
pub mod progression;
pub mod session;
pub mod store;
mod utils;


pub use config::{Config, DEFAULT_USERNAME};
pub use error::{Error, ErrorType, Result};
pub use session::{Session, SessionState, Summary};
