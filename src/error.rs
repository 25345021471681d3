//! Crate-wide error type.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A caller-supplied value is outside its allowed domain (quality rating,
    /// scheduler tunable).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The config file exists but could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Card not found: {0}")]
    CardNotFound(i64),

    /// A thread panicked while holding the store lock.
    #[error("State store unavailable")]
    StoreUnavailable,
}
