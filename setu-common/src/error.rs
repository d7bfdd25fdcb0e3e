//! Common error types for Setu

use thiserror::Error;

/// Common result type for Setu operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors shared by every Setu service
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Root folder, TOML file, or environment value unusable
    #[error("Configuration error: {0}")]
    Config(String),

    /// A stored column holds text no enum or timestamp accepts
    #[error("Undecodable stored value: {0}")]
    Decode(String),
}
