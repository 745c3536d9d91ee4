//! Common error types for Earshot

use thiserror::Error;

/// Common result type for Earshot operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared across Earshot crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed geographic coordinates (NaN, infinite, or out of range)
    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
