//! Common error types for Voxify

use thiserror::Error;

/// Common result type for Voxify operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Voxify crates
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
