//! Unified error handling for the crier crate
//!
//! Runtime failures are deliberately rare: selection exhaustion is a
//! silent skip, malformed markup degrades to plain text, and configuration
//! problems are absorbed with defaults wherever one exists. What remains
//! is the unrecoverable slice surfaced here.

use thiserror::Error;

pub use crate::config::ConfigError;

/// Result type alias using the unified [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for engine operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Catalog configuration was rejected outright.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Operation referenced a catalog the engine does not manage.
    #[error("unknown catalog '{0}'")]
    UnknownCatalog(String),
}
