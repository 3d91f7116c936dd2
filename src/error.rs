//! Error types for preserve-ref.

use thiserror::Error;

/// Failures surfaced by [`PreserveReference::apply`](crate::PreserveReference::apply)
/// and the layers beneath it.
///
/// Every variant is raised before any cache slot is written, so a failed
/// call leaves the instance exactly as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The value is callable. Functions have no reproducible content and
    /// are distinct by identity on nearly every call.
    #[error("You can't call `PreserveReference` with functions.")]
    UnsupportedType,

    /// The content hasher could not digest the value.
    #[error("Hash error: {0}")]
    Hash(String),

    /// A configuration value could not be interpreted.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for preserve-ref operations.
pub type Result<T> = std::result::Result<T, Error>;
