//! Error types for the record view facade.

use thiserror::Error;

/// Errors raised by identity resolution and field lookup.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The constructor or wrap target is not a supported input.
    #[error("Can not build a facade from {0}")]
    Unsupported(String),

    /// No projection exists for the identifier in its owning catalog.
    #[error("No results found for UID '{0}'")]
    NotFound(String),

    /// The owning catalog returned more than one projection for one
    /// identifier, which violates identifier uniqueness.
    #[error("Found {count} projections for UID '{uid}'")]
    Ambiguous { uid: String, count: usize },

    /// Indexed access (`at`) missed on a key that `get` would default.
    #[error("Key not found: '{0}'")]
    KeyMissing(String),

    /// Invalid logging or embedding configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}
