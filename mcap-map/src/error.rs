//! Error types for mcap-map
//!
//! Module-specific error types using thiserror. The reconciler itself never
//! returns these to its callers; they come out of surface backends, location
//! providers and validators.

use thiserror::Error;

/// Main error type for mcap-map
#[derive(Error, Debug)]
pub enum Error {
    /// The platform cannot host an embedded map surface
    #[error("Map surface unavailable: {0}")]
    SurfaceUnavailable(String),

    /// A surface backend rejected a marker or viewport call
    #[error("Map surface error: {0}")]
    Surface(String),

    /// The location provider was not allowed to read the device position
    #[error("Location permission denied: {0}")]
    PermissionDenied(String),

    /// An input record cannot be placed on the map
    #[error("Malformed record '{id}': {reason}")]
    MalformedRecord { id: String, reason: String },

    /// Upload form field failed validation
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Shared library error (config, catalog, parsing)
    #[error(transparent)]
    Common(#[from] mcap_common::Error),
}

/// Convenience Result type using mcap-map Error
pub type Result<T> = std::result::Result<T, Error>;
