//! Core error definitions for the Keepsake session middleware.
//!
//! Every Keepsake crate reports failures through [`KeepsakeError`], so the
//! session orchestrator, the storage backends and the axum wiring agree on
//! which conditions are recoverable and which propagate to the caller.
//!
//! # Main types
//!
//! - [`KeepsakeError`] — Unified error enum for all Keepsake subsystems.
//! - [`KeepsakeResult`] — Convenience alias for `Result<T, KeepsakeError>`.

// --- Error types ---

/// Top-level error type for Keepsake.
///
/// A missing cookie or a missing store record is never an error; those are
/// normal session states. Only backend, configuration and encoding failures
/// are represented here.
#[derive(Debug, thiserror::Error)]
pub enum KeepsakeError {
    /// A storage backend failed (connection loss, timeout, protocol error).
    #[error("Backend error: {0}")]
    Backend(String),

    /// Invalid configuration, detected before any request is served.
    #[error("Config error: {0}")]
    Config(String),

    /// The session handle was not attached to the request.
    #[error("Session error: {0}")]
    Session(String),

    /// A JSON serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A TOML configuration file could not be parsed.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl KeepsakeError {
    /// Returns true for failures raised by a storage backend.
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Backend(_) | Self::Io(_))
    }
}

/// A convenience `Result` alias using [`KeepsakeError`].
pub type KeepsakeResult<T> = Result<T, KeepsakeError>;
