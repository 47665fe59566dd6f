//! Error taxonomy for the acquisition engine.
//!
//! Library code returns [`EngineError`] so callers can distinguish the
//! cases that matter to them: a cancelled install is not a network failure,
//! and a missing unit inside a valid payload is not a missing module.
//! The CLI boundary converts into `anyhow` with context.

use thiserror::Error;

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Every failure the engine surfaces to callers.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The module id is not in the catalog (or is a reserved key).
    #[error("unknown module: {0}")]
    UnknownModule(String),

    /// No tier — memory, persistent, or bundled — could produce the module.
    #[error("module unavailable: {0}")]
    ModuleUnavailable(String),

    /// The payload exists and is valid, but the requested unit path is not in it.
    #[error("unit not found in {module}: {path}")]
    UnitNotFound { module: String, path: String },

    /// The operation was cancelled by the caller.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// An install reached a failed terminal state (also what joiners of a
    /// shared in-flight install observe).
    #[error("install failed for {module}: {reason}")]
    InstallFailed { module: String, reason: String },

    /// No persistent tier is available on this host.
    #[error("no persistent storage tier available")]
    StorageUnavailable,

    /// The module's remote source rejected the connectivity check.
    #[error("source unavailable for {module}: {reason}")]
    SourceUnavailable { module: String, reason: String },

    /// A network request failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The embedded store failed.
    #[error("embedded store error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A filesystem operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A payload or manifest could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl EngineError {
    /// True when this error is the distinguished cancellation cause.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, EngineError::Cancelled(_))
    }
}
