//! Error types for the heatmon system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for heatmon operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the heatmon system
#[derive(Error, Debug)]
pub enum Error {
    /// Cannot establish a backend session. Fatal at device init and
    /// during pairing; surfaced to the host.
    #[error("connection error: {0}")]
    Connection(String),

    /// Credentials rejected or malformed. Reported distinctly during
    /// pairing.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// A device with the same identity is already registered
    /// (pairing-time only).
    #[error("device already registered: {0}")]
    DuplicateDevice(String),

    /// A single capability read failed. Isolated to that capability,
    /// never fatal to the cycle.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Malformed or out-of-range time-series data. Isolated, non-fatal.
    #[error("derivation error: {0}")]
    Derivation(String),

    /// Event delivery failure. Logged, non-fatal.
    #[error("event emit error: {0}")]
    Emit(String),

    /// Device store errors
    #[error("device store error: {0}")]
    Store(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Create a duplicate-device error
    pub fn duplicate_device(msg: impl Into<String>) -> Self {
        Self::DuplicateDevice(msg.into())
    }

    /// Create a fetch error
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Create a derivation error
    pub fn derivation(msg: impl Into<String>) -> Self {
        Self::Derivation(msg.into())
    }

    /// Create an event emit error
    pub fn emit(msg: impl Into<String>) -> Self {
        Self::Emit(msg.into())
    }

    /// Create a device store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
