//! Preference Observation Error Hierarchy
//!
//! Defines the error types surfaced by the observation engine, categorized by
//! the boundary they cross: caller arguments, the namespace isolation filter,
//! value normalization, session lifecycle and the external store.

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or malformed key / method argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Key is outside the configured namespace
    #[error("Access denied for key '{key}'")]
    AccessDenied { key: String },

    /// A single value could not be represented as a `PreferenceValue`.
    /// Never fatal: the key is dropped from the event batch.
    #[error("Value for key '{key}' cannot be represented and was skipped")]
    SerializationSkipped { key: String },

    /// The initial full read (or listener registration) during `start` failed
    #[error("Observation session failed to start: {reason}")]
    InitializationFailed { reason: String },

    /// The external store itself failed
    #[error(transparent)]
    NativeStore(#[from] StoreError),

    /// Unknown method requested through method dispatch
    #[error("Method not implemented: {0}")]
    NotImplemented(String),

    /// Configuration loading failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Configuration validation failures
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Point read failure
    #[error("Failed to read key '{key}' from native store: {reason}")]
    Read { key: String, reason: String },

    /// Full snapshot read failure
    #[error("Failed to read native store contents: {0}")]
    ReadAll(String),

    /// Listener registration failure
    #[error("Failed to register native store listener: {0}")]
    Subscribe(String),

    /// Store is detached or otherwise unusable
    #[error("Native store unavailable: {0}")]
    Unavailable(String),
}

impl Error {
    /// Stable error code used when the error crosses a method/event channel.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidArgument(_) => "INVALID_ARGUMENT",
            Error::AccessDenied { .. } => "ACCESS_DENIED",
            Error::SerializationSkipped { .. } => "SERIALIZATION_SKIPPED",
            Error::InitializationFailed { .. } => "INITIALIZATION_FAILED",
            Error::NativeStore(_) => "NATIVE_ERROR",
            Error::NotImplemented(_) => "NOT_IMPLEMENTED",
            Error::Config(_) | Error::InvalidConfig(_) => "CONFIG_ERROR",
        }
    }

    pub(crate) fn initialization(source: &Error) -> Self {
        Error::InitializationFailed {
            reason: source.to_string(),
        }
    }

    pub fn is_access_denied(&self) -> bool {
        matches!(self, Error::AccessDenied { .. })
    }
}
