//! Error types for the Surface fan shim

use crate::types::BindState;
use thiserror::Error;

/// Failure of a single round trip to the remote controller
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The remote controller (or its access node) has not been enumerated yet
    #[error("Remote controller not yet enumerated: {0}")]
    NotYetEnumerated(String),

    /// The transaction did not complete in time
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The remote controller rejected the request with an error status
    #[error("Device returned status {0}")]
    Device(i32),

    /// The response did not have the expected shape
    #[error("Malformed response: {0}")]
    Protocol(String),

    /// Host-side I/O failure (open, ioctl, disconnect)
    #[error("I/O error: {0}")]
    Io(String),
}

impl TransportError {
    /// Whether this failure means "retry later" rather than "absent"
    pub fn is_not_yet_enumerated(&self) -> bool {
        matches!(self, TransportError::NotYetEnumerated(_))
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io(err.to_string())
    }
}

/// Fault returned by every fan operation
///
/// Faults are never stored; they are handed back to the caller of the
/// failing operation only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// The remote round trip failed
    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    /// The operation is not available on this hardware
    #[error("Operation not supported: {0}")]
    Unsupported(&'static str),

    /// The controller has been torn down
    #[error("Fan device has been removed")]
    Removed,

    /// The controller is not in the bound state
    #[error("Fan device is not bound (state: {0})")]
    NotReady(BindState),
}

impl Fault {
    /// Whether this is a transport failure flagged "not yet enumerated"
    pub fn is_not_yet_enumerated(&self) -> bool {
        matches!(self, Fault::Transport(e) if e.is_not_yet_enumerated())
    }
}

/// Result type alias for fan operations
pub type Result<T> = std::result::Result<T, Fault>;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for `StaticConfig`
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be serialized
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value is syntactically valid but not acceptable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
