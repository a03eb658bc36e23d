use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Main error type for hostprobe
#[derive(Debug, Error)]
pub enum HostProbeError {
    /// A required descriptor source could not be opened or read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A source was opened but its content did not match the expected format
    #[error("Malformed line in {path}: {line:?}")]
    Parse { path: PathBuf, line: String },

    /// A required numeric probe produced an invalid value
    #[error("Probe failed: {what}")]
    Probe { what: String },

    /// A required resource was not found after an exhaustive scan
    #[error("Not found: {what}")]
    NotFound { what: String },

    /// A detected value contradicts a compile-time assumption
    #[error("Detected cache line size {detected} does not match the compiled value {expected}")]
    Consistency { detected: usize, expected: usize },

    /// Invalid configuration, from the OS or from a config file
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl HostProbeError {
    /// Create an I/O error carrying the failing path
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        HostProbeError::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a parse error carrying the offending line
    pub fn parse(path: impl Into<PathBuf>, line: impl Into<String>) -> Self {
        HostProbeError::Parse {
            path: path.into(),
            line: line.into(),
        }
    }

    /// Create a probe error
    pub fn probe(what: impl Into<String>) -> Self {
        HostProbeError::Probe { what: what.into() }
    }

    /// Create a not found error
    pub fn not_found(what: impl Into<String>) -> Self {
        HostProbeError::NotFound { what: what.into() }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        HostProbeError::Config {
            message: message.into(),
        }
    }
}

/// Result type alias for hostprobe operations
pub type Result<T> = std::result::Result<T, HostProbeError>;

impl From<toml::de::Error> for HostProbeError {
    fn from(err: toml::de::Error) -> Self {
        HostProbeError::Config {
            message: err.to_string(),
        }
    }
}
