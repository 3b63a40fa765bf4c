//! Error types for the verifier and its collaborators.
//!
//! Defects found on the device are never errors: they are recorded on the
//! [`crate::ValidationVerdict`]. The enums here cover the boundaries where
//! something outside the verdict model went wrong.

use thiserror::Error;

/// Result type alias for collaborator calls.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type alias for verifier runs.
pub type VerifierResult<T> = Result<T, VerifierError>;

/// Errors raised by a collaborator transport (control API or management session).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The collaborator could not be reached at all.
    #[error("{target} unavailable: {message}")]
    Unavailable {
        /// Controller or node the call was addressed to.
        target: String,
        /// Underlying transport message.
        message: String,
    },

    /// The collaborator answered with an unexpected status.
    #[error("unexpected status {status} from {target}")]
    Status {
        /// Resource or operation the call was addressed to.
        target: String,
        /// Status code returned.
        status: u16,
    },

    /// The response body could not be decoded.
    #[error("malformed response from {target}: {message}")]
    Malformed {
        /// Resource or operation the call was addressed to.
        target: String,
        /// Decoder message.
        message: String,
    },
}

impl TransportError {
    pub fn unavailable(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            target: target.into(),
            message: message.into(),
        }
    }

    pub fn status(target: impl Into<String>, status: u16) -> Self {
        Self::Status {
            target: target.into(),
            status,
        }
    }

    pub fn malformed(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Returns true if the collaborator is unreachable, as opposed to
    /// having answered badly.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, TransportError::Unavailable { .. })
    }
}

/// Errors loading or validating the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be parsed.
    #[error("failed to parse config file {path}: {message}")]
    Parse {
        /// Path of the configuration file.
        path: String,
        /// Parser message.
        message: String,
    },

    /// A field holds a value outside its valid range.
    #[error("invalid configuration for {field}: {message}")]
    Invalid {
        /// Offending field.
        field: String,
        /// Error message.
        message: String,
    },

    /// The configuration could not be serialized.
    #[error("failed to serialize config: {0}")]
    Serialize(String),

    /// IO error reading or writing the file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Fatal errors that abort a lifecycle run.
#[derive(Debug, Error)]
pub enum VerifierError {
    /// The control API became unreachable during a run.
    #[error("control API unavailable during {operation}: {source}")]
    ControlUnavailable {
        /// Operation that was being invoked.
        operation: String,
        /// Transport failure.
        #[source]
        source: TransportError,
    },
}

impl VerifierError {
    pub fn control_unavailable(operation: impl Into<String>, source: TransportError) -> Self {
        Self::ControlUnavailable {
            operation: operation.into(),
            source,
        }
    }
}
