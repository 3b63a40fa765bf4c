//! Error types for schema registry operations.

use std::io;
use thiserror::Error;

/// Result type alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors raised while building or querying a schema registry.
///
/// Missing attributes in a device tree are not errors; they are recorded as
/// defects in a conformance report.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No checklists are registered for the requested version.
    #[error("Unknown schema version '{version}'")]
    UnknownVersion {
        /// The requested version tag.
        version: String,
    },

    /// A checklist for this version and role already exists.
    #[error("Checklist for role '{role}' already registered for version '{version}'")]
    DuplicateChecklist {
        /// The version tag.
        version: String,
        /// The role name.
        role: String,
    },

    /// A descriptor file could not be parsed.
    #[error("Invalid schema descriptor {path}: {message}")]
    Descriptor {
        /// The descriptor file.
        path: String,
        /// Error message.
        message: String,
    },

    /// IO error while reading a descriptor file.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl RegistryError {
    /// Creates an unknown version error.
    pub fn unknown_version(version: impl Into<String>) -> Self {
        Self::UnknownVersion {
            version: version.into(),
        }
    }

    /// Creates a descriptor parse error.
    pub fn descriptor(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Descriptor {
            path: path.into(),
            message: message.into(),
        }
    }
}
