//! Persistence error types.
//!
//! All persistence operations return structured errors that provide
//! user-friendly messages and optional remediation hints.

use std::path::PathBuf;
use thiserror::Error;

/// Persistence operation error.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// File I/O error.
    #[error("failed to {operation} file: {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file content could not be decoded or parsed.
    #[error("malformed level file: {path}")]
    MalformedFile { path: PathBuf, reason: String },

    /// A level directory is missing one of its three documents.
    #[error("level '{level}' has no .{extension} document")]
    MissingDocument { level: String, extension: &'static str },

    /// A level directory with this name already exists.
    #[error("level '{name}' already exists")]
    LevelExists { name: String },

    /// No level directory with this name exists.
    #[error("level '{name}' not found")]
    UnknownLevel { name: String },

    /// Serialization error.
    #[error("failed to serialize level document")]
    Serialization {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Atomic write failed (temp file couldn't be renamed).
    #[error("failed to complete save operation")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The loaded content violated the document model.
    #[error(transparent)]
    Doc(#[from] amy_doc::DocError),
}

impl PersistenceError {
    /// Get a user-friendly message for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::Io {
                operation, path, ..
            } => {
                format!("Could not {} the file at {}", operation, path.display())
            }
            Self::MalformedFile { path, reason } => {
                format!(
                    "The file at {} could not be read: {}",
                    path.display(),
                    reason
                )
            }
            Self::MissingDocument { level, extension } => {
                format!("The level '{level}' is missing its .{extension} document.")
            }
            Self::LevelExists { name } => {
                format!("A level named '{name}' already exists in this game.")
            }
            Self::UnknownLevel { name } => {
                format!("There is no level named '{name}' in this game.")
            }
            Self::Serialization { .. } => {
                "An error occurred while writing the level data.".to_string()
            }
            Self::AtomicWriteFailed { target_path, .. } => {
                format!(
                    "Could not save the file to {}. Please check disk space and permissions.",
                    target_path.display()
                )
            }
            Self::Doc(err) => format!("The level data is inconsistent: {err}"),
        }
    }

    /// Get a suggestion for how to resolve this error.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::Io { operation, .. } => {
                if *operation == "read" {
                    Some("Check that the file exists and you have permission to read it.".into())
                } else {
                    Some("Check that you have permission to write to this location.".into())
                }
            }
            Self::MalformedFile { .. } => Some(
                "The file may be corrupted, or a packed file may carry a plain extension."
                    .into(),
            ),
            Self::MissingDocument { .. } => {
                Some("Restore the file from a backup or recreate the level.".into())
            }
            Self::LevelExists { .. } => Some("Pick a different level name.".into()),
            Self::UnknownLevel { .. } => {
                Some("List the available levels to check the spelling.".into())
            }
            Self::Serialization { .. } => None,
            Self::AtomicWriteFailed { .. } => {
                Some("Free up disk space or try saving to a different location.".into())
            }
            Self::Doc(_) => None,
        }
    }
}

/// Result type alias for persistence operations.
pub type Result<T> = std::result::Result<T, PersistenceError>;
