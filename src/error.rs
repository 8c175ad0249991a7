//! Error types for cargo-inject.
//!
//! All operations return `Result<T>` which aliases `Result<T, InjectError>`.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from inject operations.
///
/// A manifest that could not receive every directive line is not an error:
/// that outcome is carried by [`RewriteReport`](crate::ops::RewriteReport)
/// and reported as a warning.
#[derive(Debug, Error)]
pub enum InjectError {
    /// The directory holding the crates does not exist.
    ///
    /// Not a failure for the command: the run stops before touching any file.
    #[error("{} does not exist", .0.display())]
    MissingBaseDirectory(PathBuf),

    /// No preset, dependency line or directive file was given.
    #[error("No directive given: pass a preset, --dependency or --directive")]
    NoDirective,

    /// The directive lines are unusable.
    #[error("Invalid directive: {0}")]
    InvalidDirective(String),

    /// Rollback failed after commit error.
    #[error("Rollback failed: {0}")]
    RollbackFailed(String),

    /// File system operation failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// TOML parse error in a directive file.
    #[error("TOML error: {0}")]
    Toml(#[from] toml_edit::TomlError),

    /// Regex compilation failed (indicates bug).
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// Unexpected error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for cargo-inject operations.
pub type Result<T> = std::result::Result<T, InjectError>;
