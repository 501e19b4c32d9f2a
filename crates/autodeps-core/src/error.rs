use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutodepsError {
    #[error("Archive unreadable at {path}: {reason}")]
    ArchiveUnreadable { path: PathBuf, reason: String },

    #[error("Can't find location of {reference} (rule {rule})")]
    UnresolvableArchive { reference: String, rule: String },

    #[error("Graph query failed: `{command}`: {stderr}")]
    GraphQueryFailed { command: String, stderr: String },

    #[error("Build of {targets} failed with {status}")]
    BuildFailed { targets: String, status: String },

    #[error("Output query for {reference} returned {count} results, expected exactly one")]
    AmbiguousOutputQuery { reference: String, count: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AutodepsError {
    /// Errors that only invalidate one library's class inventory; the index
    /// build keeps going past them.
    pub fn is_library_local(&self) -> bool {
        matches!(
            self,
            AutodepsError::ArchiveUnreadable { .. } | AutodepsError::UnresolvableArchive { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, AutodepsError>;
