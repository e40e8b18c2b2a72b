//! Storage error types.

use thiserror::Error;

/// Reason a placement pre-flight check failed.
///
/// The three reasons are checked in order; each maps to a distinct
/// user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementConflict {
    /// A regular file already exists at the resolved path.
    FileExists,
    /// A directory already exists at the resolved path.
    DirectoryExists,
    /// The parent of the resolved path exists and is a regular file.
    ParentIsFile,
}

impl std::fmt::Display for PlacementConflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            Self::FileExists => "file already exists at this path",
            Self::DirectoryExists => "path names an existing directory",
            Self::ParentIsFile => {
                "an intermediate path segment is an existing file, cannot create a directory there"
            }
        };
        f.write_str(reason)
    }
}

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("placement conflict: {0}")]
    Conflict(PlacementConflict),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid path: {0}")]
    Path(#[from] shelf_core::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
