//! Pre-flight placement conflict checks.

use crate::error::{PlacementConflict, StorageError, StorageResult};
use std::path::Path;
use tokio::fs;

/// Check that writing to `path` would not overwrite a file or corrupt the
/// directory tree.
///
/// Three checks, in order, first match wins:
/// 1. a regular file already exists at the path;
/// 2. a directory already exists at the path;
/// 3. the parent exists and is itself a regular file.
///
/// The check is advisory: it performs no mutation, and a concurrent write
/// between check and open is resolved by the filesystem (last writer wins).
pub async fn check_placement(path: &Path) -> StorageResult<()> {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_file() => {
            return Err(StorageError::Conflict(PlacementConflict::FileExists));
        }
        Ok(meta) if meta.is_dir() => {
            return Err(StorageError::Conflict(PlacementConflict::DirectoryExists));
        }
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(StorageError::Io(e)),
    }

    if let Some(parent) = path.parent() {
        match fs::metadata(parent).await {
            Ok(meta) if meta.is_file() => {
                return Err(StorageError::Conflict(PlacementConflict::ParentIsFile));
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(StorageError::Io(e)),
        }
    }

    Ok(())
}
