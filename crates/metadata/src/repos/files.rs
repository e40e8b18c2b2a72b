//! File record repository.
//!
//! Every lookup is scoped to an owner id. The owner always comes from the
//! authenticated caller, which is what keeps one user's references from ever
//! resolving into another user's records.

use crate::error::MetadataResult;
use crate::models::FileRow;
use async_trait::async_trait;
use uuid::Uuid;

/// Repository for file record operations.
#[async_trait]
pub trait FileRepo: Send + Sync {
    /// Insert a file record. Fails with `AlreadyExists` if the owner already
    /// has a record at the same logical path.
    async fn insert_file(&self, file: &FileRow) -> MetadataResult<()>;

    /// Get a file record by id, within the owner's scope.
    async fn get_file(&self, owner_id: Uuid, file_id: Uuid) -> MetadataResult<Option<FileRow>>;

    /// Get a file record by exact logical path, within the owner's scope.
    async fn get_file_by_path(
        &self,
        owner_id: Uuid,
        path: &str,
    ) -> MetadataResult<Option<FileRow>>;

    /// List all file records owned by a user.
    async fn list_files(&self, owner_id: Uuid) -> MetadataResult<Vec<FileRow>>;
}
