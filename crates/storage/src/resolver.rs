//! Sharded path resolution.

use crate::error::StorageResult;
use shelf_core::path::{resolve_target, tail_components, validate_tail};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A resolved physical placement for one request.
///
/// Owned transiently by a single request; never cached or shared.
#[derive(Debug, Clone)]
pub struct ResolvedPath {
    physical: PathBuf,
    tail: String,
    file_name: String,
}

impl ResolvedPath {
    /// Absolute physical filesystem path.
    pub fn physical(&self) -> &Path {
        &self.physical
    }

    /// Logical path tail to persist in the metadata record.
    pub fn tail(&self) -> &str {
        &self.tail
    }

    /// Name the file is stored under.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

/// Maps logical paths to physical locations under a configured storage root.
///
/// Pure: resolution never touches the filesystem. The sharding strategy is
/// fixed (UUID prefix slices); swap this type out if rebalancing is ever
/// needed.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// Create a resolver rooted at the given storage directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The configured storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Physical root of a user's private tree: `root / shard_prefix(user)`.
    pub fn user_root(&self, user_id: Uuid) -> PathBuf {
        self.root.join(shelf_core::path::shard_prefix(user_id))
    }

    /// Resolve an upload target.
    ///
    /// Applies the directory-form / file-form rules to the logical path and
    /// the uploaded file's own name, then places the tail under the user's
    /// shard root. Fails with an invalid-path error before any filesystem
    /// work can happen.
    pub fn resolve_upload(
        &self,
        user_id: Uuid,
        logical_path: &str,
        uploaded_name: &str,
    ) -> StorageResult<ResolvedPath> {
        let target = resolve_target(logical_path, uploaded_name)?;
        let physical = self.join_tail(user_id, &target.tail);
        Ok(ResolvedPath {
            physical,
            tail: target.tail,
            file_name: target.file_name,
        })
    }

    /// Resolve a stored tail (as persisted in a metadata record) back to its
    /// physical path within the caller's shard.
    ///
    /// The owner id always comes from the authenticated caller, never from
    /// the reference string, so one user can never address another's shard.
    pub fn resolve_tail(&self, user_id: Uuid, tail: &str) -> StorageResult<PathBuf> {
        validate_tail(tail)?;
        Ok(self.join_tail(user_id, tail))
    }

    fn join_tail(&self, user_id: Uuid, tail: &str) -> PathBuf {
        let mut path = self.user_root(user_id);
        for segment in tail_components(tail) {
            path.push(segment);
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> PathResolver {
        PathResolver::new("/srv/shelf")
    }

    #[test]
    fn user_root_is_sharded() {
        let id = Uuid::try_parse("a1b2c3d4-0000-4000-8000-000000000abc").unwrap();
        assert_eq!(
            resolver().user_root(id),
            PathBuf::from("/srv/shelf/a1/b2/c3d4-0000-4000-8000-000000000abc")
        );
    }

    #[test]
    fn upload_resolution_places_tail_under_user_root() {
        let id = Uuid::new_v4();
        let resolved = resolver().resolve_upload(id, "/docs/", "report.txt").unwrap();
        assert_eq!(resolved.tail(), "/docs/report.txt");
        assert_eq!(resolved.file_name(), "report.txt");
        assert_eq!(
            resolved.physical(),
            resolver().user_root(id).join("docs/report.txt")
        );
    }

    #[test]
    fn file_form_keeps_tail_unchanged() {
        let id = Uuid::new_v4();
        let resolved = resolver()
            .resolve_upload(id, "/docs/report.txt", "upload.bin")
            .unwrap();
        assert_eq!(resolved.tail(), "/docs/report.txt");
        assert_eq!(resolved.file_name(), "report.txt");
    }

    #[test]
    fn resolution_is_deterministic() {
        let id = Uuid::new_v4();
        let a = resolver().resolve_upload(id, "/a/b.txt", "x").unwrap();
        let b = resolver().resolve_upload(id, "/a/b.txt", "y").unwrap();
        assert_eq!(a.physical(), b.physical());
    }

    #[test]
    fn invalid_logical_path_rejected() {
        let id = Uuid::new_v4();
        assert!(resolver().resolve_upload(id, "docs/x", "f").is_err());
        assert!(resolver().resolve_upload(id, "/docs/../x", "f").is_err());
    }

    #[test]
    fn stored_tail_with_traversal_rejected() {
        let id = Uuid::new_v4();
        assert!(resolver().resolve_tail(id, "/../escape").is_err());
    }
}
