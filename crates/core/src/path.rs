//! Logical path validation and shard-prefix derivation.
//!
//! A logical path is the user-facing virtual path, always starting with `/`
//! and interpreted relative to that user's private root. Physical placement
//! prefixes the path with a shard directory fragment derived from the user id
//! to bound directory fan-out at any single filesystem level.

use crate::error::{Error, Result};
use uuid::Uuid;

/// Resolved upload target: the logical path tail to persist and the name the
/// file is stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTarget {
    /// Logical path tail, e.g. `/docs/report.txt`. This is what the metadata
    /// record stores and what download-by-path matches against.
    pub tail: String,
    /// Final file name component of the tail.
    pub file_name: String,
}

/// Derive the shard prefix for a user id.
///
/// The canonical hyphenated UUID is split into three segments, characters
/// `[0:2]`, `[2:4]` and `[4:]`, joined as path components. The first two
/// levels cap directory fan-out; the remaining suffix keeps the full prefix
/// unique per user. Deterministic: the same id always yields the same prefix.
pub fn shard_prefix(user_id: Uuid) -> String {
    let canonical = user_id.as_hyphenated().to_string();
    format!(
        "{}/{}/{}",
        &canonical[..2],
        &canonical[2..4],
        &canonical[4..]
    )
}

/// Resolve a logical path plus the uploaded file's own name into the stored
/// target.
///
/// Two forms are accepted:
/// - directory form (trailing `/`): the uploaded name is appended verbatim,
///   `tail = logical_path + uploaded_name`;
/// - file form (no trailing `/`): the final segment becomes the stored name,
///   overriding the uploaded one, and the tail is the logical path unchanged.
///
/// Fails with [`Error::InvalidPath`] if the path does not start with `/`, if
/// the resulting file name is empty, or if any segment of the combined tail
/// is `.` or `..` (the tail must never escape the user's root).
pub fn resolve_target(logical_path: &str, uploaded_name: &str) -> Result<PathTarget> {
    if !logical_path.starts_with('/') {
        return Err(Error::InvalidPath(format!(
            "path must start with a slash: {logical_path}"
        )));
    }

    let (tail, file_name) = if logical_path.ends_with('/') {
        (
            format!("{logical_path}{uploaded_name}"),
            uploaded_name.to_string(),
        )
    } else {
        // Leading slash guarantees at least one separator.
        let name = logical_path
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        (logical_path.to_string(), name)
    };

    if file_name.is_empty() {
        return Err(Error::InvalidPath(format!(
            "target file name is empty: {logical_path}"
        )));
    }

    validate_tail(&tail)?;

    Ok(PathTarget { tail, file_name })
}

/// Iterate the non-empty segments of a logical path tail.
///
/// Repeated slashes collapse; the yielded segments are safe to join onto a
/// physical directory once [`validate_tail`] has accepted the tail.
pub fn tail_components(tail: &str) -> impl Iterator<Item = &str> {
    tail.split('/').filter(|segment| !segment.is_empty())
}

/// Reject tails containing `.` or `..` segments.
///
/// The uploaded file name is taken verbatim, so a name like `../escape` would
/// otherwise climb above the user's shard root.
pub fn validate_tail(tail: &str) -> Result<()> {
    for segment in tail_components(tail) {
        if segment == "." || segment == ".." {
            return Err(Error::InvalidPath(format!(
                "unsafe path segment {segment:?} in {tail}"
            )));
        }
    }
    Ok(())
}
