//! Id-or-path file references.
//!
//! Download endpoints accept either a record id or a logical path in the same
//! parameter. Modeled as an explicit two-variant type so dispatch stays
//! exhaustive rather than a string-parse fallback buried in handlers.

use uuid::Uuid;

/// A client-supplied reference to a stored file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileReference {
    /// A record id in version-4 UUID textual form.
    ById(Uuid),
    /// A logical path, matched exactly against the stored tail.
    ByPath(String),
}

impl FileReference {
    /// Classify a raw reference string.
    ///
    /// Only text that parses as a version-4 UUID is treated as an id;
    /// everything else is a logical path. The reference never carries owner
    /// information - lookups are always scoped to the authenticated caller.
    pub fn parse(raw: &str) -> Self {
        match Uuid::try_parse(raw) {
            Ok(id) if id.get_version_num() == 4 => Self::ById(id),
            _ => Self::ByPath(raw.to_string()),
        }
    }
}

impl std::fmt::Display for FileReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ById(id) => write!(f, "{id}"),
            Self::ByPath(path) => write!(f, "{path}"),
        }
    }
}
