//! Database models mapping to the metadata schema.

use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User account record.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub user_id: Uuid,
    pub username: String,
    /// Hex-encoded credential digest.
    pub password_hash: String,
    /// Hex-encoded per-user salt the digest was derived with.
    pub password_salt: String,
    pub created_at: OffsetDateTime,
}

/// File record, created once after a successful filesystem write and
/// immutable thereafter.
#[derive(Debug, Clone, FromRow)]
pub struct FileRow {
    pub file_id: Uuid,
    pub owner_id: Uuid,
    /// Original file name.
    pub name: String,
    /// Logical path tail as stored, unique per owner (not globally - two
    /// users may own identically named paths).
    pub path: String,
    pub size: i64,
    pub created_at: OffsetDateTime,
}
