//! PostgreSQL metadata store.

use crate::error::{MetadataError, MetadataResult};
use crate::models::{FileRow, UserRow};
use crate::repos::{FileRepo, UserRepo};
use crate::store::MetadataStore;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgPool, Row};
use std::str::FromStr;
use uuid::Uuid;

/// PostgreSQL-based metadata store.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect to a PostgreSQL database and run migrations.
    pub async fn from_url(
        url: &str,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> MetadataResult<Self> {
        let mut opts = PgConnectOptions::from_str(url)
            .map_err(|e| MetadataError::Config(format!("invalid postgres url: {e}")))?;

        if let Some(timeout) = statement_timeout_ms {
            opts = opts.options([("statement_timeout", format!("{timeout}ms"))]);
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        tracing::info!(max_connections, "postgres metadata store ready");

        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for PostgresStore {
    async fn migrate(&self) -> MetadataResult<()> {
        for statement in SCHEMA_STATEMENTS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        let row = sqlx::query("SELECT 1 AS one").fetch_one(&self.pool).await?;
        let _: i32 = row.try_get("one")?;
        Ok(())
    }
}

#[async_trait]
impl UserRepo for PostgresStore {
    async fn create_user(&self, user: &UserRow) -> MetadataResult<()> {
        if self.get_user_by_username(&user.username).await?.is_some() {
            return Err(MetadataError::AlreadyExists(format!(
                "username '{}' already exists",
                user.username
            )));
        }

        sqlx::query(
            "INSERT INTO users (user_id, username, password_hash, password_salt, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user.user_id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.password_salt)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| MetadataError::from_insert(e, "users"))?;
        Ok(())
    }

    async fn get_user(&self, user_id: Uuid) -> MetadataResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_user_by_username(&self, username: &str) -> MetadataResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}

#[async_trait]
impl FileRepo for PostgresStore {
    async fn insert_file(&self, file: &FileRow) -> MetadataResult<()> {
        if self
            .get_file_by_path(file.owner_id, &file.path)
            .await?
            .is_some()
        {
            return Err(MetadataError::AlreadyExists(format!(
                "file record already exists at {}",
                file.path
            )));
        }

        sqlx::query(
            "INSERT INTO files (file_id, owner_id, name, path, size, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(file.file_id)
        .bind(file.owner_id)
        .bind(&file.name)
        .bind(&file.path)
        .bind(file.size)
        .bind(file.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| MetadataError::from_insert(e, "files"))?;
        Ok(())
    }

    async fn get_file(&self, owner_id: Uuid, file_id: Uuid) -> MetadataResult<Option<FileRow>> {
        let row = sqlx::query_as::<_, FileRow>(
            "SELECT * FROM files WHERE owner_id = $1 AND file_id = $2",
        )
        .bind(owner_id)
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_file_by_path(
        &self,
        owner_id: Uuid,
        path: &str,
    ) -> MetadataResult<Option<FileRow>> {
        let row = sqlx::query_as::<_, FileRow>(
            "SELECT * FROM files WHERE owner_id = $1 AND path = $2",
        )
        .bind(owner_id)
        .bind(path)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_files(&self, owner_id: Uuid) -> MetadataResult<Vec<FileRow>> {
        let rows = sqlx::query_as::<_, FileRow>(
            "SELECT * FROM files WHERE owner_id = $1 ORDER BY created_at, path",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

const SCHEMA_STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        user_id UUID PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        password_salt TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_users_username ON users(username)",
    "CREATE TABLE IF NOT EXISTS files (
        file_id UUID PRIMARY KEY,
        owner_id UUID NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        path TEXT NOT NULL,
        size BIGINT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        UNIQUE (owner_id, path)
    )",
    "CREATE INDEX IF NOT EXISTS idx_files_owner ON files(owner_id)",
    "CREATE INDEX IF NOT EXISTS idx_files_owner_path ON files(owner_id, path)",
];
