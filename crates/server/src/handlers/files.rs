//! File upload, download and listing handlers.

use crate::auth::AuthenticatedUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::{Extension, Json};
use axum::body::Body;
use axum::extract::{Multipart, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use shelf_core::FileReference;
use shelf_metadata::models::FileRow;
use shelf_storage::{ArchiveScheme, archive, reader, writer};
use time::OffsetDateTime;
use uuid::Uuid;

/// One stored file, as reported to clients.
#[derive(Debug, Serialize)]
pub struct FileInfo {
    /// Record id, serialized as `id` on the wire.
    #[serde(rename = "id")]
    pub file_id: Uuid,
    pub name: String,
    pub path: String,
    pub size: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<FileRow> for FileInfo {
    fn from(row: FileRow) -> Self {
        Self {
            file_id: row.file_id,
            name: row.name,
            path: row.path,
            size: row.size,
            created_at: row.created_at,
        }
    }
}

/// File listing response.
#[derive(Debug, Serialize)]
pub struct FileListResponse {
    pub account_id: Uuid,
    pub files: Vec<FileInfo>,
}

/// Handle GET /v1/files.
pub async fn list_files(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<Json<FileListResponse>> {
    let rows = state.metadata.list_files(user.user_id).await?;
    Ok(Json(FileListResponse {
        account_id: user.user_id,
        files: rows.into_iter().map(FileInfo::from).collect(),
    }))
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::BadRequest(format!("malformed multipart body: {e}"))
}

/// Handle POST /v1/files/upload.
///
/// Expects a multipart body with a `path` text field followed by a `file`
/// field. The ordering is required: the logical path must be resolved and the
/// placement checked before the payload starts streaming to disk, and the
/// payload is never buffered.
pub async fn upload_file(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<FileInfo>)> {
    let field = multipart
        .next_field()
        .await
        .map_err(multipart_error)?
        .ok_or_else(|| ApiError::BadRequest("empty multipart body".to_string()))?;
    if field.name() != Some("path") {
        return Err(ApiError::BadRequest(
            "first multipart field must be 'path'".to_string(),
        ));
    }
    let logical_path = field.text().await.map_err(multipart_error)?;

    let field = multipart
        .next_field()
        .await
        .map_err(multipart_error)?
        .ok_or_else(|| ApiError::BadRequest("missing 'file' field".to_string()))?;
    if field.name() != Some("file") {
        return Err(ApiError::BadRequest(
            "second multipart field must be 'file'".to_string(),
        ));
    }
    let uploaded_name = field
        .file_name()
        .ok_or_else(|| ApiError::BadRequest("'file' field must carry a file name".to_string()))?
        .to_string();

    let resolved = state
        .resolver
        .resolve_upload(user.user_id, &logical_path, &uploaded_name)?;

    // Parts may carry their own Content-Length; it is a hint only, the byte
    // count on disk is authoritative.
    let declared_size = field
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    let stream = Box::pin(field.map(|chunk| chunk.map_err(std::io::Error::other)));
    let receipt = writer::write(&resolved, stream, declared_size).await?;

    let row = FileRow {
        file_id: Uuid::new_v4(),
        owner_id: user.user_id,
        name: resolved.file_name().to_string(),
        path: resolved.tail().to_string(),
        size: i64::try_from(receipt.size)
            .map_err(|_| ApiError::Internal("file size exceeds record range".to_string()))?,
        created_at: receipt.created_at,
    };
    state.metadata.insert_file(&row).await?;

    tracing::info!(
        user_id = %user.user_id,
        file_id = %row.file_id,
        path = %row.path,
        size = row.size,
        "file stored"
    );

    Ok((StatusCode::CREATED, Json(FileInfo::from(row))))
}

/// Query parameters for GET /v1/files/download.
#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    /// File reference: a v4 UUID or a logical path.
    pub path: String,
    /// Optional archive scheme ("tar" or "zip").
    pub compression: Option<String>,
}

/// Handle GET /v1/files/download.
///
/// The reference resolves strictly within the caller's shard: a well-formed
/// id owned by someone else is indistinguishable from one that does not
/// exist.
pub async fn download_file(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<DownloadQuery>,
) -> ApiResult<Response> {
    let scheme = match query.compression.as_deref() {
        None => None,
        Some(raw) => Some(ArchiveScheme::parse(raw).ok_or_else(|| {
            ApiError::BadRequest(format!("unknown compression scheme: {raw}"))
        })?),
    };

    let (physical, download_name) = match FileReference::parse(&query.path) {
        FileReference::ById(file_id) => {
            let record = state
                .metadata
                .get_file(user.user_id, file_id)
                .await?
                .ok_or_else(|| ApiError::NotFound(format!("no file with id {file_id}")))?;
            let physical = state.resolver.resolve_tail(user.user_id, &record.path)?;
            (physical, record.name)
        }
        FileReference::ByPath(path) => {
            match state.metadata.get_file_by_path(user.user_id, &path).await? {
                Some(record) => {
                    let physical = state.resolver.resolve_tail(user.user_id, &record.path)?;
                    (physical, record.name)
                }
                // Directories have no record of their own, so a record-less
                // path may still name a stored directory. That fallback only
                // applies to archive downloads; a plain download always needs
                // a record, which keeps orphan partial files unservable.
                None if scheme.is_some() => {
                    let physical = state.resolver.resolve_tail(user.user_id, &path)?;
                    let name = path
                        .trim_end_matches('/')
                        .rsplit('/')
                        .next()
                        .filter(|s| !s.is_empty())
                        .unwrap_or("files")
                        .to_string();
                    (physical, name)
                }
                None => {
                    return Err(ApiError::NotFound(format!("no file at {path}")));
                }
            }
        }
    };

    match scheme {
        Some(scheme) => {
            let user_root = state.resolver.user_root(user.user_id);
            let bundle = archive::build(&user_root, &physical, scheme).await?;
            let suffix = match scheme {
                ArchiveScheme::Tar => "tar.gz",
                ArchiveScheme::Zip => "zip",
            };
            let headers = [
                (header::CONTENT_TYPE, bundle.media_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{download_name}.{suffix}\""),
                ),
            ];
            Ok((headers, bundle.data).into_response())
        }
        None => {
            let (stream, size) = reader::open_stream(&physical).await?;
            let headers = [
                (
                    header::CONTENT_TYPE,
                    "application/octet-stream".to_string(),
                ),
                (header::CONTENT_LENGTH, size.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{download_name}\""),
                ),
            ];
            Ok((headers, Body::from_stream(stream)).into_response())
        }
    }
}
