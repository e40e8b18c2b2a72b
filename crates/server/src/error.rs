//! API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use shelf_storage::{PlacementConflict, StorageError};

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("storage error: {0}")]
    Storage(#[from] shelf_storage::StorageError),

    #[error("metadata error: {0}")]
    Metadata(#[from] shelf_metadata::MetadataError),

    #[error("path error: {0}")]
    Path(#[from] shelf_core::Error),
}

impl ApiError {
    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::Unauthorized(_) => "unauthorized",
            Self::Internal(_) => "internal_error",
            Self::Storage(e) => match e {
                StorageError::Conflict(PlacementConflict::FileExists) => "file_exists",
                StorageError::Conflict(PlacementConflict::DirectoryExists) => "directory_exists",
                StorageError::Conflict(PlacementConflict::ParentIsFile) => "parent_is_file",
                StorageError::NotFound(_) => "not_found",
                StorageError::Path(_) => "invalid_path",
                StorageError::Io(_) => "storage_error",
            },
            Self::Metadata(e) => match e {
                shelf_metadata::MetadataError::NotFound(_) => "not_found",
                shelf_metadata::MetadataError::AlreadyExists(_) => "already_exists",
                _ => "metadata_error",
            },
            Self::Path(_) => "invalid_path",
        }
    }

    /// Get the HTTP status code for this error.
    ///
    /// Placement conflicts deliberately map to 400, not 409: the request named
    /// a placement the tree cannot accept, which is a problem with the request.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Storage(e) => match e {
                StorageError::Conflict(_) => StatusCode::BAD_REQUEST,
                StorageError::NotFound(_) => StatusCode::NOT_FOUND,
                StorageError::Path(_) => StatusCode::BAD_REQUEST,
                StorageError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Metadata(e) => match e {
                shelf_metadata::MetadataError::NotFound(_) => StatusCode::NOT_FOUND,
                shelf_metadata::MetadataError::AlreadyExists(_) => StatusCode::CONFLICT,
                shelf_metadata::MetadataError::Constraint(_) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Path(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_conflicts_are_bad_requests() {
        let err = ApiError::from(StorageError::Conflict(PlacementConflict::FileExists));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "file_exists");
    }

    #[test]
    fn invalid_path_is_bad_request() {
        let err = ApiError::from(shelf_core::Error::InvalidPath("no leading slash".into()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "invalid_path");
    }

    #[test]
    fn missing_payload_is_not_found() {
        let err = ApiError::from(StorageError::NotFound("gone".into()));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
