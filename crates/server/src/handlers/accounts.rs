//! Account registration and login handlers.

use crate::auth::{derive_password_digest, generate_salt, issue_token, verify_password};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use shelf_metadata::models::UserRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

/// Registration response body.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub username: String,
}

/// Handle POST /v1/register.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let username = req.username.trim();
    if username.is_empty() {
        return Err(ApiError::BadRequest("username must not be empty".to_string()));
    }
    if req.password.is_empty() {
        return Err(ApiError::BadRequest("password must not be empty".to_string()));
    }

    let salt = generate_salt();
    let digest = derive_password_digest(&req.password, &salt)?;

    let user = UserRow {
        user_id: Uuid::new_v4(),
        username: username.to_string(),
        password_hash: digest,
        password_salt: salt,
        created_at: OffsetDateTime::now_utc(),
    };
    state.metadata.create_user(&user).await?;

    tracing::info!(user_id = %user.user_id, username = %user.username, "account registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: user.user_id,
            username: user.username,
        }),
    ))
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Issued access token.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Token lifetime in seconds.
    pub expires_in: u64,
}

/// Handle POST /v1/auth.
///
/// Unknown usernames and wrong passwords produce the same response, so the
/// endpoint cannot be used to probe which accounts exist.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let invalid = || ApiError::Unauthorized("invalid username or password".to_string());

    let user = state
        .metadata
        .get_user_by_username(&req.username)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&req.password, &user.password_salt, &user.password_hash)? {
        return Err(invalid());
    }

    let access_token = issue_token(user.user_id, &state.config.auth)?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        expires_in: state.config.auth.token_expire_minutes * 60,
    }))
}
