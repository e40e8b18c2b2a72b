//! Authentication middleware and credential handling.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use hkdf::Hkdf;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use shelf_core::config::AuthConfig;
use time::OffsetDateTime;
use uuid::Uuid;

/// Access token claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the account id.
    pub sub: Uuid,
    /// Expiry as a unix timestamp.
    pub exp: i64,
}

/// Issue a signed access token for an account.
pub fn issue_token(user_id: Uuid, config: &AuthConfig) -> ApiResult<String> {
    let expires_at = OffsetDateTime::now_utc() + config.token_lifetime();
    let claims = Claims {
        sub: user_id,
        exp: expires_at.unix_timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("failed to sign token: {e}")))
}

/// Verify a token signature and expiry, returning the claims.
pub fn verify_token(token: &str, config: &AuthConfig) -> ApiResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthorized("invalid or expired token".to_string()))
}

/// Generate a fresh hex-encoded salt for a new account.
pub fn generate_salt() -> String {
    hex::encode(Uuid::new_v4().as_bytes())
}

/// Derive the stored credential digest from a password and salt.
pub fn derive_password_digest(password: &str, salt: &str) -> ApiResult<String> {
    let hk = Hkdf::<Sha256>::new(Some(salt.as_bytes()), password.as_bytes());
    let mut okm = [0u8; 32];
    hk.expand(b"shelf credential digest", &mut okm)
        .map_err(|e| ApiError::Internal(format!("digest derivation failed: {e}")))?;
    Ok(hex::encode(okm))
}

/// Check a password attempt against a stored digest.
pub fn verify_password(password: &str, salt: &str, stored_digest: &str) -> ApiResult<bool> {
    let derived = derive_password_digest(password, salt)?;
    Ok(derived == stored_digest)
}

/// Authenticated request extension.
#[derive(Clone, Copy, Debug)]
pub struct AuthenticatedUser {
    /// The validated account id.
    pub user_id: Uuid,
}

/// Extract bearer token from Authorization header.
/// Per RFC 6750, the "Bearer" scheme is case-insensitive.
fn extract_bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            if v.len() >= 7 && v[..7].eq_ignore_ascii_case("bearer ") {
                Some(&v[7..])
            } else {
                None
            }
        })
}

/// Authentication middleware that validates tokens and sets the caller id.
///
/// The account id carried into handlers always comes from the verified token,
/// never from the request body or query string.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&req)
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;

    let claims = verify_token(token, &state.config.auth)?;

    // The account must still exist; tokens outlive nothing.
    let user = state
        .metadata
        .get_user(claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("unknown account".to_string()))?;

    req.extensions_mut().insert(AuthenticatedUser {
        user_id: user.user_id,
    });

    Ok(next.run(req).await)
}
