//! HTTP API server for shelf.
//!
//! This crate provides the HTTP surface over the storage placement core:
//! - Account registration and token-based authentication
//! - Streaming file upload with path addressing
//! - Single-file and archive download
//! - File listing and service health

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use auth::AuthenticatedUser;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
