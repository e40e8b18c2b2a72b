//! Core domain types and shared logic for the shelf file storage service.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Logical path validation and target resolution
//! - User shard-prefix derivation
//! - Id-or-path file references
//! - Configuration types

pub mod config;
pub mod error;
pub mod path;
pub mod reference;

pub use error::{Error, Result};
pub use path::{PathTarget, shard_prefix, tail_components};
pub use reference::FileReference;
