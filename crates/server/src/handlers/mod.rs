//! HTTP request handlers.

pub mod accounts;
pub mod common;
pub mod files;

pub use accounts::*;
pub use common::*;
pub use files::*;
