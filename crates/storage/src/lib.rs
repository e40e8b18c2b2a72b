//! Path-addressing and storage placement for shelf.
//!
//! This crate maps a user-supplied logical path to a physical on-disk
//! location, sharded by user identity, and provides:
//! - Sharded path resolution with root-escape protection
//! - Pre-flight placement conflict checks
//! - Streaming writes of uploaded payloads
//! - Streaming reads for single-file downloads
//! - In-memory archive assembly (tar+gzip, zip+deflate) for bulk download

pub mod archive;
pub mod error;
pub mod guard;
pub mod reader;
pub mod resolver;
pub mod writer;

pub use archive::{ArchiveBundle, ArchiveScheme};
pub use error::{PlacementConflict, StorageError, StorageResult};
pub use resolver::{PathResolver, ResolvedPath};
pub use writer::WriteReceipt;

use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

/// Byte stream type used for uploads and downloads.
pub type ByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;
