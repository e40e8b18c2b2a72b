//! Streaming persistence of uploaded payloads.

use crate::error::StorageResult;
use crate::guard::check_placement;
use crate::resolver::ResolvedPath;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use time::OffsetDateTime;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::instrument;

/// Metadata produced by a completed write.
#[derive(Debug, Clone, Copy)]
pub struct WriteReceipt {
    /// Filesystem creation timestamp of the destination.
    pub created_at: OffsetDateTime,
    /// Bytes actually copied to disk.
    pub size: u64,
}

/// Persist an incoming byte stream at the resolved path.
///
/// Runs the placement guard immediately before opening the destination (the
/// two are deliberately one call, not separable steps), creates missing
/// parent directories, and streams chunks without buffering the payload.
///
/// The byte count on disk is authoritative. When the transport layer declared
/// a size and it disagrees, that is logged as a warning, not an error.
///
/// If the request is aborted mid-stream the future is dropped and a partial
/// file remains; the next upload to the same path then hits the guard's
/// "file already exists" conflict.
#[instrument(skip(stream, declared_size), fields(tail = %resolved.tail()))]
pub async fn write<S>(
    resolved: &ResolvedPath,
    mut stream: S,
    declared_size: Option<u64>,
) -> StorageResult<WriteReceipt>
where
    S: Stream<Item = std::io::Result<Bytes>> + Unpin,
{
    check_placement(resolved.physical()).await?;

    if let Some(parent) = resolved.physical().parent() {
        fs::create_dir_all(parent).await?;
    }

    let mut file = fs::File::create(resolved.physical()).await?;
    let mut size: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        size += chunk.len() as u64;
    }
    file.sync_all().await?;

    if let Some(declared) = declared_size
        && declared != size
    {
        tracing::warn!(
            declared,
            written = size,
            tail = %resolved.tail(),
            "declared upload size disagrees with bytes written; filesystem count is authoritative"
        );
    }

    let meta = file.metadata().await?;
    // Creation time is not available on every filesystem; fall back to mtime.
    let created = meta.created().or_else(|_| meta.modified())?;

    Ok(WriteReceipt {
        created_at: OffsetDateTime::from(created),
        size,
    })
}
