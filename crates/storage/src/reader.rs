//! Streaming reads for single-file downloads.

use crate::ByteStream;
use crate::error::{StorageError, StorageResult};
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncReadExt;
use tracing::instrument;

/// Chunk size for streaming reads (64 KiB).
const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Open a stored file as a byte stream.
///
/// The file is streamed in fixed-size chunks rather than loaded into memory,
/// since stored files are of arbitrary size. Fails with
/// [`StorageError::NotFound`] when no regular file exists at the path.
#[instrument(skip(path))]
pub async fn open_stream(path: &Path) -> StorageResult<(ByteStream, u64)> {
    let file = fs::File::open(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StorageError::NotFound("no file at the resolved path".to_string())
        } else {
            StorageError::Io(e)
        }
    })?;

    let meta = file.metadata().await?;
    if !meta.is_file() {
        return Err(StorageError::NotFound(
            "resolved path is not a regular file".to_string(),
        ));
    }
    let size = meta.len();

    let stream = async_stream::try_stream! {
        let mut file = file;
        let mut buf = vec![0u8; STREAM_CHUNK_SIZE];
        loop {
            let n = file.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            yield bytes::Bytes::copy_from_slice(&buf[..n]);
        }
    };

    Ok((Box::pin(stream), size))
}
