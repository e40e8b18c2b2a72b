//! In-memory archive assembly for bulk downloads.
//!
//! Archives are built fully in memory before returning. That is acceptable
//! because membership is bounded to a single directory level of user content;
//! streaming assembly would be the production hardening if that bound ever
//! goes away.

use crate::error::{StorageError, StorageResult};
use bytes::Bytes;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::instrument;

/// Requested compression/container format for a bulk download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveScheme {
    /// gzip-compressed tar.
    Tar,
    /// DEFLATE-compressed zip.
    Zip,
}

impl ArchiveScheme {
    /// Parse a client-supplied scheme name.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "tar" => Some(Self::Tar),
            "zip" => Some(Self::Zip),
            _ => None,
        }
    }

    /// Media type served with archives of this scheme.
    pub fn media_type(self) -> &'static str {
        match self {
            Self::Tar => "application/x-gtar",
            Self::Zip => "application/x-zip-compressed",
        }
    }
}

/// A fully assembled archive.
#[derive(Debug)]
pub struct ArchiveBundle {
    /// Archive bytes.
    pub data: Bytes,
    /// Media type matching the scheme.
    pub media_type: &'static str,
}

/// Assemble an archive of the target path.
///
/// A regular file yields exactly one entry. A directory yields every regular
/// file directly inside it (one level, no recursion), in directory-iteration
/// order. Entry names are the member paths with the user's shard root
/// stripped, so neither the storage root nor shard segments ever leak into
/// the archive.
///
/// Fails with [`StorageError::NotFound`] when the target does not exist.
#[instrument(skip(user_root, target))]
pub async fn build(
    user_root: &Path,
    target: &Path,
    scheme: ArchiveScheme,
) -> StorageResult<ArchiveBundle> {
    let meta = fs::metadata(target).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StorageError::NotFound("nothing at the resolved path".to_string())
        } else {
            StorageError::Io(e)
        }
    })?;

    let members = if meta.is_file() {
        vec![target.to_path_buf()]
    } else {
        let mut members = Vec::new();
        let mut entries = fs::read_dir(target).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                members.push(entry.path());
            }
        }
        members
    };

    let entries: Vec<(PathBuf, String)> = members
        .into_iter()
        .map(|member| {
            let name = member
                .strip_prefix(user_root)
                .map_err(|_| {
                    StorageError::Io(std::io::Error::other(format!(
                        "archive member escapes user root: {}",
                        member.display()
                    )))
                })?
                .to_string_lossy()
                .into_owned();
            Ok((member, name))
        })
        .collect::<StorageResult<_>>()?;

    let data = tokio::task::spawn_blocking(move || match scheme {
        ArchiveScheme::Tar => tar_bytes(&entries),
        ArchiveScheme::Zip => zip_bytes(&entries),
    })
    .await
    .map_err(|e| StorageError::Io(std::io::Error::other(format!("archive task failed: {e}"))))??;

    Ok(ArchiveBundle {
        data: Bytes::from(data),
        media_type: scheme.media_type(),
    })
}

fn tar_bytes(entries: &[(PathBuf, String)]) -> StorageResult<Vec<u8>> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (path, name) in entries {
        let mut file = std::fs::File::open(path)?;
        builder.append_file(name, &mut file)?;
    }
    let encoder = builder.into_inner()?;
    Ok(encoder.finish()?)
}

fn zip_bytes(entries: &[(PathBuf, String)]) -> StorageResult<Vec<u8>> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    for (path, name) in entries {
        writer
            .start_file(name.as_str(), options)
            .map_err(std::io::Error::other)?;
        let mut file = std::fs::File::open(path)?;
        std::io::copy(&mut file, &mut writer)?;
    }
    let cursor = writer.finish().map_err(std::io::Error::other)?;
    Ok(cursor.into_inner())
}
