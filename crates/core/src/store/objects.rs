use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::fs;
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::{
    error::{ReelnoteError, Result},
    media::content_type_for,
    store::{ObjectBody, ObjectStore},
    types::{FolderId, ObjectEntry, ObjectMeta},
};

/// Object store backed by a directory: key `a/b.mp4` lives at `<root>/a/b.mp4`.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write an object, creating parent directories.
    pub async fn put(&self, key: &str, bytes: impl AsRef<[u8]>) -> Result<()> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, bytes).await?;
        debug!(key, "object written");
        Ok(())
    }

    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let segments = key_segments(key)?;
        if segments.is_empty() {
            return Err(ReelnoteError::InvalidObjectKey {
                key: key.to_string(),
            });
        }
        Ok(segments
            .iter()
            .fold(self.root.clone(), |path, segment| path.join(segment)))
    }
}

/// Split a key or prefix into path segments, rejecting anything that could
/// escape the root. A single trailing `/` is allowed.
fn key_segments(key: &str) -> Result<Vec<&str>> {
    let trimmed = key.strip_suffix('/').unwrap_or(key);
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let segments: Vec<&str> = trimmed.split('/').collect();
    let invalid = segments.iter().any(|segment| {
        segment.is_empty() || *segment == "." || *segment == ".." || segment.contains('\\')
    });

    if invalid {
        return Err(ReelnoteError::InvalidObjectKey {
            key: key.to_string(),
        });
    }
    Ok(segments)
}

fn not_found(key: &str, err: std::io::Error) -> ReelnoteError {
    if err.kind() == ErrorKind::NotFound {
        ReelnoteError::ObjectNotFound {
            key: key.to_string(),
        }
    } else {
        ReelnoteError::IoError(err)
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectEntry>> {
        let base = key_segments(prefix.trim())?
            .iter()
            .fold(self.root.clone(), |path, segment| path.join(segment));

        let mut entries = Vec::new();
        let mut pending = vec![base.clone()];

        while let Some(dir) = pending.pop() {
            let mut read_dir = match fs::read_dir(&dir).await {
                Ok(read_dir) => read_dir,
                Err(err)
                    if matches!(err.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) =>
                {
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            while let Some(entry) = read_dir.next_entry().await? {
                let metadata = entry.metadata().await?;
                let path = entry.path();
                if metadata.is_dir() {
                    pending.push(path);
                    continue;
                }

                let Ok(relative) = path.strip_prefix(&base) else {
                    continue;
                };
                let relative = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                let last_modified = metadata
                    .modified()
                    .map(DateTime::<Utc>::from)
                    .unwrap_or_else(|_| Utc::now());

                entries.push(ObjectEntry {
                    name: entry.file_name().to_string_lossy().into_owned(),
                    path: relative,
                    size: metadata.len(),
                    last_modified,
                });
            }
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    async fn list_folders(&self) -> Result<Vec<FolderId>> {
        let mut read_dir = match fs::read_dir(&self.root).await {
            Ok(read_dir) => read_dir,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut folders = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            if let Ok(folder) = FolderId::parse(entry.file_name().to_string_lossy()) {
                folders.push(folder);
            }
        }

        folders.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(folders)
    }

    async fn head(&self, key: &str) -> Result<ObjectMeta> {
        let path = self.resolve(key)?;
        let metadata = fs::metadata(&path).await.map_err(|e| not_found(key, e))?;
        if !metadata.is_file() {
            return Err(ReelnoteError::ObjectNotFound {
                key: key.to_string(),
            });
        }

        Ok(ObjectMeta {
            key: key.to_string(),
            content_type: content_type_for(key).to_string(),
            content_length: metadata.len(),
        })
    }

    async fn get(&self, key: &str) -> Result<Bytes> {
        let path = self.resolve(key)?;
        let bytes = fs::read(&path).await.map_err(|e| not_found(key, e))?;
        Ok(Bytes::from(bytes))
    }

    async fn open(&self, key: &str) -> Result<ObjectBody> {
        let meta = self.head(key).await?;
        let path = self.resolve(key)?;
        let file = fs::File::open(&path).await.map_err(|e| not_found(key, e))?;

        Ok(ObjectBody {
            meta,
            body: Box::pin(ReaderStream::new(file)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_segments_reject_escapes() {
        for bad in ["../etc/passwd", "a/../b", "a//b", "./a", "a\\b"] {
            assert!(key_segments(bad).is_err(), "{bad:?} should be rejected");
        }
        assert_eq!(key_segments("f1/").unwrap(), vec!["f1"]);
        assert_eq!(key_segments("f1/video.mp4").unwrap(), vec!["f1", "video.mp4"]);
        assert!(key_segments("").unwrap().is_empty());
    }
}
