//! File-backed key-value store.
//!
//! Each key maps to `<dir>/<url-encoded key>.json`. Every write lands in its
//! own uniquely named temp file in the same directory and is then renamed
//! into place, so a reader never sees a half-written snapshot and concurrent
//! writers never share a temp file. A failed write removes its temp file.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use super::{KeyValueStore, StorageError};

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    #[must_use]
    pub const fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", urlencoding::encode(key)))
    }
}

impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let dir = self.dir.clone();
        let path = self.path_for(key);
        let contents = value.to_owned();

        let path = tokio::task::spawn_blocking(move || {
            write_atomic(&dir, &path, contents.as_bytes()).map(|()| path)
        })
        .await
        .map_err(std::io::Error::other)??;

        debug!(path = %path.display(), bytes = value.len(), "Wrote snapshot");
        Ok(())
    }
}

/// Write `contents` to a fresh temp file in `dir` and rename it over `path`.
///
/// The temp file is deleted when dropped, so every error path cleans up.
fn write_atomic(dir: &Path, path: &Path, contents: &[u8]) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
