//! File-backed settings cache.
//!
//! Implements [`CacheStore`] on a single JSON file next to the prop.  The
//! file's modification time is the document's `settings-date` when it is
//! rescued offline.
//!
//! Writes go to a sibling temporary file first and are renamed over the
//! cache, so a crash mid-write leaves the previous document intact.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::time::UNIX_EPOCH;

use log::{info, warn};

use crate::app::ports::{CacheStore, StorageError};

/// Largest document the cache accepts, in bytes.  Matches the largest
/// payload the message bus delivers, so every decodable remote document
/// fits.
pub const MAX_DOCUMENT_SIZE: usize = 1024 * 1024;

pub struct FileCacheStore {
    path: PathBuf,
}

impl FileCacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        info!("FileCacheStore: {}", path.display());
        Self { path }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CacheStore for FileCacheStore {
    fn read_cached_document(&self) -> Result<Option<Vec<u8>>, StorageError> {
        match fs::read(&self.path) {
            Ok(data) if data.len() > MAX_DOCUMENT_SIZE => Err(StorageError::TooLarge),
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => {
                warn!("FileCacheStore: read {} failed: {}", self.path.display(), e);
                Err(StorageError::IoError)
            }
        }
    }

    fn write_cached_document(&mut self, data: &[u8]) -> Result<(), StorageError> {
        if data.len() > MAX_DOCUMENT_SIZE {
            return Err(StorageError::TooLarge);
        }
        let tmp = self.temp_path();
        let result = fs::File::create(&tmp)
            .and_then(|mut f| {
                f.write_all(data)?;
                f.sync_all()
            })
            .and_then(|()| fs::rename(&tmp, &self.path));

        result.map_err(|e| {
            warn!("FileCacheStore: write {} failed: {}", self.path.display(), e);
            let _ = fs::remove_file(&tmp);
            StorageError::IoError
        })
    }

    fn cached_document_timestamp(&self) -> Option<u64> {
        let modified = fs::metadata(&self.path).ok()?.modified().ok()?;
        modified
            .duration_since(UNIX_EPOCH)
            .ok()
            .map(|d| d.as_secs())
    }
}
