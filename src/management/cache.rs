use std::{
    collections::HashSet,
    io,
    path::{Path, PathBuf},
};

use rand::{Rng, distr::Alphanumeric};
use tracing::{debug, info};

use crate::types::{CacheEntry, CacheStats};

const AUDIO_EXTENSION: &str = "mp3";
const PARTIAL_EXTENSION: &str = "part";

/// Maps track ids onto `<id>.mp3` files in one flat directory.
///
/// The store does no locking of its own: the only writer is the download
/// coordinator, which serializes work per id and publishes files by rename.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Creates the cache directory and removes partial downloads left behind
    /// by a previous process.
    pub async fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let store = Self::new(dir);
        async_fs::create_dir_all(&store.dir).await?;
        let swept = store.sweep_partials().await?;
        if swept > 0 {
            info!("removed {} stale partial downloads", swept);
        }
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: u64) -> PathBuf {
        self.dir.join(format!("{id}.{AUDIO_EXTENSION}"))
    }

    /// A fresh, randomly suffixed sibling of [`path_for`](Self::path_for).
    /// Partial files never carry the `.mp3` extension so nothing lists them
    /// as cached.
    pub fn temp_path_for(&self, id: u64) -> PathBuf {
        let suffix: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(8)
            .map(char::from)
            .collect();
        self.dir
            .join(format!("{id}.{AUDIO_EXTENSION}.{suffix}.{PARTIAL_EXTENSION}"))
    }

    pub async fn entry(&self, id: u64) -> Option<CacheEntry> {
        let path = self.path_for(id);
        match async_fs::metadata(&path).await {
            Ok(meta) if meta.is_file() && meta.len() > 0 => Some(CacheEntry {
                id,
                path,
                size: meta.len(),
            }),
            _ => None,
        }
    }

    pub async fn exists_and_valid(&self, id: u64) -> bool {
        self.entry(id).await.is_some()
    }

    /// Returns whether a file was removed.
    pub async fn delete(&self, id: u64) -> io::Result<bool> {
        match async_fs::remove_file(self.path_for(id)).await {
            Ok(()) => {
                debug!("deleted cached track {}", id);
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn delete_all(&self) -> io::Result<usize> {
        let mut deleted = 0;
        for (_, path) in self.cached_files().await? {
            async_fs::remove_file(&path).await?;
            deleted += 1;
        }
        info!("cleared cache: {} files deleted", deleted);
        Ok(deleted)
    }

    /// Deletes every cached file whose id is not in `keep`.
    pub async fn retain_only(&self, keep: &HashSet<u64>) -> io::Result<usize> {
        let mut deleted = 0;
        for (id, path) in self.cached_files().await? {
            if id.is_some_and(|id| keep.contains(&id)) {
                continue;
            }
            async_fs::remove_file(&path).await?;
            deleted += 1;
        }
        info!("trimmed cache: {} files deleted, {} kept", deleted, keep.len());
        Ok(deleted)
    }

    pub async fn stats(&self) -> io::Result<CacheStats> {
        let mut stats = CacheStats::default();
        for (_, path) in self.cached_files().await? {
            if let Ok(meta) = async_fs::metadata(&path).await {
                stats.files += 1;
                stats.bytes += meta.len();
            }
        }
        Ok(stats)
    }

    pub async fn sweep_partials(&self) -> io::Result<usize> {
        let mut swept = 0;
        for path in self.list_dir().await? {
            if path.extension().and_then(|e| e.to_str()) == Some(PARTIAL_EXTENSION) {
                async_fs::remove_file(&path).await?;
                swept += 1;
            }
        }
        Ok(swept)
    }

    /// All `*.mp3` files with the track id parsed from the file stem, when
    /// the stem is numeric.
    async fn cached_files(&self) -> io::Result<Vec<(Option<u64>, PathBuf)>> {
        Ok(self
            .list_dir()
            .await?
            .into_iter()
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some(AUDIO_EXTENSION))
            .map(|p| {
                let id = p
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(|s| s.parse::<u64>().ok());
                (id, p)
            })
            .collect())
    }

    async fn list_dir(&self) -> io::Result<Vec<PathBuf>> {
        use futures_util::StreamExt;

        let mut entries = match async_fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries.next().await {
            let entry = entry?;
            if entry.file_type().await?.is_file() {
                paths.push(entry.path());
            }
        }
        Ok(paths)
    }
}
