use std::{
    collections::HashSet,
    io,
    path::{Path, PathBuf},
};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    error::{Error, Result},
    management::{cache::CacheStore, download::Precacher},
    types::TrackMetadata,
};

/// The liked-track list, persisted as a pretty JSON array.
///
/// Every operation reads the file again, so edits made by hand or by another
/// process are picked up. Mutations hold `write_lock` for the whole
/// read-modify-write.
pub struct LikesStore {
    path: PathBuf,
    cache: CacheStore,
    precacher: Precacher,
    write_lock: Mutex<()>,
}

impl LikesStore {
    pub fn new(path: impl Into<PathBuf>, cache: CacheStore, precacher: Precacher) -> Self {
        Self {
            path: path.into(),
            cache,
            precacher,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn list(&self) -> Result<Vec<TrackMetadata>> {
        let content = match async_fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    /// Appends `track` unless its id is already liked and returns the new
    /// count. A newly liked track is queued for background caching.
    pub async fn add(&self, track: TrackMetadata) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let mut likes = self.list().await?;

        if likes.iter().any(|t| t.id == track.id) {
            debug!("track {} already liked", track.id);
            return Ok(likes.len());
        }

        info!("liking track {} ({} - {})", track.id, track.artist, track.title);
        likes.push(track.clone());
        self.save(&likes).await?;
        self.precacher.submit(track);
        Ok(likes.len())
    }

    /// Removes the track and its cached audio, returning the new count.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when the id is not liked.
    pub async fn remove(&self, id: u64) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let mut likes = self.list().await?;

        let before = likes.len();
        likes.retain(|t| t.id != id);
        if likes.len() == before {
            return Err(Error::NotFound("Liked track".to_string()));
        }

        self.save(&likes).await?;
        // a background download still running would put the file back
        self.precacher.cancel(id).await;
        if let Err(e) = self.cache.delete(id).await {
            warn!("failed to delete cached audio for unliked track {}: {}", id, e);
        }
        info!("unliked track {}", id);
        Ok(likes.len())
    }

    /// Overwrites the list, keeping the first occurrence of duplicate ids.
    pub async fn replace_all(&self, tracks: Vec<TrackMetadata>) -> Result<usize> {
        let _guard = self.write_lock.lock().await;

        let mut seen = HashSet::with_capacity(tracks.len());
        let likes: Vec<TrackMetadata> = tracks
            .into_iter()
            .filter(|t| seen.insert(t.id))
            .collect();

        self.save(&likes).await?;
        info!("replaced liked tracks: {} total", likes.len());
        Ok(likes.len())
    }

    pub async fn find_by_url(&self, url: &str) -> Result<Option<TrackMetadata>> {
        Ok(self.list().await?.into_iter().find(|t| t.url == url))
    }

    pub async fn ids(&self) -> Result<HashSet<u64>> {
        Ok(self.list().await?.iter().map(|t| t.id).collect())
    }

    async fn save(&self, likes: &[TrackMetadata]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(likes)?;
        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);

        async_fs::write(&temp, json).await?;
        if let Err(e) = async_fs::rename(&temp, &self.path).await {
            let _ = async_fs::remove_file(&temp).await;
            return Err(e.into());
        }
        Ok(())
    }
}
