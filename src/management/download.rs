use std::{
    collections::HashMap,
    path::Path,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use futures_util::{
    FutureExt, StreamExt,
    future::{BoxFuture, Shared},
};
use tokio::{
    io::{AsyncWriteExt, BufWriter},
    sync::Semaphore,
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    error::{Error, Result},
    management::cache::CacheStore,
    soundcloud::{AudioStream, CatalogClient},
    types::{CacheEntry, TrackMetadata},
};

const WRITE_BUFFER_SIZE: usize = 64 * 1024;

type SharedDownload = Shared<BoxFuture<'static, std::result::Result<CacheEntry, Arc<Error>>>>;

struct Inner {
    cache: CacheStore,
    catalog: Arc<CatalogClient>,
    in_flight: Mutex<HashMap<u64, SharedDownload>>,
}

/// Downloads tracks into the cache, at most once at a time per track id.
///
/// Callers asking for an id that is already downloading await the same
/// in-flight future. The map of in-flight downloads is locked only to look up
/// or insert an entry, never across the transfer itself. Each transfer runs
/// as its own task, so a caller that goes away (a closed HTTP connection)
/// does not abort a download other callers are waiting for.
#[derive(Clone)]
pub struct DownloadCoordinator {
    inner: Arc<Inner>,
}

impl DownloadCoordinator {
    pub fn new(cache: CacheStore, catalog: Arc<CatalogClient>) -> Self {
        Self {
            inner: Arc::new(Inner {
                cache,
                catalog,
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn cache(&self) -> &CacheStore {
        &self.inner.cache
    }

    /// Makes sure `track` is materialized in the cache and returns its entry.
    ///
    /// A valid cached file is returned without any network call.
    ///
    /// # Errors
    ///
    /// - [`Error::NotStreamable`] if the track is flagged as not streamable
    /// - [`Error::DownloadFailed`] if the transfer fails or yields no bytes;
    ///   the partial file is gone by the time the error is returned
    pub async fn ensure_cached(&self, track: &TrackMetadata) -> Result<CacheEntry> {
        if !track.streamable {
            return Err(Error::NotStreamable(track.id));
        }

        if let Some(entry) = self.inner.cache.entry(track.id).await {
            debug!("cache hit for track {}", track.id);
            return Ok(entry);
        }

        self.join_or_start(track.id)
            .await
            .map_err(|e| unshare_error(track.id, &e))
    }

    /// Waits for a running download of `id`, if there is one, and ignores its
    /// outcome. Returns immediately when nothing is in flight.
    pub async fn wait_for(&self, id: u64) {
        let pending = self.lock_in_flight().get(&id).cloned();
        if let Some(download) = pending {
            debug!("waiting for in-flight download of track {}", id);
            let _ = download.await;
        }
    }

    /// Number of downloads currently running.
    pub fn in_flight(&self) -> usize {
        self.lock_in_flight().len()
    }

    fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, HashMap<u64, SharedDownload>> {
        self.inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn join_or_start(&self, id: u64) -> SharedDownload {
        let mut in_flight = self.lock_in_flight();
        if let Some(existing) = in_flight.get(&id) {
            debug!("joining in-flight download of track {}", id);
            return existing.clone();
        }

        let this = self.clone();
        let task = tokio::spawn(async move {
            let result = this.download(id).await.map_err(Arc::new);
            this.lock_in_flight().remove(&id);
            result
        });

        let shared = async move {
            task.await.unwrap_or_else(|e| {
                Err(Arc::new(Error::download_failed(
                    id,
                    format!("download task aborted: {e}"),
                )))
            })
        }
        .boxed()
        .shared();

        in_flight.insert(id, shared.clone());
        shared
    }

    async fn download(&self, id: u64) -> Result<CacheEntry> {
        // Another download may have finished between the caller's cache check
        // and this task starting.
        if let Some(entry) = self.inner.cache.entry(id).await {
            return Ok(entry);
        }

        info!("downloading track {}", id);
        let track = self
            .inner
            .catalog
            .track(id)
            .await
            .map_err(|e| into_download_error(id, e))?;
        if track.streamable == Some(false) {
            return Err(Error::NotStreamable(id));
        }

        let stream = self
            .inner
            .catalog
            .audio_stream(&track)
            .await
            .map_err(|e| into_download_error(id, e))?;

        let temp_path = self.inner.cache.temp_path_for(id);
        let final_path = self.inner.cache.path_for(id);

        let size = match write_stream(stream, &temp_path).await {
            Ok(0) => Err(Error::download_failed(id, "upstream returned an empty file")),
            Ok(size) => tokio::fs::rename(&temp_path, &final_path)
                .await
                .map(|_| size)
                .map_err(|e| Error::download_failed(id, e)),
            Err(e) => Err(into_download_error(id, e)),
        };

        match size {
            Ok(size) => {
                info!("cached track {} ({} bytes)", id, size);
                Ok(CacheEntry {
                    id,
                    path: final_path,
                    size,
                })
            }
            Err(e) => {
                if let Err(rm) = tokio::fs::remove_file(&temp_path).await {
                    if rm.kind() != std::io::ErrorKind::NotFound {
                        warn!("failed to remove partial file {}: {}", temp_path.display(), rm);
                    }
                }
                warn!("download of track {} failed: {}", id, e);
                Err(e)
            }
        }
    }
}

async fn write_stream(mut stream: AudioStream, path: &Path) -> Result<u64> {
    let file = tokio::fs::File::create(path).await?;
    let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, file);
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        writer.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    writer.flush().await?;
    writer.get_ref().sync_all().await?;
    Ok(written)
}

fn into_download_error(id: u64, error: Error) -> Error {
    match error {
        Error::DownloadFailed { .. } | Error::NotStreamable(_) => error,
        other => Error::download_failed(id, other),
    }
}

fn unshare_error(id: u64, error: &Error) -> Error {
    match error {
        Error::NotStreamable(id) => Error::NotStreamable(*id),
        Error::DownloadFailed { id, reason } => Error::DownloadFailed {
            id: *id,
            reason: reason.clone(),
        },
        other => Error::download_failed(id, other),
    }
}

/// Fire-and-forget background caching with a bound on concurrent transfers.
///
/// Failures are logged and never reported back to whoever submitted the
/// track. Queued jobs are tracked per id so they can be withdrawn.
#[derive(Clone)]
pub struct Precacher {
    downloads: DownloadCoordinator,
    permits: Arc<Semaphore>,
    jobs: Arc<Mutex<HashMap<u64, Job>>>,
    next_job: Arc<AtomicU64>,
}

struct Job {
    seq: u64,
    handle: JoinHandle<()>,
}

impl Precacher {
    pub fn new(downloads: DownloadCoordinator, max_concurrent: usize) -> Self {
        Self {
            downloads,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            jobs: Arc::new(Mutex::new(HashMap::new())),
            next_job: Arc::new(AtomicU64::new(0)),
        }
    }

    fn lock_jobs(&self) -> std::sync::MutexGuard<'_, HashMap<u64, Job>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues `track` for caching.
    pub fn submit(&self, track: TrackMetadata) {
        let id = track.id;
        let seq = self.next_job.fetch_add(1, Ordering::Relaxed);
        let this = self.clone();

        // held across spawn so the job cannot deregister before it is registered
        let mut jobs = self.lock_jobs();
        let handle = tokio::spawn(async move {
            if let Ok(_permit) = this.permits.acquire().await {
                match this.downloads.ensure_cached(&track).await {
                    Ok(entry) => debug!("liked track {} cached ({} bytes)", id, entry.size),
                    Err(e) => warn!("background caching of track {} failed: {}", id, e),
                }
            }
            let mut jobs = this.lock_jobs();
            if jobs.get(&id).is_some_and(|job| job.seq == seq) {
                jobs.remove(&id);
            }
        });
        if let Some(replaced) = jobs.insert(id, Job { seq, handle }) {
            replaced.handle.abort();
        }
    }

    /// Withdraws any queued job for `id` and waits until no download of it is
    /// running. Once this returns, nothing started by the precacher will
    /// write `id` into the cache.
    pub async fn cancel(&self, id: u64) {
        let job = self.lock_jobs().remove(&id);
        if let Some(job) = job {
            job.handle.abort();
            // resolves once the job has stopped, whether aborted or finished
            let _ = job.handle.await;
        }
        self.downloads.wait_for(id).await;
    }
}
