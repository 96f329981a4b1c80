//! Persistent Image Cache Module
//!
//! Maps image URLs to their encoded content across restarts. The whole
//! mapping is one JSON object stored under [`IMAGE_CACHE_KEY`].
//!
//! Storage failures never reach callers: a failed read is treated as an empty
//! cache and a failed write only costs a refetch later. Fetch failures are
//! returned so the caller can show a load-error state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::cache::current_timestamp_ms;
use crate::error::{CacheError, Result};
use crate::image::{ImageFetcher, KeyValueStorage};

/// Storage key holding the serialized URL -> image mapping.
pub const IMAGE_CACHE_KEY: &str = "@workforce/image_cache";

/// Storage key holding the last cleanup timestamp (Unix milliseconds).
pub const LAST_CLEANUP_KEY: &str = "@workforce/image_cache_last_cleanup";

// == Cached Image ==
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedImage {
    pub url: String,
    /// Fetch time (Unix milliseconds)
    pub timestamp: u64,
    /// Encoded body (`data:` URI)
    pub data: String,
}

impl CachedImage {
    pub fn new(url: impl Into<String>, data: impl Into<String>, timestamp: u64) -> Self {
        Self {
            url: url.into(),
            timestamp,
            data: data.into(),
        }
    }

    /// Valid while `now - timestamp < expiry`.
    pub fn is_fresh_at(&self, now: u64, expiry: Duration) -> bool {
        now.saturating_sub(self.timestamp) < expiry.as_millis() as u64
    }
}

type ImageMap = HashMap<String, CachedImage>;
type PendingFetch = Shared<BoxFuture<'static, Result<String>>>;

// == Load State ==
/// Hook-shaped view of one image request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageLoadState {
    Loading,
    Loaded(String),
    Failed(CacheError),
}

impl ImageLoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, ImageLoadState::Loading)
    }

    pub fn cached_image(&self) -> Option<&str> {
        match self {
            ImageLoadState::Loaded(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&CacheError> {
        match self {
            ImageLoadState::Failed(err) => Some(err),
            _ => None,
        }
    }
}

// == Persistent Image Cache ==
/// Cheap to clone; all clones share storage, fetcher and in-flight requests.
#[derive(Clone)]
pub struct PersistentImageCache {
    inner: Arc<Inner>,
}

struct Inner {
    storage: Arc<dyn KeyValueStorage>,
    fetcher: Arc<dyn ImageFetcher>,
    expiry: Duration,
    /// URL -> download in progress, removed when the download settles
    in_flight: Mutex<HashMap<String, PendingFetch>>,
}

impl PersistentImageCache {
    pub fn new(
        storage: Arc<dyn KeyValueStorage>,
        fetcher: Arc<dyn ImageFetcher>,
        expiry: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                storage,
                fetcher,
                expiry,
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub(crate) fn storage(&self) -> &Arc<dyn KeyValueStorage> {
        &self.inner.storage
    }

    // == Load ==
    /// Returns the encoded image for `url`, fetching and storing it on a miss.
    ///
    /// Concurrent loads of the same uncached URL share a single download. The
    /// download runs detached, so dropping this future does not cancel it.
    pub async fn load(&self, url: &str) -> Result<String> {
        if let Some(data) = self.inner.fresh_image(url).await {
            debug!(url, "Image cache hit");
            return Ok(data);
        }

        let pending = {
            let mut in_flight = self.inner.in_flight.lock().await;
            match in_flight.get(url) {
                Some(pending) => {
                    debug!(url, "Joining in-flight image fetch");
                    pending.clone()
                }
                None => {
                    // A download may have been stored and unregistered since the first lookup
                    if let Some(data) = self.inner.fresh_image(url).await {
                        debug!(url, "Image stored by a concurrent fetch");
                        return Ok(data);
                    }
                    let pending = self.spawn_fetch(url.to_string());
                    in_flight.insert(url.to_string(), pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    /// Starts the download task; it unregisters itself from `in_flight` when done.
    fn spawn_fetch(&self, url: String) -> PendingFetch {
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            let result = inner.fetch_and_store(&url).await;
            inner.in_flight.lock().await.remove(&url);
            result
        });

        async move {
            handle
                .await
                .unwrap_or_else(|e| Err(CacheError::Internal(format!("Image fetch task failed: {}", e))))
        }
        .boxed()
        .shared()
    }

    // == Track ==
    /// Starts a load and reports its progress through a watch channel.
    pub fn track(&self, url: impl Into<String>) -> watch::Receiver<ImageLoadState> {
        let url = url.into();
        let (tx, rx) = watch::channel(ImageLoadState::Loading);
        let cache = self.clone();

        tokio::spawn(async move {
            let state = match cache.load(&url).await {
                Ok(data) => ImageLoadState::Loaded(data),
                Err(err) => ImageLoadState::Failed(err),
            };
            // Nobody listening is fine, the image is cached either way
            let _ = tx.send(state);
        });

        rx
    }

    // == Clear Expired ==
    /// Drops stale images; returns how many were removed. Failures are logged
    /// and reported as zero removals.
    pub async fn clear_expired_cache(&self) -> usize {
        match self.try_clear_expired_cache().await {
            Ok(removed) => removed,
            Err(err) => {
                warn!(error = %err, "Image cache cleanup failed");
                0
            }
        }
    }

    pub(crate) async fn try_clear_expired_cache(&self) -> Result<usize> {
        let Some(raw) = self.inner.storage.get_item(IMAGE_CACHE_KEY).await? else {
            return Ok(0);
        };
        let mut images: ImageMap = serde_json::from_str(&raw)?;

        let now = current_timestamp_ms();
        let before = images.len();
        images.retain(|_, image| image.is_fresh_at(now, self.inner.expiry));
        let removed = before - images.len();

        if removed > 0 {
            self.inner.write_map(&images).await?;
            info!(removed, remaining = images.len(), "Removed stale images");
        } else {
            debug!("Image cache cleanup: nothing stale");
        }
        Ok(removed)
    }

    // == Clear ==
    /// Deletes the whole persisted mapping.
    pub async fn clear_cache(&self) {
        match self.inner.storage.remove_item(IMAGE_CACHE_KEY).await {
            Ok(()) => info!("Image cache cleared"),
            Err(err) => warn!(error = %err, "Failed to clear image cache"),
        }
    }

    /// Number of stored images, fresh or not.
    pub async fn len(&self) -> usize {
        self.inner.read_map().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Inner {
    /// Stored data for `url` if it is still within the expiry window.
    async fn fresh_image(&self, url: &str) -> Option<String> {
        self.read_map()
            .await
            .remove(url)
            .filter(|image| image.is_fresh_at(current_timestamp_ms(), self.expiry))
            .map(|image| image.data)
    }

    async fn fetch_and_store(&self, url: &str) -> Result<String> {
        let fetched = self.fetcher.fetch(url).await.map_err(|err| {
            warn!(url, error = %err, "Image fetch failed");
            err
        })?;
        let data = fetched.to_data_uri();

        // Read-modify-write; a concurrent writer can win, which only costs a refetch
        let mut images = self.read_map().await;
        images.insert(
            url.to_string(),
            CachedImage::new(url, data.clone(), current_timestamp_ms()),
        );
        if let Err(err) = self.write_map(&images).await {
            warn!(url, error = %err, "Failed to persist fetched image");
        } else {
            debug!(url, bytes = fetched.bytes.len(), "Cached fetched image");
        }

        Ok(data)
    }

    /// Loads the mapping; unreadable or corrupt storage reads as empty.
    async fn read_map(&self) -> ImageMap {
        let raw = match self.storage.get_item(IMAGE_CACHE_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return ImageMap::new(),
            Err(err) => {
                warn!(error = %err, "Failed to read image cache");
                return ImageMap::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!(error = %err, "Discarding corrupt image cache");
            ImageMap::new()
        })
    }

    async fn write_map(&self, images: &ImageMap) -> Result<()> {
        let raw = serde_json::to_string(images)?;
        self.storage.set_item(IMAGE_CACHE_KEY, &raw).await
    }
}
