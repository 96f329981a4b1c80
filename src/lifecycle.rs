//! Mount/unmount glue for the caching subsystem.
//!
//! The application builds exactly one [`CacheSubsystem`] at start-up and hands
//! references to its caches to whoever needs them.

use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::info;

use crate::cache::{SharedVolatileCache, VolatileCache};
use crate::config::Config;
use crate::error::Result;
use crate::image::{FileStorage, HttpFetcher, ImageFetcher, KeyValueStorage, PersistentImageCache};
use crate::tasks::{spawn_sweep_task, AppLifecycle, ImageCacheMaintenance, MaintenanceState};

/// Owns both caches and their background tasks.
pub struct CacheSubsystem {
    volatile: SharedVolatileCache<Value>,
    images: PersistentImageCache,
    maintenance: Mutex<ImageCacheMaintenance>,
    lifecycle: watch::Sender<AppLifecycle>,
    sweep_handle: JoinHandle<()>,
}

impl CacheSubsystem {
    // == Mount ==
    /// Builds both caches and arms their background work.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(
        config: &Config,
        storage: Arc<dyn KeyValueStorage>,
        fetcher: Arc<dyn ImageFetcher>,
    ) -> Self {
        let volatile: SharedVolatileCache<Value> =
            Arc::new(RwLock::new(VolatileCache::from_config(config)));
        let sweep_handle = spawn_sweep_task(volatile.clone(), config.sweep_interval());

        let images = PersistentImageCache::new(storage, fetcher, config.image_expiry());
        let (lifecycle, lifecycle_rx) = watch::channel(AppLifecycle::Active);
        let mut maintenance =
            ImageCacheMaintenance::new(images.clone(), config.image_cleanup_interval());
        maintenance.start(lifecycle_rx);

        info!(
            max_entries = config.max_entries,
            default_ttl_ms = config.default_ttl_ms,
            image_expiry_secs = config.image_expiry_secs,
            "Cache subsystem mounted"
        );

        Self {
            volatile,
            images,
            maintenance: Mutex::new(maintenance),
            lifecycle,
            sweep_handle,
        }
    }

    /// Mounts with file-backed storage under `config.storage_dir` and HTTP fetching.
    pub fn mount_default(config: &Config) -> Result<Self> {
        let storage = FileStorage::new(&config.storage_dir)?;
        let fetcher = HttpFetcher::new(config.fetch_timeout())?;
        Ok(Self::mount(config, Arc::new(storage), Arc::new(fetcher)))
    }

    pub fn volatile(&self) -> &SharedVolatileCache<Value> {
        &self.volatile
    }

    pub fn images(&self) -> &PersistentImageCache {
        &self.images
    }

    pub fn maintenance_state(&self) -> MaintenanceState {
        self.maintenance().state()
    }

    fn maintenance(&self) -> MutexGuard<'_, ImageCacheMaintenance> {
        // The guarded state stays consistent even if a holder panicked
        self.maintenance
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Forwards an app foreground/background transition to the maintenance listener.
    pub fn notify_lifecycle(&self, state: AppLifecycle) {
        self.lifecycle.send_replace(state);
    }

    // == Unmount ==
    /// Cancels the sweep and stops image maintenance. Safe to call twice.
    pub fn unmount(&self) {
        self.sweep_handle.abort();
        self.maintenance().stop();
        info!("Cache subsystem unmounted");
    }
}

impl Drop for CacheSubsystem {
    fn drop(&mut self) {
        // Maintenance aborts its own tasks when dropped
        self.sweep_handle.abort();
    }
}
