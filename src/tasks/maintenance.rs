//! Image Cache Maintenance
//!
//! Keeps the persistent image cache free of stale entries. Cleanup is attempted
//! once at start, then on a repeating timer and whenever the app comes to the
//! foreground, but only actually runs when the last recorded cleanup is older
//! than the interval.
//!
//! Lifecycle: `Uninitialized -> Active -> Stopped`. A stopped service cannot be
//! restarted; build a new one instead.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::cache::current_timestamp_ms;
use crate::error::CacheError;
use crate::image::{PersistentImageCache, LAST_CLEANUP_KEY};

// == App Lifecycle ==
/// Application foreground state as reported by the embedding shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppLifecycle {
    Active,
    Inactive,
    Background,
}

impl FromStr for AppLifecycle {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(AppLifecycle::Active),
            "inactive" => Ok(AppLifecycle::Inactive),
            "background" => Ok(AppLifecycle::Background),
            other => Err(CacheError::InvalidRequest(format!(
                "Unknown lifecycle state '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MaintenanceState {
    Uninitialized,
    Active,
    Stopped,
}

// == Maintenance Service ==
pub struct ImageCacheMaintenance {
    cache: PersistentImageCache,
    cleanup_interval: Duration,
    state: MaintenanceState,
    timer: Option<JoinHandle<()>>,
    listener: Option<JoinHandle<()>>,
}

impl ImageCacheMaintenance {
    pub fn new(cache: PersistentImageCache, cleanup_interval: Duration) -> Self {
        Self {
            cache,
            cleanup_interval,
            state: MaintenanceState::Uninitialized,
            timer: None,
            listener: None,
        }
    }

    pub fn state(&self) -> MaintenanceState {
        self.state
    }

    // == Start ==
    /// Arms the cleanup timer and the foreground listener. The timer task
    /// checks once immediately, since launching counts as coming to the
    /// foreground.
    ///
    /// Returns false (and does nothing) unless the service is `Uninitialized`.
    pub fn start(&mut self, lifecycle: watch::Receiver<AppLifecycle>) -> bool {
        if self.state != MaintenanceState::Uninitialized {
            warn!(state = ?self.state, "Image cache maintenance already started or stopped");
            return false;
        }

        let period = self.cleanup_interval.max(Duration::from_millis(1));

        let cache = self.cache.clone();
        let interval = self.cleanup_interval;
        self.timer = Some(tokio::spawn(async move {
            check_and_clean(&cache, interval).await;

            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                check_and_clean(&cache, interval).await;
            }
        }));

        let cache = self.cache.clone();
        let mut lifecycle = lifecycle;
        self.listener = Some(tokio::spawn(async move {
            while lifecycle.changed().await.is_ok() {
                let state = *lifecycle.borrow_and_update();
                if state == AppLifecycle::Active {
                    debug!("App became active, checking image cache");
                    check_and_clean(&cache, interval).await;
                }
            }
            debug!("Lifecycle channel closed, foreground listener exiting");
        }));

        self.state = MaintenanceState::Active;
        info!(
            interval_secs = self.cleanup_interval.as_secs(),
            "Image cache maintenance started"
        );
        true
    }

    // == Stop ==
    /// Cancels the timer and detaches the foreground listener.
    pub fn stop(&mut self) {
        self.abort_tasks();
        if self.state != MaintenanceState::Stopped {
            self.state = MaintenanceState::Stopped;
            info!("Image cache maintenance stopped");
        }
    }

    fn abort_tasks(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

impl Drop for ImageCacheMaintenance {
    fn drop(&mut self) {
        self.abort_tasks();
    }
}

/// Cleans stale images if no cleanup was recorded within `interval`.
///
/// Failures are logged and reported as "did not run".
pub async fn check_and_clean(cache: &PersistentImageCache, interval: Duration) -> bool {
    let now = current_timestamp_ms();
    let storage = cache.storage();

    let last_cleanup = match storage.get_item(LAST_CLEANUP_KEY).await {
        Ok(raw) => raw.and_then(|v| v.trim().parse::<u64>().ok()),
        Err(err) => {
            warn!(error = %err, "Failed to read last image cleanup time");
            None
        }
    };

    if let Some(last) = last_cleanup {
        if now.saturating_sub(last) <= interval.as_millis() as u64 {
            debug!(last_cleanup = last, "Image cache cleanup not due");
            return false;
        }
    }

    match cache.try_clear_expired_cache().await {
        Ok(removed) => {
            if let Err(err) = storage.set_item(LAST_CLEANUP_KEY, &now.to_string()).await {
                warn!(error = %err, "Failed to record image cleanup time");
            }
            info!(
                removed,
                at = %chrono::Utc::now().to_rfc3339(),
                "Image cache cleanup completed"
            );
            true
        }
        Err(err) => {
            warn!(error = %err, "Image cache cleanup failed");
            false
        }
    }
}
