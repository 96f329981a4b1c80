//! Volatile Cache Sweep Task
//!
//! Background task that periodically removes expired entries and re-applies
//! the capacity bound, so memory is reclaimed even without new writes.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedVolatileCache;

/// Spawns a background task that sweeps the volatile cache every `interval`.
///
/// The first sweep happens one full interval after spawning. The write lock
/// is held only for the duration of one sweep.
///
/// # Returns
/// A JoinHandle for the spawned task, aborted on unmount.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(RwLock::new(VolatileCache::new(100, Duration::from_secs(300))));
/// let sweep_handle = spawn_sweep_task(cache.clone(), Duration::from_secs(60));
/// // Later, during unmount:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task<V>(cache: SharedVolatileCache<V>, interval: Duration) -> JoinHandle<()>
where
    V: Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(interval_secs = interval.as_secs_f64(), "Starting cache sweep task");

        loop {
            tokio::time::sleep(interval).await;

            let outcome = {
                let mut cache_guard = cache.write().await;
                cache_guard.sweep()
            };

            if outcome.total() > 0 {
                info!(
                    expired = outcome.expired,
                    evicted = outcome.evicted,
                    "Cache sweep removed entries"
                );
            } else {
                debug!("Cache sweep: nothing to remove");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{EntryOptions, VolatileCache};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    fn shared(max_entries: usize) -> SharedVolatileCache<String> {
        Arc::new(RwLock::new(VolatileCache::new(max_entries, Duration::from_secs(300))))
    }

    #[tokio::test]
    async fn test_sweep_task_removes_expired_entries() {
        let cache = shared(100);

        cache.write().await.set_item(
            "expire_soon",
            "value".to_string(),
            EntryOptions::new().with_ttl(Duration::from_millis(30)),
        );

        let handle = spawn_sweep_task(cache.clone(), Duration::from_millis(50));

        tokio::time::sleep(Duration::from_millis(200)).await;

        // Checked without get_item, which would also remove it lazily
        assert!(cache.read().await.entry("expire_soon").is_none());
        assert_eq!(cache.read().await.stats().expirations, 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_preserves_valid_entries() {
        let cache = shared(100);

        cache.write().await.set_item(
            "long_lived",
            "value".to_string(),
            EntryOptions::new().with_ttl(Duration::from_secs(3600)),
        );
        cache
            .write()
            .await
            .set_item("forever", "value".to_string(), EntryOptions::new().no_expiry());

        let handle = spawn_sweep_task(cache.clone(), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(cache.write().await.get_item("long_lived"), Some("value".to_string()));
        assert!(cache.read().await.contains_key("forever"));

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_can_be_aborted() {
        let handle = spawn_sweep_task(shared(10), Duration::from_secs(1));

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
