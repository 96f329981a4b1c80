//! Read-through helpers for memoizing remote store reads.
//!
//! Only reads go through here. Mutating backend calls (add/update employee,
//! submit leave, ...) must call the backend directly and then invalidate the
//! affected keys.

use std::fmt::Display;
use std::future::Future;

use tracing::debug;

use crate::cache::{EntryOptions, SharedVolatileCache};

/// Builds a key following the `<group>_<id>` naming convention, so a whole
/// group can later be dropped with `invalidate_by_prefix("<group>_")`.
pub fn cache_key(group: &str, id: impl Display) -> String {
    format!("{}_{}", group, id)
}

/// Returns the cached value for `key`, or awaits `loader` and caches its `Ok` result.
///
/// Errors from the loader are returned as-is and never cached. The cache lock
/// is not held while the loader runs.
pub async fn get_or_load<V, E, F, Fut>(
    cache: &SharedVolatileCache<V>,
    key: &str,
    options: EntryOptions,
    loader: F,
) -> Result<V, E>
where
    V: Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, E>>,
{
    if let Some(hit) = cache.write().await.get_item(key) {
        debug!(key, "Read-through cache hit");
        return Ok(hit);
    }

    debug!(key, "Read-through cache miss, loading");
    let value = loader().await?;
    cache.write().await.set_item(key, value.clone(), options);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::VolatileCache;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::RwLock;

    fn shared() -> SharedVolatileCache<String> {
        Arc::new(RwLock::new(VolatileCache::new(10, Duration::from_secs(60))))
    }

    #[test]
    fn test_cache_key() {
        assert_eq!(cache_key("leaveHistory", "u42"), "leaveHistory_u42");
        assert_eq!(cache_key("employee", 7), "employee_7");
    }

    #[tokio::test]
    async fn test_loader_called_once() {
        let cache = shared();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Result<String, String> =
                get_or_load(&cache, "employees", EntryOptions::new(), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("list".to_string())
                })
                .await;
            assert_eq!(value.unwrap(), "list");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = shared();

        let first: Result<String, String> =
            get_or_load(&cache, "k", EntryOptions::new(), || async {
                Err("backend down".to_string())
            })
            .await;
        assert_eq!(first.unwrap_err(), "backend down");
        assert!(cache.read().await.is_empty());

        let second: Result<String, String> =
            get_or_load(&cache, "k", EntryOptions::new(), || async { Ok("ok".to_string()) }).await;
        assert_eq!(second.unwrap(), "ok");
    }
}
