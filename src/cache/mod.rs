//! Volatile Cache Module
//!
//! In-memory memoization with per-entry TTL and priority-weighted eviction.

mod entry;
mod eviction;
mod read_through;
mod stats;
mod store;


use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry, EntryOptions, Priority};
pub use read_through::{cache_key, get_or_load};
pub use stats::CacheStats;
pub use store::{PreloadItem, SweepOutcome, VolatileCache};

/// The single process-wide cache instance, shared by reference.
pub type SharedVolatileCache<V = Value> = Arc<RwLock<VolatileCache<V>>>;
