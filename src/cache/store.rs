//! Volatile Cache Store Module
//!
//! Process-wide key/value memoization with per-entry TTL and priority-weighted
//! eviction. Every operation is synchronous and infallible: a miss is a signal
//! to refetch, never an error.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::cache::eviction::{expired_keys, select_victims};
use crate::cache::{current_timestamp_ms, CacheEntry, CacheStats, EntryOptions};
use crate::config::Config;

// == Preload Item ==
/// One element of a `preload_cache` batch.
#[derive(Debug, Clone)]
pub struct PreloadItem<V = Value> {
    pub key: String,
    pub data: V,
    pub options: EntryOptions,
}

impl<V> PreloadItem<V> {
    pub fn new(key: impl Into<String>, data: V, options: EntryOptions) -> Self {
        Self {
            key: key.into(),
            data,
            options,
        }
    }
}

// == Sweep Outcome ==
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    pub expired: usize,
    pub evicted: usize,
}

impl SweepOutcome {
    pub fn total(&self) -> usize {
        self.expired + self.evicted
    }
}

// == Volatile Cache ==
/// In-memory cache bounded by `max_entries`.
///
/// The bound holds after every `set_item` and every sweep.
#[derive(Debug)]
pub struct VolatileCache<V = Value> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    stats: CacheStats,
    /// Capacity bound
    max_entries: usize,
    /// TTL applied when `EntryOptions::ttl` is unset
    default_ttl: Duration,
    next_seq: u64,
}

impl<V> VolatileCache<V> {
    // == Constructor ==
    /// Creates an empty cache.
    ///
    /// # Arguments
    /// * `max_entries` - Capacity bound
    /// * `default_ttl` - TTL for entries inserted without one
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            max_entries,
            default_ttl,
            next_seq: 0,
        }
    }

    /// Creates an empty cache sized from `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_entries, config.default_ttl())
    }

    // == Set Item ==
    /// Inserts or replaces the entry for `key`.
    ///
    /// The replacement is a single map insert, so no partially updated entry
    /// is ever observable. When the insert pushes the cache over capacity an
    /// eviction pass runs before returning; it never evicts the entry just
    /// written unless the capacity is zero.
    pub fn set_item(&mut self, key: impl Into<String>, data: V, options: EntryOptions) {
        let key = key.into();
        let now = current_timestamp_ms();
        let ttl = options.ttl.unwrap_or(self.default_ttl);

        let seq = self.next_seq;
        self.next_seq += 1;

        let entry = CacheEntry::new(data, now, ttl, options.priority, seq);
        self.entries.insert(key.clone(), entry);

        if self.entries.len() > self.max_entries {
            let outcome = self.evict(Some(key.as_str()), now);
            debug!(
                expired = outcome.expired,
                evicted = outcome.evicted,
                "Capacity exceeded on insert"
            );
        }

        self.stats.set_total_entries(self.entries.len());
    }

    // == Remove Item ==
    /// Deletes the entry for `key`; returns whether one was present.
    pub fn remove_item(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Clear ==
    /// Empties the cache unconditionally.
    pub fn clear_cache(&mut self) {
        self.entries.clear();
        self.stats.set_total_entries(0);
    }

    // == Invalidate By Prefix ==
    /// Deletes every entry whose key starts with `prefix`; returns the count.
    pub fn invalidate_by_prefix(&mut self, prefix: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before - self.entries.len();

        self.stats.set_total_entries(self.entries.len());
        debug!(prefix, removed, "Invalidated cache entries by prefix");
        removed
    }

    // == Preload ==
    /// Batch insert, equivalent to calling `set_item` for each item in order.
    pub fn preload_cache(&mut self, items: impl IntoIterator<Item = PreloadItem<V>>) {
        for item in items {
            self.set_item(item.key, item.data, item.options);
        }
    }

    // == Cleanup Expired ==
    /// Removes every entry whose TTL has elapsed; returns the count.
    pub fn cleanup_expired(&mut self) -> usize {
        let removed = self.remove_expired(current_timestamp_ms());
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Sweep ==
    /// Expiry cleanup followed by capacity enforcement.
    pub fn sweep(&mut self) -> SweepOutcome {
        let now = current_timestamp_ms();
        let expired = self.remove_expired(now);
        let evicted = self.evict_overflow(None);
        self.stats.set_total_entries(self.entries.len());

        SweepOutcome { expired, evicted }
    }

    /// Runs both eviction steps, shielding `protected` from step 2.
    fn evict(&mut self, protected: Option<&str>, now: u64) -> SweepOutcome {
        let expired = self.remove_expired(now);
        let evicted = self.evict_overflow(protected);
        SweepOutcome { expired, evicted }
    }

    fn remove_expired(&mut self, now: u64) -> usize {
        let keys = expired_keys(&self.entries, now);
        for key in &keys {
            self.entries.remove(key);
        }
        self.stats.record_expirations(keys.len());
        keys.len()
    }

    fn evict_overflow(&mut self, protected: Option<&str>) -> usize {
        let victims = select_victims(&self.entries, self.max_entries, protected);
        for key in &victims {
            self.entries.remove(key);
            debug!(key = %key, "Evicted cache entry");
        }
        self.stats.record_evictions(victims.len());
        victims.len()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Inspection ==
    /// Whether a live (unexpired) entry exists for `key`. Does not remove anything.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired())
    }

    /// Raw entry access, including entries that have expired but not yet been swept.
    pub fn entry(&self, key: &str) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries kept after an insert or sweep.
    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    /// TTL applied when `EntryOptions::ttl` is unset.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}

impl<V: Clone> VolatileCache<V> {
    // == Get Item ==
    /// Returns the stored value if present and unexpired.
    ///
    /// An expired entry is deleted by the read itself.
    pub fn get_item(&mut self, key: &str) -> Option<V> {
        let now = current_timestamp_ms();

        match self.entries.get(key) {
            Some(entry) if entry.is_expired_at(now) => {
                self.entries.remove(key);
                self.stats.record_expirations(1);
                self.stats.record_miss();
                self.stats.set_total_entries(self.entries.len());
                None
            }
            Some(entry) => {
                self.stats.record_hit();
                Some(entry.data.clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }
}
