//! Cache Entry Module
//!
//! Defines individual volatile cache entries, their priority tier and the
//! per-insert options.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

// == Priority ==
/// Caller-assigned importance tier, used only to order eviction candidates.
///
/// Declaration order gives `Low < Medium < High`; lower tiers are evicted first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

// == Entry Options ==
/// Options accepted by `set_item`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryOptions {
    /// `None` uses the cache's default TTL, `Some(Duration::ZERO)` never expires
    pub ttl: Option<Duration>,
    pub priority: Priority,
}

impl EntryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Marks the entry as exempt from TTL expiry (still subject to eviction).
    pub fn no_expiry(mut self) -> Self {
        self.ttl = Some(Duration::ZERO);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Builds options from a signed millisecond TTL; zero or negative means no expiry.
    pub fn from_ttl_ms(ttl_ms: Option<i64>, priority: Option<Priority>) -> Self {
        Self {
            ttl: ttl_ms.map(|ms| Duration::from_millis(ms.max(0) as u64)),
            priority: priority.unwrap_or_default(),
        }
    }
}

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub data: V,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
    pub priority: Priority,
    /// Insertion order, breaks `created_at` ties within the same millisecond
    pub(crate) seq: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry stamped at `now`.
    ///
    /// A zero `ttl` leaves `expires_at` unset; any other `ttl` lasts at
    /// least one millisecond.
    pub fn new(data: V, now: u64, ttl: Duration, priority: Priority, seq: u64) -> Self {
        let expires_at = (!ttl.is_zero()).then(|| {
            let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
            now.saturating_add(ttl_ms)
        });

        Self {
            data,
            created_at: now,
            expires_at,
            priority,
            seq,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// An entry is expired once `now >= expires_at`; entries without a TTL
    /// never expire.
    pub fn is_expired_at(&self, now: u64) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    /// Checks if the entry has expired against the wall clock.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        let now = current_timestamp_ms();
        self.expires_at.map(|expires| expires.saturating_sub(now))
    }

    /// Eviction rank: entries that sort first are evicted first.
    pub(crate) fn eviction_rank(&self) -> (Priority, u64, u64) {
        (self.priority, self.created_at, self.seq)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_with_ttl() {
        let entry = CacheEntry::new("v", 1_000, Duration::from_millis(500), Priority::High, 0);

        assert_eq!(entry.created_at, 1_000);
        assert_eq!(entry.expires_at, Some(1_500));
        assert!(!entry.is_expired_at(1_499));
        assert!(entry.is_expired_at(1_500));
    }

    #[test]
    fn test_entry_zero_ttl_never_expires() {
        let entry = CacheEntry::new("v", 1_000, Duration::ZERO, Priority::Low, 0);

        assert!(entry.expires_at.is_none());
        assert!(!entry.is_expired_at(u64::MAX));
        assert!(entry.ttl_remaining_ms().is_none());
    }

    #[test]
    fn test_sub_millisecond_ttl_still_expires() {
        let entry = CacheEntry::new("v", 1_000, Duration::from_micros(500), Priority::Medium, 0);

        assert_eq!(entry.expires_at, Some(1_001));
        assert!(!entry.is_expired_at(1_000));
        assert!(entry.is_expired_at(1_001));
    }

    #[test]
    fn test_ttl_remaining_ms() {
        let now = current_timestamp_ms();
        let entry = CacheEntry::new((), now, Duration::from_secs(10), Priority::Medium, 0);

        let remaining = entry.ttl_remaining_ms().unwrap();
        assert!(remaining <= 10_000);
        assert!(remaining >= 9_000);
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Low < Priority::Medium);
        assert!(Priority::Medium < Priority::High);
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn test_priority_serde_names() {
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"high\"");
        let parsed: Priority = serde_json::from_str("\"low\"").unwrap();
        assert_eq!(parsed, Priority::Low);
    }

    #[test]
    fn test_options_from_signed_ttl() {
        let opts = EntryOptions::from_ttl_ms(Some(-5), None);
        assert_eq!(opts.ttl, Some(Duration::ZERO));
        assert_eq!(opts.priority, Priority::Medium);

        let opts = EntryOptions::from_ttl_ms(None, Some(Priority::High));
        assert_eq!(opts.ttl, None);
        assert_eq!(opts.priority, Priority::High);
    }

    #[test]
    fn test_eviction_rank_orders_priority_then_age() {
        let old_high = CacheEntry::new((), 1, Duration::ZERO, Priority::High, 0);
        let new_low = CacheEntry::new((), 9, Duration::ZERO, Priority::Low, 1);
        let old_low = CacheEntry::new((), 1, Duration::ZERO, Priority::Low, 2);

        assert!(new_low.eviction_rank() < old_high.eviction_rank());
        assert!(old_low.eviction_rank() < new_low.eviction_rank());
    }
}
