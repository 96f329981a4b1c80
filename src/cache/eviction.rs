//! Eviction Policy Module
//!
//! Chooses which volatile cache entries to drop: expired entries first, then
//! lowest priority, then oldest.

use std::collections::HashMap;

use crate::cache::CacheEntry;

// == Expired Keys ==
/// Returns every key whose TTL has elapsed at `now`.
pub fn expired_keys<V>(entries: &HashMap<String, CacheEntry<V>>, now: u64) -> Vec<String> {
    entries
        .iter()
        .filter(|(_, entry)| entry.is_expired_at(now))
        .map(|(key, _)| key.clone())
        .collect()
}

// == Select Victims ==
/// Picks the keys to evict so that the remaining entries fit in `capacity`.
///
/// Candidates are ordered by priority ascending, then `created_at` ascending,
/// then insertion order. The `protected` key (the entry whose insertion
/// triggered the pass) is only chosen once every other entry is gone, which
/// can only happen with a capacity of zero.
pub fn select_victims<V>(
    entries: &HashMap<String, CacheEntry<V>>,
    capacity: usize,
    protected: Option<&str>,
) -> Vec<String> {
    let overflow = entries.len().saturating_sub(capacity);
    if overflow == 0 {
        return Vec::new();
    }

    let mut candidates: Vec<(&String, &CacheEntry<V>)> = entries
        .iter()
        .filter(|(key, _)| Some(key.as_str()) != protected)
        .collect();
    candidates.sort_by_key(|(_, entry)| entry.eviction_rank());

    let mut victims: Vec<String> = candidates
        .into_iter()
        .take(overflow)
        .map(|(key, _)| key.clone())
        .collect();

    if victims.len() < overflow {
        if let Some(key) = protected.filter(|key| entries.contains_key(*key)) {
            victims.push(key.to_string());
        }
    }

    victims
}
