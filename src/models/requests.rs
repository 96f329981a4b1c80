//! Request DTOs for the diagnostics API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;
use serde_json::Value;

use crate::cache::{EntryOptions, Priority, PreloadItem};

/// Request body for `PUT /cache/items`
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: Any JSON value
/// - `ttl_ms`: Optional TTL in milliseconds; zero or negative disables expiry
/// - `priority`: Optional eviction tier (`low`, `medium`, `high`)
#[derive(Debug, Clone, Deserialize)]
pub struct SetItemRequest {
    pub key: String,
    pub value: Value,
    #[serde(default)]
    pub ttl_ms: Option<i64>,
    #[serde(default)]
    pub priority: Option<Priority>,
}

impl SetItemRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        None
    }

    pub fn options(&self) -> EntryOptions {
        EntryOptions::from_ttl_ms(self.ttl_ms, self.priority)
    }

    pub fn into_preload_item(self) -> PreloadItem {
        let options = self.options();
        PreloadItem::new(self.key, self.value, options)
    }
}

/// Request body for `POST /cache/preload`
#[derive(Debug, Clone, Deserialize)]
pub struct PreloadRequest {
    pub items: Vec<SetItemRequest>,
}

impl PreloadRequest {
    pub fn validate(&self) -> Option<String> {
        self.items
            .iter()
            .enumerate()
            .find_map(|(i, item)| item.validate().map(|msg| format!("items[{}]: {}", i, msg)))
    }
}

/// Query string for `GET /images`
#[derive(Debug, Clone, Deserialize)]
pub struct ImageQuery {
    pub url: String,
}
