//! Response DTOs for the diagnostics API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheStats;
use crate::tasks::MaintenanceState;

/// Response body for `GET /cache/items/:key`
#[derive(Debug, Clone, Serialize)]
pub struct GetItemResponse {
    pub key: String,
    pub value: Value,
}

impl GetItemResponse {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Response body for `PUT /cache/items`
#[derive(Debug, Clone, Serialize)]
pub struct SetItemResponse {
    pub message: String,
    pub key: String,
}

impl SetItemResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
        }
    }
}

/// Response body for removal endpoints (single key, prefix, clear, cleanup)
#[derive(Debug, Clone, Serialize)]
pub struct RemovedResponse {
    /// Number of entries removed
    pub removed: usize,
}

impl RemovedResponse {
    pub fn new(removed: usize) -> Self {
        Self { removed }
    }
}

/// Response body for `GET /images`
#[derive(Debug, Clone, Serialize)]
pub struct ImageResponse {
    pub url: String,
    /// Encoded image (`data:` URI)
    pub data: String,
}

/// Response body for `GET /stats`
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub total_entries: usize,
    pub max_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    pub stored_images: usize,
    pub image_maintenance: MaintenanceState,
}

impl StatsResponse {
    pub fn new(
        stats: &CacheStats,
        max_entries: usize,
        stored_images: usize,
        image_maintenance: MaintenanceState,
    ) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            expirations: stats.expirations,
            total_entries: stats.total_entries,
            max_entries,
            hit_rate: stats.hit_rate(),
            stored_images,
            image_maintenance,
        }
    }
}

/// Response body for `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
