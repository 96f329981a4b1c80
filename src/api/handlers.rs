//! API Handlers
//!
//! HTTP request handlers exposing the mounted cache subsystem.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::error::{CacheError, Result};
use crate::lifecycle::CacheSubsystem;
use crate::models::{
    GetItemResponse, HealthResponse, ImageQuery, ImageResponse, PreloadRequest, RemovedResponse,
    SetItemRequest, SetItemResponse, StatsResponse,
};
use crate::tasks::AppLifecycle;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub subsystem: Arc<CacheSubsystem>,
}

impl AppState {
    pub fn new(subsystem: CacheSubsystem) -> Self {
        Self {
            subsystem: Arc::new(subsystem),
        }
    }
}

/// Handler for PUT /cache/items
pub async fn set_item_handler(
    State(state): State<AppState>,
    Json(req): Json<SetItemRequest>,
) -> Result<Json<SetItemResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let options = req.options();
    let mut cache = state.subsystem.volatile().write().await;
    cache.set_item(req.key.clone(), req.value, options);

    Ok(Json(SetItemResponse::new(req.key)))
}

/// Handler for GET /cache/items/:key
///
/// A miss is reported as 404 to HTTP clients; the cache itself never errors.
pub async fn get_item_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetItemResponse>> {
    // Write lock: an expired entry is removed by the read
    let value = state.subsystem.volatile().write().await.get_item(&key);

    match value {
        Some(value) => Ok(Json(GetItemResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for DELETE /cache/items/:key
pub async fn remove_item_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<RemovedResponse> {
    let removed = state.subsystem.volatile().write().await.remove_item(&key);
    Json(RemovedResponse::new(usize::from(removed)))
}

/// Handler for DELETE /cache/items
pub async fn clear_cache_handler(State(state): State<AppState>) -> Json<RemovedResponse> {
    let mut cache = state.subsystem.volatile().write().await;
    let removed = cache.len();
    cache.clear_cache();
    Json(RemovedResponse::new(removed))
}

/// Handler for DELETE /cache/prefix/:prefix
pub async fn invalidate_prefix_handler(
    State(state): State<AppState>,
    Path(prefix): Path<String>,
) -> Json<RemovedResponse> {
    let removed = state
        .subsystem
        .volatile()
        .write()
        .await
        .invalidate_by_prefix(&prefix);
    Json(RemovedResponse::new(removed))
}

/// Handler for POST /cache/preload
pub async fn preload_handler(
    State(state): State<AppState>,
    Json(req): Json<PreloadRequest>,
) -> Result<Json<RemovedResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let mut cache = state.subsystem.volatile().write().await;
    let before = cache.stats().evictions;
    cache.preload_cache(req.items.into_iter().map(SetItemRequest::into_preload_item));

    // Reports how many entries the batch pushed out
    Ok(Json(RemovedResponse::new((cache.stats().evictions - before) as usize)))
}

/// Handler for GET /images?url=...
pub async fn image_handler(
    State(state): State<AppState>,
    Query(query): Query<ImageQuery>,
) -> Result<Json<ImageResponse>> {
    if query.url.is_empty() {
        return Err(CacheError::InvalidRequest("url cannot be empty".to_string()));
    }

    let data = state.subsystem.images().load(&query.url).await?;
    Ok(Json(ImageResponse {
        url: query.url,
        data,
    }))
}

/// Handler for POST /images/cleanup
pub async fn image_cleanup_handler(State(state): State<AppState>) -> Json<RemovedResponse> {
    let removed = state.subsystem.images().clear_expired_cache().await;
    Json(RemovedResponse::new(removed))
}

/// Handler for DELETE /images
pub async fn image_clear_handler(State(state): State<AppState>) -> Json<RemovedResponse> {
    let images = state.subsystem.images();
    let removed = images.len().await;
    images.clear_cache().await;
    Json(RemovedResponse::new(removed))
}

/// Handler for POST /lifecycle/:state
pub async fn lifecycle_handler(
    State(state): State<AppState>,
    Path(lifecycle): Path<String>,
) -> Result<Json<AppLifecycle>> {
    let lifecycle: AppLifecycle = lifecycle.parse()?;
    state.subsystem.notify_lifecycle(lifecycle);
    Ok(Json(lifecycle))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let (stats, max_entries) = {
        let cache = state.subsystem.volatile().read().await;
        (cache.stats(), cache.capacity())
    };
    let stored_images = state.subsystem.images().len().await;

    Json(StatsResponse::new(
        &stats,
        max_entries,
        stored_images,
        state.subsystem.maintenance_state(),
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::image::{FetchedImage, ImageFetcher, MemoryStorage};
    use async_trait::async_trait;
    use serde_json::json;

    struct OkFetcher;

    #[async_trait]
    impl ImageFetcher for OkFetcher {
        async fn fetch(&self, _url: &str) -> Result<FetchedImage> {
            Ok(FetchedImage {
                content_type: Some("image/jpeg".to_string()),
                bytes: b"jpg".to_vec(),
            })
        }
    }

    fn test_state() -> AppState {
        AppState::new(CacheSubsystem::mount(
            &Config::default(),
            Arc::new(MemoryStorage::new()),
            Arc::new(OkFetcher),
        ))
    }

    fn set_request(key: &str, value: serde_json::Value) -> SetItemRequest {
        serde_json::from_value(json!({ "key": key, "value": value })).unwrap()
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = test_state();

        let result = set_item_handler(State(state.clone()), Json(set_request("k", json!("v")))).await;
        assert!(result.is_ok());

        let response = get_item_handler(State(state.clone()), Path("k".to_string()))
            .await
            .unwrap();
        assert_eq!(response.value, json!("v"));
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let state = test_state();
        let result = get_item_handler(State(state), Path("nonexistent".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_remove_and_prefix_handlers() {
        let state = test_state();
        for key in ["tasks_u1", "tasks_u2", "leaves_u1"] {
            set_item_handler(State(state.clone()), Json(set_request(key, json!(1))))
                .await
                .unwrap();
        }

        let response = invalidate_prefix_handler(State(state.clone()), Path("tasks_".to_string())).await;
        assert_eq!(response.removed, 2);

        let response = remove_item_handler(State(state.clone()), Path("leaves_u1".to_string())).await;
        assert_eq!(response.removed, 1);
        let response = remove_item_handler(State(state), Path("leaves_u1".to_string())).await;
        assert_eq!(response.removed, 0);
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let state = test_state();
        let result = set_item_handler(State(state), Json(set_request("", json!(1)))).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_image_handler() {
        let state = test_state();
        let query = ImageQuery {
            url: "http://img/avatar.jpg".to_string(),
        };
        let response = image_handler(State(state.clone()), Query(query)).await.unwrap();
        assert_eq!(response.data, "data:image/jpeg;base64,anBn");

        let stats = stats_handler(State(state)).await;
        assert_eq!(stats.stored_images, 1);
    }

    #[tokio::test]
    async fn test_lifecycle_handler_rejects_unknown_state() {
        let state = test_state();
        let result = lifecycle_handler(State(state), Path("asleep".to_string())).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
