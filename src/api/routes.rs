//! API Routes
//!
//! Configures the Axum router with all diagnostics endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_cache_handler, get_item_handler, health_handler, image_cleanup_handler,
    image_clear_handler, image_handler, invalidate_prefix_handler, lifecycle_handler,
    preload_handler, remove_item_handler, set_item_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /cache/items` - Store a value
/// - `DELETE /cache/items` - Clear the volatile cache
/// - `GET /cache/items/:key` - Read a value
/// - `DELETE /cache/items/:key` - Remove a value
/// - `DELETE /cache/prefix/:prefix` - Remove every key with a prefix
/// - `POST /cache/preload` - Batch insert
/// - `GET /images?url=` - Load an image through the persistent cache
/// - `DELETE /images` - Clear the persistent image cache
/// - `POST /images/cleanup` - Drop stale images now
/// - `POST /lifecycle/:state` - Report an app foreground/background transition
/// - `GET /stats` - Cache statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/cache/items",
            put(set_item_handler).delete(clear_cache_handler),
        )
        .route(
            "/cache/items/:key",
            get(get_item_handler).delete(remove_item_handler),
        )
        .route("/cache/prefix/:prefix", delete(invalidate_prefix_handler))
        .route("/cache/preload", post(preload_handler))
        .route("/images", get(image_handler).delete(image_clear_handler))
        .route("/images/cleanup", post(image_cleanup_handler))
        .route("/lifecycle/:state", post(lifecycle_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::image::{HttpFetcher, MemoryStorage};
    use crate::lifecycle::CacheSubsystem;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use std::time::Duration;
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        let subsystem = CacheSubsystem::mount(
            &Config::default(),
            Arc::new(MemoryStorage::new()),
            Arc::new(HttpFetcher::new(Duration::from_secs(1)).unwrap()),
        );
        create_router(AppState::new(subsystem))
    }

    async fn status_of(app: Router, method: &str, uri: &str, body: Body) -> StatusCode {
        app.oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(body)
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let status = status_of(create_test_app(), "GET", "/health", Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let status = status_of(create_test_app(), "GET", "/stats", Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_set_endpoint() {
        let body = Body::from(r#"{"key":"test","value":{"name":"Ann"}}"#);
        let status = status_of(create_test_app(), "PUT", "/cache/items", body).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let status = status_of(create_test_app(), "GET", "/cache/items/nonexistent", Body::empty()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_lifecycle_endpoint() {
        let app = create_test_app();
        let status = status_of(app.clone(), "POST", "/lifecycle/background", Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        let status = status_of(app, "POST", "/lifecycle/bogus", Body::empty()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_image_fetch_failure_is_bad_gateway() {
        let uri = "/images?url=http%3A%2F%2F127.0.0.1%3A1%2Fmissing.png";
        let status = status_of(create_test_app(), "GET", uri, Body::empty()).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }
}
