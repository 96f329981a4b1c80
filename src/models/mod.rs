//! Request and Response models for the diagnostics API
//!
//! DTOs used for serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{ImageQuery, PreloadRequest, SetItemRequest};
pub use responses::{
    GetItemResponse, HealthResponse, ImageResponse, RemovedResponse, SetItemResponse,
    StatsResponse,
};
