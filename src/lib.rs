//! Workforce Cache - client-side caching layer
//!
//! A TTL/priority in-memory cache for remote store reads and a persistent,
//! self-cleaning image cache, mounted and unmounted with the application.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod image;
pub mod lifecycle;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use lifecycle::CacheSubsystem;
pub use tasks::spawn_sweep_task;
