//! Background Tasks Module
//!
//! Contains background tasks that run periodically while the subsystem is mounted.
//!
//! # Tasks
//! - Sweep: removes expired volatile entries and re-applies the capacity bound
//! - Maintenance: cleans stale persisted images on a timer and on app foreground

mod maintenance;
mod sweep;

pub use maintenance::{check_and_clean, AppLifecycle, ImageCacheMaintenance, MaintenanceState};
pub use sweep::spawn_sweep_task;
