//! API Module
//!
//! Diagnostics/admin HTTP surface over the mounted cache subsystem, used by
//! the embedding shell to report lifecycle transitions and by operators to
//! inspect or reset the caches.

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
