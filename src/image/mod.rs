//! Persistent Image Cache Module
//!
//! URL -> encoded image content, persisted through a key/value storage
//! primitive and refreshed over HTTP on a miss.

mod fetcher;
mod storage;
mod store;

pub use fetcher::{FetchedImage, HttpFetcher, ImageFetcher};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use store::{CachedImage, ImageLoadState, PersistentImageCache, IMAGE_CACHE_KEY, LAST_CLEANUP_KEY};
