//! In-memory preview cache
//!
//! - `key`: deterministic, filesystem-safe cache keys
//! - `list`: arena-backed recency list with stable node ids
//! - `lru`: the mutex-guarded LRU cache built on the two

pub mod key;
pub mod list;
pub mod lru;

pub use key::CacheKey;
pub use list::{NodeId, RecencyList};
pub use lru::{CacheStats, LruCache};
