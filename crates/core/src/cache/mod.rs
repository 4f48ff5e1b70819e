//! Cache module - TTL cache over a pluggable key/value store.

mod cache_model;
mod cache_traits;
mod freshness_cache;
mod memory_store;


pub use cache_model::{CacheEntry, CachedValue};
pub use cache_traits::KeyValueStore;
pub use freshness_cache::{FreshnessCache, CACHE_KEY_PREFIX};
pub use memory_store::InMemoryKeyValueStore;
