//! Generic TTL cache over a `KeyValueStore`.
//!
//! Storage failures never reach callers: a failed read is a miss and a failed
//! write only costs a future re-fetch. Both are logged.

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use super::cache_model::{CacheEntry, CachedValue};
use super::cache_traits::KeyValueStore;
use crate::errors::Result;
use crate::utils::time_utils::Clock;

/// Prefix isolating cache rows from anything else sharing the store.
pub const CACHE_KEY_PREFIX: &str = "cache:";

#[derive(Clone)]
pub struct FreshnessCache {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl FreshnessCache {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        FreshnessCache { store, clock }
    }

    fn storage_key(key: &str) -> String {
        format!("{}{}", CACHE_KEY_PREFIX, key)
    }

    /// Reads and decodes the raw entry, returning the bytes it was decoded
    /// from. Corrupt rows are removed.
    async fn load_entry(&self, storage_key: &str) -> Option<(CacheEntry, Vec<u8>)> {
        let bytes = match self.store.read(storage_key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!("Cache read failed for {}: {}. Treating as miss.", storage_key, e);
                return None;
            }
        };

        match CacheEntry::from_bytes(&bytes) {
            Ok(entry) => Some((entry, bytes)),
            Err(e) => {
                warn!("Discarding corrupt cache entry {}: {}", storage_key, e);
                self.remove_if_unchanged(storage_key, &bytes).await;
                None
            }
        }
    }

    async fn remove(&self, storage_key: &str) -> bool {
        match self.store.delete(storage_key).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Cache delete failed for {}: {}", storage_key, e);
                false
            }
        }
    }

    /// Deletes the row only if it still holds `seen`, so a value written
    /// after the read survives.
    async fn remove_if_unchanged(&self, storage_key: &str, seen: &[u8]) -> bool {
        match self.store.delete_if_unchanged(storage_key, seen).await {
            Ok(true) => true,
            Ok(false) => {
                debug!("Cache entry {} changed since read, kept", storage_key);
                false
            }
            Err(e) => {
                warn!("Cache delete failed for {}: {}", storage_key, e);
                false
            }
        }
    }

    /// Returns the cached value for `key`, or `None` if absent or expired.
    ///
    /// Expired entries are deleted on the way out.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let storage_key = Self::storage_key(key);
        let (entry, bytes) = self.load_entry(&storage_key).await?;

        if entry.is_expired(self.clock.now()) {
            debug!("Cache entry {} expired", key);
            self.remove_if_unchanged(&storage_key, &bytes).await;
            return None;
        }

        match entry.decode() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Cache entry {} does not decode as requested type: {}", key, e);
                None
            }
        }
    }

    /// Returns the stored value regardless of expiry, without deleting it.
    pub async fn peek<T: DeserializeOwned>(&self, key: &str) -> Option<CachedValue<T>> {
        let (entry, _) = self.load_entry(&Self::storage_key(key)).await?;
        let expired = entry.is_expired(self.clock.now());
        match entry.decode() {
            Ok(value) => Some(CachedValue {
                value,
                created_at: entry.created_at,
                expires_at: entry.expires_at,
                expired,
            }),
            Err(e) => {
                warn!("Cache entry {} does not decode as requested type: {}", key, e);
                None
            }
        }
    }

    /// Stores `value` under `key` for `ttl_minutes`, replacing any existing entry.
    ///
    /// Fails only for a zero TTL or a value that cannot be serialized. Store
    /// write failures are logged and swallowed.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl_minutes: u32,
    ) -> Result<()> {
        let entry = CacheEntry::new(key, value, ttl_minutes, self.clock.now())?;
        let bytes = entry.to_bytes()?;
        if let Err(e) = self.store.write(&Self::storage_key(key), bytes).await {
            warn!("Cache write failed for {}: {}. Value not cached.", key, e);
        }
        Ok(())
    }

    /// Stores `value` under `key` with no expiry. The entry survives
    /// `clear_expired` and stays until replaced, deleted or cleared.
    pub async fn set_retained<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let entry = CacheEntry::retained(key, value, self.clock.now())?;
        let bytes = entry.to_bytes()?;
        if let Err(e) = self.store.write(&Self::storage_key(key), bytes).await {
            warn!("Cache write failed for {}: {}. Value not retained.", key, e);
        }
        Ok(())
    }

    pub async fn delete(&self, key: &str) {
        self.remove(&Self::storage_key(key)).await;
    }

    async fn cache_keys(&self) -> Vec<String> {
        match self.store.keys_with_prefix(CACHE_KEY_PREFIX).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!("Failed to list cache keys: {}", e);
                Vec::new()
            }
        }
    }

    /// Removes every cache entry. Returns the number removed.
    pub async fn clear(&self) -> usize {
        let mut removed = 0;
        for storage_key in self.cache_keys().await {
            if self.remove(&storage_key).await {
                removed += 1;
            }
        }
        debug!("Cleared {} cache entries", removed);
        removed
    }

    /// Sweeps entries whose expiry has passed. Returns the number removed.
    ///
    /// A row rewritten between the read and the delete is left in place.
    pub async fn clear_expired(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;
        for storage_key in self.cache_keys().await {
            // load_entry already drops corrupt rows
            let Some((entry, bytes)) = self.load_entry(&storage_key).await else {
                continue;
            };
            if entry.is_expired(now) && self.remove_if_unchanged(&storage_key, &bytes).await {
                removed += 1;
            }
        }
        debug!("Swept {} expired cache entries", removed);
        removed
    }
}
