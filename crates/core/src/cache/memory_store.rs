//! In-process `KeyValueStore` backed by `DashMap`.

use async_trait::async_trait;
use dashmap::DashMap;

use super::cache_traits::KeyValueStore;
use crate::errors::Result;

/// Volatile store for tests and hosts without persistent storage.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    entries: DashMap<String, Vec<u8>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn write(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn delete_if_unchanged(&self, key: &str, expected: &[u8]) -> Result<bool> {
        Ok(self
            .entries
            .remove_if(key, |_, current| current.as_slice() == expected)
            .is_some())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.iter().map(|e| e.key().clone()).collect())
    }
}
