//! Storage trait consumed by the cache.

use async_trait::async_trait;

use crate::errors::Result;

/// Minimal persistent key/value interface.
///
/// Implementable atop any embedded store or browser storage API. Each call is
/// a single round trip; no multi-step transactions are required. Concurrent
/// writes to the same key are last-write-wins.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the bytes stored under `key`, or `None` when absent.
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn write(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Removes `key` only if it still holds exactly `expected`. Returns
    /// whether a row was removed.
    ///
    /// The default reads then deletes, which leaves a window for a concurrent
    /// write to be lost. Stores able to compare and delete in one step
    /// should override it.
    async fn delete_if_unchanged(&self, key: &str, expected: &[u8]) -> Result<bool> {
        match self.read(key).await? {
            Some(current) if current == expected => {
                self.delete(key).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Lists every stored key.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Lists keys starting with `prefix`.
    ///
    /// Default implementation filters `keys()`. Stores with an index may override.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .keys()
            .await?
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect())
    }
}
