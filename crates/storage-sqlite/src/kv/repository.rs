use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;

use super::model::KvEntryDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::kv_store;
use marketpulse_core::cache::KeyValueStore;
use marketpulse_core::errors::Result;

/// Durable `KeyValueStore` on the `kv_store` table.
///
/// Reads go straight to the pool; writes are funneled through the single
/// writer actor.
pub struct SqliteKeyValueStore {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SqliteKeyValueStore {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        SqliteKeyValueStore { pool, writer }
    }
}

/// Escapes LIKE wildcards so `prefix` matches literally.
fn like_prefix_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = get_connection(&self.pool)?;
        let value = kv_store::table
            .filter(kv_store::key.eq(key))
            .select(kv_store::value)
            .first::<Vec<u8>>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(value)
    }

    async fn write(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let row = KvEntryDB::new(key, value);
        self.writer
            .exec(move |conn| {
                diesel::replace_into(kv_store::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.writer
            .exec(move |conn| {
                diesel::delete(kv_store::table.filter(kv_store::key.eq(key)))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn delete_if_unchanged(&self, key: &str, expected: &[u8]) -> Result<bool> {
        let key = key.to_string();
        let expected = expected.to_vec();
        self.writer
            .exec(move |conn| {
                let deleted = diesel::delete(
                    kv_store::table
                        .filter(kv_store::key.eq(key))
                        .filter(kv_store::value.eq(expected)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(deleted > 0)
            })
            .await
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut conn = get_connection(&self.pool)?;
        let keys = kv_store::table
            .select(kv_store::key)
            .order(kv_store::key.asc())
            .load::<String>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(keys)
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut conn = get_connection(&self.pool)?;
        let keys = kv_store::table
            .filter(kv_store::key.like(like_prefix_pattern(prefix)).escape('\\'))
            .select(kv_store::key)
            .order(kv_store::key.asc())
            .load::<String>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(keys)
    }
}
