//! Database model for key/value rows.

use chrono::NaiveDateTime;
use diesel::prelude::*;

/// One row of `kv_store`.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::kv_store)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct KvEntryDB {
    pub key: String,
    pub value: Vec<u8>,
    pub updated_at: NaiveDateTime,
}

impl KvEntryDB {
    pub fn new(key: &str, value: Vec<u8>) -> Self {
        KvEntryDB {
            key: key.to_string(),
            value,
            updated_at: chrono::Utc::now().naive_utc(),
        }
    }
}
