use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ValidationError};

/// One cached value with its expiry.
///
/// The value is kept as JSON text so the entry itself can be persisted by any
/// byte-oriented store. Retained entries carry no expiry and stay until
/// replaced or deleted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub key: String,
    pub serialized_value: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Serializes `value` into a new entry expiring `ttl_minutes` after `now`.
    pub fn new<T: Serialize + ?Sized>(
        key: &str,
        value: &T,
        ttl_minutes: u32,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        if ttl_minutes == 0 {
            return Err(ValidationError::ZeroTtl.into());
        }
        Ok(Self {
            key: key.to_string(),
            serialized_value: serde_json::to_string(value)?,
            expires_at: Some(now + Duration::minutes(i64::from(ttl_minutes))),
            created_at: now,
        })
    }

    /// Serializes `value` into an entry that never expires.
    pub fn retained<T: Serialize + ?Sized>(
        key: &str,
        value: &T,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        Ok(Self {
            key: key.to_string(),
            serialized_value: serde_json::to_string(value)?,
            expires_at: None,
            created_at: now,
        })
    }

    /// An entry is logically absent once `now` is past `expires_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now > expires_at)
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.serialized_value)?)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// A value read without regard to expiry, used for stale fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedValue<T> {
    pub value: T,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub expired: bool,
}
