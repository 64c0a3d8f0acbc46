//! `CacheEntry<T>` (§3): `size_estimate >= 0`; expired when
//! `now - created_at > ttl_seconds`; hits are monotonic.

use serde::Serialize;

#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub data: T,
    pub created_at: i64,
    pub ttl_seconds: u64,
    pub hits: u64,
    pub size_estimate: usize,
    /// Monotonically increasing recency key; higher means more recently
    /// touched. Used as the LRU ordering key.
    pub recency: u64,
}

impl<T> CacheEntry<T> {
    pub fn new(data: T, ttl_seconds: u64, size_estimate: usize, recency: u64) -> Self {
        Self {
            data,
            created_at: chrono::Utc::now().timestamp(),
            ttl_seconds,
            hits: 0,
            size_estimate,
            recency,
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now - self.created_at > self.ttl_seconds as i64
    }
}

/// Size estimate used by `set`: character count for strings, canonical-form
/// length for structured values, 8 bytes for primitives (§4.2).
pub fn size_estimate<T: Serialize>(value: &T) -> usize {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s.chars().count(),
        Ok(v @ serde_json::Value::Object(_)) | Ok(v @ serde_json::Value::Array(_)) => {
            serde_json::to_string(&v).map(|s| s.len()).unwrap_or(8)
        }
        _ => 8,
    }
}
