use async_trait::async_trait;
use serde_json::Value;

pub const AIRPORTS_TTL_SECONDS: u64 = 600;
pub const FLIGHT_DETAIL_TTL_SECONDS: u64 = 180;
pub const SEARCH_TTL_SECONDS: u64 = 120;

pub const SEARCH_KEY_PREFIX: &str = "search:";
pub const AIRPORTS_KEY: &str = "airports";

pub fn flight_detail_key(id: uuid::Uuid) -> String {
    format!("flight:{}", id)
}

/// Best-effort read-through cache. Implementations must never raise: a
/// backend failure degrades reads to a miss and reports writes as false.
/// The cache is never a source of truth; reservation capacity checks bypass
/// it entirely.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Option<Value>;

    async fn set(&self, key: &str, value: &Value, ttl_seconds: u64) -> bool;

    async fn del(&self, key: &str) -> bool;

    /// Deletes every key under the prefix, returning how many went away.
    async fn del_by_prefix(&self, prefix: &str) -> u64;
}

/// No-op cache for wiring paths that run without a backend.
pub struct NullCache;

#[async_trait]
impl Cache for NullCache {
    async fn get(&self, _key: &str) -> Option<Value> {
        None
    }

    async fn set(&self, _key: &str, _value: &Value, _ttl_seconds: u64) -> bool {
        false
    }

    async fn del(&self, _key: &str) -> bool {
        false
    }

    async fn del_by_prefix(&self, _prefix: &str) -> u64 {
        0
    }
}
