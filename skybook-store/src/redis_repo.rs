use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde_json::Value;
use skybook_core::cache::Cache;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Per-command budget; a slow backend degrades to a miss, not a stall.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(3);
const SCAN_BATCH: usize = 100;

/// Read-through cache over Redis. Never raises to callers: every failure
/// path logs and reports a miss (reads) or false/zero (writes).
#[derive(Clone)]
pub struct RedisCache {
    client: redis::Client,
}

impl RedisCache {
    pub fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    async fn connection(&self) -> Option<MultiplexedConnection> {
        match timeout(COMMAND_TIMEOUT, self.client.get_multiplexed_async_connection()).await {
            Ok(Ok(conn)) => Some(conn),
            Ok(Err(e)) => {
                warn!(error = %e, "redis connection failed, cache degraded");
                None
            }
            Err(_) => {
                warn!("redis connection timed out, cache degraded");
                None
            }
        }
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Option<Value> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = match timeout(COMMAND_TIMEOUT, conn.get(key)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                warn!(key, error = %e, "redis GET failed");
                return None;
            }
            Err(_) => {
                warn!(key, "redis GET timed out");
                return None;
            }
        };
        let raw = raw?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "cache entry is not valid JSON, treating as miss");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &Value, ttl_seconds: u64) -> bool {
        let Some(mut conn) = self.connection().await else {
            return false;
        };
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key, error = %e, "cache value failed to serialize");
                return false;
            }
        };
        match timeout(
            COMMAND_TIMEOUT,
            conn.set_ex::<_, _, ()>(key, payload, ttl_seconds),
        )
        .await
        {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!(key, error = %e, "redis SETEX failed");
                false
            }
            Err(_) => {
                warn!(key, "redis SETEX timed out");
                false
            }
        }
    }

    async fn del(&self, key: &str) -> bool {
        let Some(mut conn) = self.connection().await else {
            return false;
        };
        match timeout(COMMAND_TIMEOUT, conn.del::<_, i64>(key)).await {
            Ok(Ok(removed)) => removed > 0,
            Ok(Err(e)) => {
                warn!(key, error = %e, "redis DEL failed");
                false
            }
            Err(_) => {
                warn!(key, "redis DEL timed out");
                false
            }
        }
    }

    async fn del_by_prefix(&self, prefix: &str) -> u64 {
        let Some(mut conn) = self.connection().await else {
            return 0;
        };
        let pattern = format!("{}*", prefix);
        let mut cursor: u64 = 0;
        let mut deleted: u64 = 0;
        loop {
            let scanned: Result<Result<(u64, Vec<String>), _>, _> = timeout(
                COMMAND_TIMEOUT,
                redis::cmd("SCAN")
                    .arg(cursor)
                    .arg("MATCH")
                    .arg(&pattern)
                    .arg("COUNT")
                    .arg(SCAN_BATCH)
                    .query_async(&mut conn),
            )
            .await;
            let (next, keys) = match scanned {
                Ok(Ok(page)) => page,
                Ok(Err(e)) => {
                    warn!(prefix, error = %e, "redis SCAN failed");
                    break;
                }
                Err(_) => {
                    warn!(prefix, "redis SCAN timed out");
                    break;
                }
            };
            if !keys.is_empty() {
                match timeout(COMMAND_TIMEOUT, conn.del::<_, i64>(keys)).await {
                    Ok(Ok(removed)) => deleted += removed.max(0) as u64,
                    Ok(Err(e)) => {
                        warn!(prefix, error = %e, "redis DEL failed during prefix sweep");
                        break;
                    }
                    Err(_) => {
                        warn!(prefix, "redis DEL timed out during prefix sweep");
                        break;
                    }
                }
            }
            if next == 0 {
                break;
            }
            cursor = next;
        }
        debug!(prefix, deleted, "cache prefix invalidated");
        deleted
    }
}
