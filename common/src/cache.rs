use std::time::Duration;

use redis::{
    aio::MultiplexedConnection, AsyncCommands, ConnectionAddr, ConnectionInfo, RedisConnectionInfo,
};
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::utils::config::AppConfig;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Key for a cached answer: SHA-256 of the composite string, lower hex.
pub fn cache_key(composite: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(composite.as_bytes());
    let digest = hasher.finalize();
    format!("{:x}", digest)
}

/// Redis-backed answer cache.
///
/// A failed connection degrades the cache to a no-op instead of failing the
/// service: every lookup misses and every write is dropped. Entries expire
/// through their TTL and are never deleted explicitly.
#[derive(Clone)]
pub struct QueryCache {
    conn: Option<MultiplexedConnection>,
}

impl QueryCache {
    pub async fn connect(config: &AppConfig) -> Self {
        match Self::open(config).await {
            Ok(conn) => {
                info!(
                    "Connected to Redis at {}:{}",
                    config.redis_host, config.redis_port
                );
                Self { conn: Some(conn) }
            }
            Err(error) => {
                warn!("Redis unavailable, caching disabled: {}", error);
                Self { conn: None }
            }
        }
    }

    /// Cache handle with no backing connection; lookups miss and writes drop.
    pub fn disconnected() -> Self {
        Self { conn: None }
    }

    async fn open(config: &AppConfig) -> Result<MultiplexedConnection, redis::RedisError> {
        let info = ConnectionInfo {
            addr: ConnectionAddr::Tcp(config.redis_host.clone(), config.redis_port),
            redis: RedisConnectionInfo {
                password: Some(config.redis_password.clone()),
                ..Default::default()
            },
        };
        let client = redis::Client::open(info)?;

        let mut conn =
            tokio::time::timeout(CONNECT_TIMEOUT, client.get_multiplexed_async_connection())
                .await
                .map_err(|_| {
                    redis::RedisError::from((redis::ErrorKind::IoError, "connection timed out"))
                })??;

        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(conn)
    }

    pub fn is_degraded(&self) -> bool {
        self.conn.is_none()
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut conn = self.conn.clone()?;

        let payload: Option<String> = match conn.get(key).await {
            Ok(value) => value,
            Err(error) => {
                warn!("Redis GET failed for {}: {}", key, error);
                return None;
            }
        };

        match serde_json::from_str(&payload?) {
            Ok(value) => Some(value),
            Err(error) => {
                warn!("Discarding undecodable cache entry {}: {}", key, error);
                None
            }
        }
    }

    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u64) -> bool {
        let Some(mut conn) = self.conn.clone() else {
            return false;
        };

        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(error) => {
                warn!("Failed to encode cache entry {}: {}", key, error);
                return false;
            }
        };

        let result: Result<(), redis::RedisError> = conn.set_ex(key, payload, ttl_secs).await;
        match result {
            Ok(()) => true,
            Err(error) => {
                warn!("Redis SETEX failed for {}: {}", key, error);
                false
            }
        }
    }
}
