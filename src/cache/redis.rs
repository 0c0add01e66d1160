use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};

use super::{CacheBackend, CacheError};

const SCAN_BATCH: usize = 100;

/// Redis-backed cache. Every key is stored under `<namespace>:`.
pub struct RedisCache {
    connection: MultiplexedConnection,
    namespace: String,
}

impl RedisCache {
    pub async fn connect(url: &str, namespace: &str) -> Result<Self, CacheError> {
        let client = Client::open(url)?;
        let connection = client.get_multiplexed_async_connection().await?;

        tracing::info!(namespace = %namespace, "Connected to Redis");
        Ok(Self {
            connection,
            namespace: namespace.to_string(),
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(self.key(key)).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        // SET EX rejects zero
        let seconds = ttl.as_secs().max(1);
        let _: () = conn.set_ex(self.key(key), value, seconds).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        let _: () = conn.del(self.key(key)).await?;
        Ok(())
    }

    async fn remove_by_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        let mut conn = self.connection.clone();
        let pattern = format!("{}*", self.key(prefix));
        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                let deleted: u64 = conn.del(&keys).await?;
                removed += deleted;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        tracing::debug!(pattern = %pattern, removed, "Removed cache keys by prefix");
        Ok(removed)
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
