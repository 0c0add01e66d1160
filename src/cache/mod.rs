// ============================================================================
// Cache Layer
// ============================================================================
//
// Queries read through `CacheService::get_or_create`; commands invalidate
// the keys they affect after a successful save. Values are stored as JSON
// strings so any backend can hold any DTO.
//
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;

pub mod memory;
pub mod redis;
pub mod service;

pub use self::memory::MemoryCache;
pub use self::redis::RedisCache;
pub use self::service::{CacheService, CacheStats};

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait CacheBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    async fn remove(&self, key: &str) -> Result<(), CacheError>;

    /// Remove every key starting with `prefix`. Returns the number removed.
    async fn remove_by_prefix(&self, prefix: &str) -> Result<u64, CacheError>;

    /// Drop entries whose TTL has passed. Backends that expire keys
    /// themselves keep the default.
    async fn purge_expired(&self) -> Result<u64, CacheError> {
        Ok(0)
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }
}
