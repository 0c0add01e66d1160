use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::error::AppError;
use super::{CacheBackend, MemoryCache};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
}

/// Get-or-create facade over a cache backend.
///
/// Backend failures are logged and counted but never surface to the caller:
/// a failed read falls through to the factory, a failed write or
/// invalidation is dropped.
#[derive(Clone)]
pub struct CacheService {
    backend: Arc<dyn CacheBackend>,
    default_ttl: Duration,
    counters: Arc<Counters>,
}

impl CacheService {
    pub fn new(backend: Arc<dyn CacheBackend>, default_ttl: Duration) -> Self {
        Self {
            backend,
            default_ttl,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn in_memory(default_ttl: Duration) -> Self {
        Self::new(Arc::new(MemoryCache::new()), default_ttl)
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            errors: self.counters.errors.load(Ordering::Relaxed),
        }
    }

    /// Return the cached value for `key`, or run `factory`, cache its result
    /// and return it. Factory errors propagate and are not cached.
    pub async fn get_or_create<T, F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        factory: F,
    ) -> Result<T, AppError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        match self.backend.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                Ok(value) => {
                    self.counters.hits.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(key = %key, "Cache hit");
                    return Ok(value);
                }
                Err(e) => {
                    self.counters.errors.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(key = %key, error = %e, "Discarding undecodable cache entry");
                }
            },
            Ok(None) => {}
            Err(e) => {
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(key = %key, error = %e, "Cache read failed");
            }
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        let value = factory().await?;

        match serde_json::to_string(&value) {
            Ok(raw) => {
                let ttl = ttl.unwrap_or(self.default_ttl);
                if let Err(e) = self.backend.set(key, raw, ttl).await {
                    self.counters.errors.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(key = %key, error = %e, "Cache write failed");
                }
            }
            Err(e) => {
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(key = %key, error = %e, "Value not cacheable");
            }
        }

        Ok(value)
    }

    pub async fn invalidate(&self, key: &str) {
        if let Err(e) = self.backend.remove(key).await {
            self.counters.errors.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(key = %key, error = %e, "Cache invalidation failed");
        }
    }

    pub async fn invalidate_prefix(&self, prefix: &str) {
        match self.backend.remove_by_prefix(prefix).await {
            Ok(removed) => {
                tracing::debug!(prefix = %prefix, removed, "Invalidated cache prefix");
            }
            Err(e) => {
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(prefix = %prefix, error = %e, "Cache prefix invalidation failed");
            }
        }
    }

    pub async fn purge_expired(&self) -> u64 {
        match self.backend.purge_expired().await {
            Ok(purged) => purged,
            Err(e) => {
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(error = %e, "Cache purge failed");
                0
            }
        }
    }

    /// Purge expired entries every `every` until the task is aborted.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let purged = cache.purge_expired().await;
                if purged > 0 {
                    tracing::debug!(backend = cache.backend_name(), purged, "Purged expired cache entries");
                }
            }
        })
    }

    pub async fn is_healthy(&self) -> bool {
        self.backend.ping().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheError;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicU32;

    struct BrokenBackend;

    #[async_trait]
    impl CacheBackend for BrokenBackend {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(serde_json::from_str::<u8>("x").unwrap_err().into())
        }

        async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
            Err(serde_json::from_str::<u8>("x").unwrap_err().into())
        }

        async fn remove(&self, _key: &str) -> Result<(), CacheError> {
            Err(serde_json::from_str::<u8>("x").unwrap_err().into())
        }

        async fn remove_by_prefix(&self, _prefix: &str) -> Result<u64, CacheError> {
            Err(serde_json::from_str::<u8>("x").unwrap_err().into())
        }
    }

    #[tokio::test]
    async fn test_get_or_create_runs_factory_once() {
        let cache = CacheService::in_memory(Duration::from_secs(60));
        let calls = AtomicU32::new(0);

        for _ in 0..3 {
            let value: u32 = cache
                .get_or_create("answer", None, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(42)
                })
                .await
                .unwrap();
            assert_eq!(value, 42);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().hits, 2);
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_factory_errors_are_not_cached() {
        let cache = CacheService::in_memory(Duration::from_secs(60));

        let result: Result<u32, AppError> = cache
            .get_or_create("k", None, || async { Err(AppError::business("nope")) })
            .await;
        assert!(result.is_err());

        let value: u32 = cache.get_or_create("k", None, || async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_invalidate_forces_reload() {
        let cache = CacheService::in_memory(Duration::from_secs(60));
        let _: u32 = cache.get_or_create("k", None, || async { Ok(1) }).await.unwrap();

        cache.invalidate("k").await;
        let value: u32 = cache.get_or_create("k", None, || async { Ok(2) }).await.unwrap();
        assert_eq!(value, 2);
    }

    #[tokio::test]
    async fn test_backend_failures_never_fail_the_request() {
        let cache = CacheService::new(Arc::new(BrokenBackend), Duration::from_secs(60));

        let value: String = cache
            .get_or_create("k", None, || async { Ok("fresh".to_string()) })
            .await
            .unwrap();
        assert_eq!(value, "fresh");

        cache.invalidate("k").await;
        cache.invalidate_prefix("k").await;
        assert_eq!(cache.stats().errors, 4);
    }

    #[tokio::test]
    async fn test_sweeper_evicts_keys_that_are_never_read_again() {
        let backend = Arc::new(MemoryCache::new());
        let cache = CacheService::new(backend.clone(), Duration::from_millis(5));
        for limit in 1..=3u32 {
            let key = format!("analytics:sales:0:1:{}", limit);
            let _: u32 = cache.get_or_create(&key, None, || async move { Ok(limit) }).await.unwrap();
        }
        assert_eq!(backend.len(), 3);

        let sweeper = cache.spawn_sweeper(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(50)).await;
        sweeper.abort();

        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_replaced() {
        let backend = Arc::new(MemoryCache::new());
        backend
            .set("k", "not json".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        let cache = CacheService::new(backend, Duration::from_secs(60));

        let value: u32 = cache.get_or_create("k", None, || async { Ok(5) }).await.unwrap();
        assert_eq!(value, 5);
        let again: u32 = cache.get_or_create("k", None, || async { Ok(6) }).await.unwrap();
        assert_eq!(again, 5);
    }
}
