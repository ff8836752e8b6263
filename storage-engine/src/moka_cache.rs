use async_trait::async_trait;
use marquee::ports::CacheStore;
use moka::future::Cache;
use shared::{Error, Result};
use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;

/// Moka-based cache implementation with a single TTL for every entry.
///
/// Expired entries are never returned: moka treats them as absent on read
/// and drops them during its own maintenance, so no sweeper task is needed.
pub struct MokaCache<K, V>
where
    K: Debug + Hash + Eq + Send + Sync + 'static,
    V: Debug + Send + Sync + Clone + 'static,
{
    cache: Cache<K, V>,
    ttl: Duration,
}

impl<K, V> MokaCache<K, V>
where
    K: Debug + Hash + Eq + Send + Sync + 'static,
    V: Debug + Send + Sync + Clone + 'static,
{
    /// Create an unbounded cache whose entries live for `ttl` after each write.
    pub fn new(name: &str, ttl: Duration) -> Self {
        let cache = Cache::builder().name(name).time_to_live(ttl).build();

        tracing::info!("Response cache '{}' ready (ttl={:?})", name, ttl);

        Self { cache, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Apply pending maintenance, including eviction of expired entries.
    pub async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }
}

#[async_trait]
impl<K, V> CacheStore<K, V> for MokaCache<K, V>
where
    K: Debug + Hash + Eq + Send + Sync + 'static,
    V: Debug + Send + Sync + Clone + 'static,
{
    async fn put(&self, key: K, val: V) -> Result<()> {
        self.cache.insert(key, val).await;
        Ok(())
    }

    async fn get(&self, key: &K) -> Result<V> {
        match self.cache.get(key).await {
            Some(value) => Ok(value),
            None => Err(Error::NotFound), // Either doesn't exist or TTL expired
        }
    }
}

impl<K, V> Debug for MokaCache<K, V>
where
    K: Debug + Hash + Eq + Send + Sync + 'static,
    V: Debug + Send + Sync + Clone + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaCache")
            .field("ttl", &self.ttl)
            .field("entry_count", &self.cache.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{Duration, sleep};

    #[tokio::test]
    async fn test_moka_cache_put_and_get() {
        let cache = MokaCache::new("test", Duration::from_secs(60));

        cache.put("GET https://a.test/1", "payload").await.unwrap();

        let value = cache.get(&"GET https://a.test/1").await.unwrap();
        assert_eq!(value, "payload");
    }

    #[tokio::test]
    async fn test_moka_cache_reports_configured_ttl() {
        let cache: MokaCache<String, String> = MokaCache::new("test", Duration::from_secs(42));
        assert_eq!(cache.ttl(), Duration::from_secs(42));
        assert!(format!("{:?}", cache).contains("42s"));
    }

    #[tokio::test]
    async fn test_moka_cache_get_nonexistent() {
        let cache: MokaCache<&str, &str> = MokaCache::new("test", Duration::from_secs(60));

        let result = cache.get(&"nonexistent").await;
        assert!(matches!(result, Err(Error::NotFound)));
    }

    #[tokio::test]
    async fn test_moka_cache_overwrite() {
        let cache = MokaCache::new("test", Duration::from_secs(60));

        cache.put("key", "value1").await.unwrap();
        cache.put("key", "value2").await.unwrap();

        assert_eq!(cache.get(&"key").await.unwrap(), "value2");

        cache.run_pending_tasks().await;
        assert_eq!(cache.entry_count(), 1);
    }

    #[tokio::test]
    async fn test_moka_cache_entry_expires_after_ttl() {
        let cache = MokaCache::new("test", Duration::from_millis(100));

        cache.put("ttl_key", "ttl_value").await.unwrap();
        assert_eq!(cache.get(&"ttl_key").await.unwrap(), "ttl_value");

        sleep(Duration::from_millis(150)).await;

        let result = cache.get(&"ttl_key").await;
        assert!(matches!(result, Err(Error::NotFound)));

        // Expired entries are purged, not just hidden
        cache.run_pending_tasks().await;
        assert_eq!(cache.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_moka_cache_overwrite_restarts_ttl() {
        let cache = MokaCache::new("test", Duration::from_millis(200));

        cache.put("key", "old").await.unwrap();
        sleep(Duration::from_millis(120)).await;
        cache.put("key", "new").await.unwrap();
        sleep(Duration::from_millis(120)).await;

        assert_eq!(cache.get(&"key").await.unwrap(), "new");
    }
}
