use crate::{CacheEntry, Lookup, expiry_after};
use moka::future::Cache;
use shared::Clock;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Moka-backed keyed store with per-entry expiry and stale retention.
///
/// Moka's own TTL would evict expired values, so the map is unbounded and
/// expiry lives in [`CacheEntry::expires_at`] instead. The keyspace is small
/// (channel handles, a few domain-wide slots) so no eviction policy is set.
pub struct TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    name: String,
    entries: Cache<String, CacheEntry<V>>,
    clock: Arc<dyn Clock>,
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        let name = name.into();
        let entries = Cache::builder().name(&name).build();
        Self {
            name,
            entries,
            clock,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn lookup(&self, key: &str) -> Lookup<V> {
        match self.entries.get(key).await {
            Some(entry) if entry.is_fresh(self.clock.now()) => {
                debug!("cache {} hit: {}", self.name, key);
                Lookup::Fresh(entry.data)
            }
            Some(entry) => {
                debug!("cache {} stale: {}", self.name, key);
                Lookup::Stale(entry.data)
            }
            None => {
                debug!("cache {} miss: {}", self.name, key);
                Lookup::Miss
            }
        }
    }

    /// Fresh value only; stale or absent entries read as `None`.
    pub async fn get(&self, key: &str) -> Option<V> {
        self.lookup(key).await.into_fresh()
    }

    pub async fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let entry = CacheEntry::new(value, self.clock.now(), ttl);
        self.entries.insert(key.into(), entry).await;
    }

    /// True when the key is absent or past its expiry.
    pub async fn is_stale(&self, key: &str) -> bool {
        !matches!(self.lookup(key).await, Lookup::Fresh(_))
    }

    /// Push the expiry of an existing entry to `now + ttl`. Returns false if
    /// there is nothing to re-stamp.
    pub async fn restamp(&self, key: &str, ttl: Duration) -> bool {
        match self.entries.get(key).await {
            Some(mut entry) => {
                entry.expires_at = expiry_after(self.clock.now(), ttl);
                self.entries.insert(key.to_string(), entry).await;
                true
            }
            None => false,
        }
    }

    pub async fn invalidate(&self, key: &str) {
        self.entries.invalidate(key).await;
    }

    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }
}

impl<V> Debug for TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("name", &self.name)
            .field("entry_count", &self.entries.entry_count())
            .finish()
    }
}
