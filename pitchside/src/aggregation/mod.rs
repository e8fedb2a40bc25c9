pub mod channels;
pub mod news;
pub mod scores;
pub mod videos;

pub use channels::ChannelDirectory;
pub use news::{NewsAggregator, merge_news};
pub use scores::{ProviderFailure, ScoreAggregator, ScoreFailover, ScoreOutcome};
pub use videos::VideoAggregator;

use shared::Result;
use std::future::Future;
use std::time::Duration;
use storage_engine::{Lookup, TtlCache};
use tracing::warn;

/// How long a refreshed value stays fresh, and how long a stale value is
/// re-stamped for after a failed refresh (zero disables re-stamping).
#[derive(Clone, Copy, Debug)]
pub struct Freshness {
    pub ttl: Duration,
    pub stale_restamp: Duration,
}

impl Freshness {
    pub fn new(ttl: Duration, stale_restamp: Duration) -> Self {
        Self { ttl, stale_restamp }
    }
}

/// Serve `key` from cache, refreshing it with `fetch` when it is missing or
/// expired.
///
/// A recoverable refresh failure (upstream error, quota denial, not found)
/// falls back to the stale value when one is held. Otherwise the error is
/// returned and nothing is cached.
pub async fn cached_or_refresh<V, F, Fut>(
    cache: &TtlCache<V>,
    key: &str,
    freshness: Freshness,
    fetch: F,
) -> Result<V>
where
    V: Clone + Send + Sync + 'static,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V>>,
{
    let stale = match cache.lookup(key).await {
        Lookup::Fresh(value) => return Ok(value),
        Lookup::Stale(value) => Some(value),
        Lookup::Miss => None,
    };

    match fetch().await {
        Ok(value) => {
            cache.set(key, value.clone(), freshness.ttl).await;
            Ok(value)
        }
        Err(err) => match stale {
            Some(value) if err.is_recoverable() => {
                warn!(
                    "refresh of {}/{} failed ({}), serving stale data",
                    cache.name(),
                    key,
                    err
                );
                if !freshness.stale_restamp.is_zero() {
                    cache.restamp(key, freshness.stale_restamp).await;
                }
                Ok(value)
            }
            _ => Err(err),
        },
    }
}
