use super::{Freshness, cached_or_refresh};
use crate::domain::NewsRecord;
use crate::ports::FeedFetcher;
use futures::future::join_all;
use shared::config::{CacheTtls, FeedConfig};
use shared::{Clock, Error, Result};
use std::collections::HashSet;
use std::sync::Arc;
use storage_engine::TtlCache;
use tracing::{info, warn};

pub struct NewsAggregator {
    fetcher: Arc<dyn FeedFetcher>,
    feeds: Vec<FeedConfig>,
    cache: TtlCache<Vec<NewsRecord>>,
    ttls: CacheTtls,
}

impl NewsAggregator {
    pub const LIMIT: usize = 150;

    const KEY: &'static str = "news";

    pub fn new(
        fetcher: Arc<dyn FeedFetcher>,
        feeds: Vec<FeedConfig>,
        ttls: CacheTtls,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            fetcher,
            feeds,
            cache: TtlCache::new("news", clock),
            ttls,
        }
    }

    /// Merged headlines across all feeds. Never fails: with no fresh, stale or
    /// fetchable data the list is empty.
    pub async fn latest(&self) -> Vec<NewsRecord> {
        let freshness = Freshness::new(self.ttls.news, self.ttls.stale_restamp);

        let result = cached_or_refresh(&self.cache, Self::KEY, freshness, || async {
            let fetches = self.feeds.iter().map(|feed| async move {
                match self.fetcher.fetch(feed).await {
                    Ok(records) => Some(records),
                    Err(err) => {
                        warn!("feed {} ({}) failed: {}", feed.name, feed.url, err);
                        None
                    }
                }
            });
            let batches = join_all(fetches).await;

            if !batches.is_empty() && batches.iter().all(Option::is_none) {
                return Err(Error::UpstreamUnavailable("every news feed failed".into()));
            }

            let merged = merge_news(batches.into_iter().flatten().collect());
            info!("merged {} news items from {} feeds", merged.len(), self.feeds.len());
            Ok(merged)
        })
        .await;

        result.unwrap_or_else(|err| {
            warn!("news unavailable, returning empty list: {}", err);
            Vec::new()
        })
    }
}

/// Deduplicate by record id keeping the first occurrence, sort newest first
/// with undated entries last, and cap at [`NewsAggregator::LIMIT`].
pub fn merge_news(batches: Vec<Vec<NewsRecord>>) -> Vec<NewsRecord> {
    let mut seen = HashSet::new();
    let mut merged: Vec<NewsRecord> = batches
        .into_iter()
        .flatten()
        .filter(|record| seen.insert(record.id.clone()))
        .collect();

    // Stable: equal timestamps keep feed order. `None` sorts below any date.
    merged.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    merged.truncate(NewsAggregator::LIMIT);
    merged
}
