use super::{ChannelDirectory, Freshness, cached_or_refresh};
use crate::domain::{VideoDetails, VideoRecord};
use crate::ports::VideoCatalog;
use crate::quota::{QuotaGovernor, QuotaOp};
use futures::future::join_all;
use shared::config::CacheTtls;
use shared::{Clock, Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use storage_engine::TtlCache;
use tracing::{info, warn};

/// Recent uploads per handle, and a merged feed across the channel roster.
pub struct VideoAggregator {
    directory: Arc<ChannelDirectory>,
    quota: Arc<QuotaGovernor>,
    roster: Vec<String>,
    cache: TtlCache<Vec<VideoRecord>>,
    ttls: CacheTtls,
}

impl VideoAggregator {
    pub const PER_HANDLE_LIMIT: usize = 12;
    pub const PER_CHANNEL_GLOBAL_LIMIT: usize = 6;
    pub const GLOBAL_LIMIT: usize = 60;

    const GLOBAL_KEY: &'static str = "global";

    pub fn new(
        directory: Arc<ChannelDirectory>,
        quota: Arc<QuotaGovernor>,
        roster: Vec<String>,
        ttls: CacheTtls,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            directory,
            quota,
            roster,
            cache: TtlCache::new("videos", clock),
            ttls,
        }
    }

    fn catalog(&self) -> &Arc<dyn VideoCatalog> {
        self.directory.catalog()
    }

    fn ensure_configured(&self) -> Result<()> {
        if self.catalog().is_configured() {
            Ok(())
        } else {
            Err(Error::ConfigurationMissing("YOUTUBE_API_KEY"))
        }
    }

    /// Videos for one handle, or the merged roster feed when `handle` is `None`.
    ///
    /// Upstream failure and quota denial degrade to stale data, then to an
    /// empty list. Only a missing API key is an error.
    pub async fn videos(&self, handle: Option<&str>) -> Result<Vec<VideoRecord>> {
        self.ensure_configured()?;

        let result = match handle.map(str::trim).filter(|h| !h.is_empty()) {
            Some(handle) => self.videos_for_handle(handle).await,
            None => self.global_videos().await,
        };

        match result {
            Ok(videos) => Ok(videos),
            Err(err @ Error::ConfigurationMissing(_)) => Err(err),
            Err(err) => {
                warn!("videos unavailable, returning empty list: {}", err);
                Ok(Vec::new())
            }
        }
    }

    pub async fn videos_for_handle(&self, handle: &str) -> Result<Vec<VideoRecord>> {
        let key = format!("handle:{}", handle.to_lowercase());
        let freshness = Freshness::new(self.ttls.handle_videos, self.ttls.stale_restamp);

        cached_or_refresh(&self.cache, &key, freshness, || {
            self.fetch_channel_videos(handle, Self::PER_HANDLE_LIMIT)
        })
        .await
    }

    pub async fn global_videos(&self) -> Result<Vec<VideoRecord>> {
        let freshness = Freshness::new(self.ttls.global_videos, self.ttls.stale_restamp);

        cached_or_refresh(&self.cache, Self::GLOBAL_KEY, freshness, || async {
            let fetches = self.roster.iter().map(|handle| async move {
                let result = self
                    .fetch_channel_videos(handle, Self::PER_CHANNEL_GLOBAL_LIMIT)
                    .await;
                if let Err(err) = &result {
                    warn!("videos for {} failed: {}", handle, err);
                }
                result
            });
            let results = join_all(fetches).await;

            // Every channel failing is a failed refresh, so stale data survives it.
            if !results.is_empty() && results.iter().all(|r| r.is_err()) {
                return results
                    .into_iter()
                    .find_map(|r| r.err())
                    .map_or(Ok(Vec::new()), Err);
            }

            let mut merged: Vec<VideoRecord> = results
                .into_iter()
                .flat_map(|r| r.unwrap_or_default())
                .collect();
            sort_newest_first(&mut merged);
            merged.truncate(Self::GLOBAL_LIMIT);
            info!("merged {} videos from {} channels", merged.len(), self.roster.len());
            Ok(merged)
        })
        .await
    }

    /// Search for a channel's latest uploads, then enrich them with a detail
    /// lookup. Ids without a detail record are dropped.
    async fn fetch_channel_videos(&self, handle: &str, max: usize) -> Result<Vec<VideoRecord>> {
        let channel_id = self.directory.resolve_channel_id(handle).await?;

        self.quota.ensure(QuotaOp::Search)?;
        let ids = self.catalog().recent_video_ids(&channel_id, max).await?;
        self.quota.record_usage(QuotaOp::Search);
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        self.quota.ensure(QuotaOp::List)?;
        let details = self.catalog().video_details(&ids).await?;
        self.quota.record_usage(QuotaOp::List);

        let avatar = match self.directory.channel_profile(handle).await {
            Ok(profile) => profile.avatar,
            Err(err) => {
                warn!("no avatar for {}: {}", handle, err);
                None
            }
        };

        let mut videos = enrich(&ids, details, avatar);
        sort_newest_first(&mut videos);
        Ok(videos)
    }
}

/// Join search ids with their detail records, keeping search order.
fn enrich(ids: &[String], details: Vec<VideoDetails>, avatar: Option<String>) -> Vec<VideoRecord> {
    let mut by_id: HashMap<String, VideoDetails> =
        details.into_iter().map(|d| (d.id.clone(), d)).collect();

    ids.iter()
        .filter_map(|id| by_id.remove(id))
        .map(|d| d.into_record(avatar.clone()))
        .collect()
}

fn sort_newest_first(videos: &mut [VideoRecord]) {
    videos.sort_by(|a, b| b.published_at.cmp(&a.published_at));
}
