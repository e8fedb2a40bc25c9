use super::{Freshness, cached_or_refresh};
use crate::domain::ChannelProfile;
use crate::ports::VideoCatalog;
use crate::quota::{QuotaGovernor, QuotaOp};
use futures::future::join_all;
use shared::config::CacheTtls;
use shared::{Clock, Error, Result};
use std::sync::Arc;
use storage_engine::TtlCache;
use tracing::warn;

/// Handle → channel id resolution and channel profile lookup, both cached.
pub struct ChannelDirectory {
    catalog: Arc<dyn VideoCatalog>,
    quota: Arc<QuotaGovernor>,
    ids: TtlCache<String>,
    /// Handles the catalog had no channel for.
    unknown: TtlCache<()>,
    profiles: TtlCache<ChannelProfile>,
    ttls: CacheTtls,
}

impl ChannelDirectory {
    pub fn new(
        catalog: Arc<dyn VideoCatalog>,
        quota: Arc<QuotaGovernor>,
        ttls: CacheTtls,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog,
            quota,
            ids: TtlCache::new("channel_ids", clock.clone()),
            unknown: TtlCache::new("unknown_handles", clock.clone()),
            profiles: TtlCache::new("channel_profiles", clock),
            ttls,
        }
    }

    pub fn catalog(&self) -> &Arc<dyn VideoCatalog> {
        &self.catalog
    }

    /// Resolve a handle to its channel id.
    ///
    /// Quota denial or upstream failure falls back to a stale id; without one
    /// the error propagates. An unmatched handle is [`Error::NotFound`] and is
    /// remembered for `unknown_handle` so repeats cost no search quota.
    pub async fn resolve_channel_id(&self, handle: &str) -> Result<String> {
        let key = handle.to_lowercase();
        let not_found = || Error::NotFound(format!("channel {}", handle));
        if self.unknown.get(&key).await.is_some() {
            return Err(not_found());
        }
        let freshness = Freshness::new(self.ttls.channel_id, self.ttls.stale_restamp);

        let resolved = cached_or_refresh(&self.ids, &key, freshness, || async {
            self.quota.ensure(QuotaOp::Search)?;
            let found = self.catalog.search_channel(handle).await?;
            self.quota.record_usage(QuotaOp::Search);
            found.ok_or_else(not_found)
        })
        .await;

        if matches!(resolved, Err(Error::NotFound(_))) && !self.ttls.unknown_handle.is_zero() {
            self.unknown.set(key, (), self.ttls.unknown_handle).await;
        }
        resolved
    }

    /// Title and avatar for a handle.
    pub async fn channel_profile(&self, handle: &str) -> Result<ChannelProfile> {
        let channel_id = self.resolve_channel_id(handle).await?;
        let key = handle.to_lowercase();
        let freshness = Freshness::new(self.ttls.channel_profile, self.ttls.stale_restamp);

        cached_or_refresh(&self.profiles, &key, freshness, || async {
            self.quota.ensure(QuotaOp::List)?;
            let details = self.catalog.channel_details(&channel_id).await?;
            self.quota.record_usage(QuotaOp::List);
            let details =
                details.ok_or_else(|| Error::NotFound(format!("channel {}", channel_id)))?;
            Ok(ChannelProfile {
                handle: handle.to_string(),
                channel_id: Some(channel_id.clone()),
                title: details.title,
                avatar: details.avatar,
            })
        })
        .await
    }

    /// Profiles for every handle, in roster order. A handle that cannot be
    /// looked up becomes a placeholder instead of failing the batch.
    pub async fn profiles(&self, handles: &[String]) -> Result<Vec<ChannelProfile>> {
        if !self.catalog.is_configured() {
            return Err(Error::ConfigurationMissing("YOUTUBE_API_KEY"));
        }

        let lookups = handles.iter().map(|handle| async move {
            match self.channel_profile(handle).await {
                Ok(profile) => profile,
                Err(err) => {
                    warn!("channel profile for {} unavailable: {}", handle, err);
                    ChannelProfile::placeholder(handle)
                }
            }
        });
        Ok(join_all(lookups).await)
    }
}
