use crate::domain::{
    ChannelDetails, MatchRecord, NewPoll, NewsRecord, Poll, PollOption, ScoreScope, VideoDetails,
    Vote,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use shared::Result;
use shared::config::FeedConfig;
use uuid::Uuid;

// Ports are the seams between aggregation logic and the outside world

/// Port for the video catalog API. Quota accounting is the caller's job.
#[async_trait]
pub trait VideoCatalog: Send + Sync + 'static {
    /// False when the API key is absent; every call would fail.
    fn is_configured(&self) -> bool;

    /// Search-type call: first channel id matching a handle.
    async fn search_channel(&self, handle: &str) -> Result<Option<String>>;

    /// Search-type call: ids of the most recent uploads of a channel.
    async fn recent_video_ids(&self, channel_id: &str, max: usize) -> Result<Vec<String>>;

    /// Detail-lookup call for a batch of video ids.
    async fn video_details(&self, ids: &[String]) -> Result<Vec<VideoDetails>>;

    /// Detail-lookup call for a channel.
    async fn channel_details(&self, channel_id: &str) -> Result<Option<ChannelDetails>>;
}

/// Port for news syndication feeds.
#[async_trait]
pub trait FeedFetcher: Send + Sync + 'static {
    async fn fetch(&self, feed: &FeedConfig) -> Result<Vec<NewsRecord>>;
}

/// Port for a sports-score provider.
#[async_trait]
pub trait ScoreProvider: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Matches in `scope`, with `today` as the current UTC calendar day.
    async fn fetch(&self, scope: ScoreScope, today: NaiveDate) -> Result<Vec<MatchRecord>>;
}

/// Port for poll storage.
#[async_trait]
pub trait PollRepository: Send + Sync + 'static {
    /// Active poll open at `now`, most recent start first.
    async fn active_poll(&self, now: DateTime<Utc>) -> Result<Option<Poll>>;

    /// Options of a poll, ordered.
    async fn options(&self, poll_id: Uuid) -> Result<Vec<PollOption>>;

    async fn votes(&self, poll_id: Uuid) -> Result<Vec<Vote>>;

    /// Fails with [`shared::Error::Conflict`] when the device already voted.
    async fn insert_vote(&self, vote: &Vote) -> Result<()>;

    async fn list_polls(&self) -> Result<Vec<Poll>>;

    async fn create_poll(&self, poll: NewPoll) -> Result<(Poll, Vec<PollOption>)>;

    /// Fails with [`shared::Error::NotFound`] for an unknown poll.
    async fn set_active(&self, poll_id: Uuid, active: bool) -> Result<Poll>;
}
