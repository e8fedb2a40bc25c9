//! In-memory stand-ins for the ports, shared by unit tests.

use crate::domain::{
    ChannelDetails, MatchRecord, NewsRecord, ScoreScope, TeamScore, Thumbnails, VideoDetails,
};
use crate::ports::{FeedFetcher, ScoreProvider, VideoCatalog};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use shared::config::FeedConfig;
use shared::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn video(id: &str, channel_id: &str, published_at: &str) -> VideoDetails {
    VideoDetails {
        id: id.to_string(),
        title: format!("Video {}", id),
        channel_id: channel_id.to_string(),
        channel_title: format!("Channel {}", channel_id),
        published_at: published_at.parse().unwrap(),
        duration_sec: 90,
        thumbnails: Thumbnails::default(),
    }
}

pub fn news(url: &str, source: &str, published_at: Option<&str>) -> NewsRecord {
    let key = NewsRecord::dedupe_key(url, source, None, url);
    NewsRecord {
        id: NewsRecord::id_for(&key),
        url: url.to_string(),
        title: format!("Story at {}", url),
        image: None,
        source: source.to_string(),
        published_at: published_at.map(|p| p.parse::<DateTime<Utc>>().unwrap()),
        summary: None,
    }
}

pub fn fixture_match(id: &str) -> MatchRecord {
    MatchRecord {
        id: id.to_string(),
        league: "Premier League".into(),
        country: Some("England".into()),
        datetime: None,
        status: "NS".into(),
        minute: None,
        home: TeamScore {
            name: "Home".into(),
            ..TeamScore::default()
        },
        away: TeamScore {
            name: "Away".into(),
            ..TeamScore::default()
        },
    }
}

// === Video catalog ===

pub struct FakeCatalog {
    configured: bool,
    channels: HashMap<String, String>,
    details: HashMap<String, ChannelDetails>,
    videos: HashMap<String, Vec<VideoDetails>>,
    orphans: HashMap<String, Vec<String>>,
    search_calls: AtomicUsize,
    list_calls: AtomicUsize,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self {
            configured: true,
            channels: HashMap::new(),
            details: HashMap::new(),
            videos: HashMap::new(),
            orphans: HashMap::new(),
            search_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new()
        }
    }

    pub fn with_channel(mut self, handle: &str, channel_id: &str) -> Self {
        self.channels
            .insert(handle.to_lowercase(), channel_id.to_string());
        self
    }

    pub fn with_channel_details(mut self, channel_id: &str, title: &str, avatar: Option<&str>) -> Self {
        self.details.insert(
            channel_id.to_string(),
            ChannelDetails {
                title: title.to_string(),
                avatar: avatar.map(String::from),
            },
        );
        self
    }

    pub fn with_videos(mut self, channel_id: &str, videos: Vec<VideoDetails>) -> Self {
        self.videos.insert(channel_id.to_string(), videos);
        self
    }

    /// Ids the search returns but the detail lookup knows nothing about.
    pub fn with_orphan_ids(mut self, channel_id: &str, ids: Vec<String>) -> Self {
        self.orphans.insert(channel_id.to_string(), ids);
        self
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn ensure_configured(&self) -> Result<()> {
        if self.configured {
            Ok(())
        } else {
            Err(Error::ConfigurationMissing("YOUTUBE_API_KEY"))
        }
    }
}

#[async_trait]
impl VideoCatalog for FakeCatalog {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn search_channel(&self, handle: &str) -> Result<Option<String>> {
        self.ensure_configured()?;
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.channels.get(&handle.to_lowercase()).cloned())
    }

    async fn recent_video_ids(&self, channel_id: &str, max: usize) -> Result<Vec<String>> {
        self.ensure_configured()?;
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let mut videos = self.videos.get(channel_id).cloned().unwrap_or_default();
        videos.sort_by(|a, b| b.published_at.cmp(&a.published_at));

        let mut ids: Vec<String> = videos.into_iter().take(max).map(|v| v.id).collect();
        ids.extend(self.orphans.get(channel_id).cloned().unwrap_or_default());
        Ok(ids)
    }

    async fn video_details(&self, ids: &[String]) -> Result<Vec<VideoDetails>> {
        self.ensure_configured()?;
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .videos
            .values()
            .flatten()
            .filter(|v| ids.contains(&v.id))
            .cloned()
            .collect())
    }

    async fn channel_details(&self, channel_id: &str) -> Result<Option<ChannelDetails>> {
        self.ensure_configured()?;
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.details.get(channel_id).cloned())
    }
}

// === Feeds ===

pub struct FakeFeeds {
    feeds: HashMap<String, Vec<NewsRecord>>,
    failing: Mutex<HashSet<String>>,
}

impl FakeFeeds {
    pub fn new() -> Self {
        Self {
            feeds: HashMap::new(),
            failing: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_feed(mut self, name: &str, records: Vec<NewsRecord>) -> Self {
        self.feeds.insert(name.to_string(), records);
        self
    }

    pub fn with_failing_feed(self, name: &str) -> Self {
        self.fail(name);
        self
    }

    pub fn fail(&self, name: &str) {
        self.failing.lock().insert(name.to_string());
    }
}

#[async_trait]
impl FeedFetcher for FakeFeeds {
    async fn fetch(&self, feed: &FeedConfig) -> Result<Vec<NewsRecord>> {
        if self.failing.lock().contains(&feed.name) {
            return Err(Error::UpstreamUnavailable(format!("{} is down", feed.name)));
        }
        Ok(self.feeds.get(&feed.name).cloned().unwrap_or_default())
    }
}

// === Score providers ===

pub struct FakeProvider {
    name: &'static str,
    items: Option<Vec<MatchRecord>>,
    calls: AtomicUsize,
    last_day: Mutex<Option<NaiveDate>>,
}

impl FakeProvider {
    pub fn ok(name: &'static str, items: Vec<MatchRecord>) -> Self {
        Self {
            name,
            items: Some(items),
            calls: AtomicUsize::new(0),
            last_day: Mutex::new(None),
        }
    }

    pub fn failing(name: &'static str) -> Self {
        Self {
            items: None,
            ..Self::ok(name, Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        *self.last_day.lock()
    }
}

#[async_trait]
impl ScoreProvider for FakeProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self, _scope: ScoreScope, today: NaiveDate) -> Result<Vec<MatchRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_day.lock() = Some(today);
        self.items
            .clone()
            .ok_or_else(|| Error::UpstreamUnavailable(format!("{} is down", self.name)))
    }
}
