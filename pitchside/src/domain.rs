use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// === Videos ===

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelRef {
    pub id: String,
    pub name: String,
    pub avatar: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Thumbnails {
    pub sm: Option<String>,
    pub md: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub id: String,
    pub url: String,
    pub title: String,
    pub channel: ChannelRef,
    pub thumbnails: Thumbnails,
    pub duration_sec: u32,
    pub published_at: DateTime<Utc>,
}

/// Detail-lookup result for a single video, as returned by the catalog.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoDetails {
    pub id: String,
    pub title: String,
    pub channel_id: String,
    pub channel_title: String,
    pub published_at: DateTime<Utc>,
    pub duration_sec: u32,
    pub thumbnails: Thumbnails,
}

impl VideoDetails {
    pub fn into_record(self, avatar: Option<String>) -> VideoRecord {
        VideoRecord {
            url: format!("https://www.youtube.com/watch?v={}", self.id),
            id: self.id,
            title: self.title,
            channel: ChannelRef {
                id: self.channel_id,
                name: self.channel_title,
                avatar,
            },
            thumbnails: self.thumbnails,
            duration_sec: self.duration_sec,
            published_at: self.published_at,
        }
    }
}

/// Title and avatar of a channel.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelDetails {
    pub title: String,
    pub avatar: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    pub handle: String,
    pub channel_id: Option<String>,
    pub title: String,
    pub avatar: Option<String>,
}

impl ChannelProfile {
    /// Stand-in for a handle that could not be resolved.
    pub fn placeholder(handle: &str) -> Self {
        Self {
            handle: handle.to_string(),
            channel_id: None,
            title: handle.to_string(),
            avatar: None,
        }
    }
}

// === News ===

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsRecord {
    pub id: String,
    pub url: String,
    pub title: String,
    pub image: Option<String>,
    pub source: String,
    pub published_at: Option<DateTime<Utc>>,
    pub summary: Option<String>,
}

impl NewsRecord {
    /// Identity used for deduplication: the URL, or `source:guid` (`source:title`
    /// when there is no guid) for entries without one.
    pub fn dedupe_key(url: &str, source: &str, guid: Option<&str>, title: &str) -> String {
        if !url.is_empty() {
            return url.to_string();
        }
        match guid.filter(|g| !g.is_empty()) {
            Some(guid) => format!("{}:{}", source, guid),
            None => format!("{}:{}", source, title),
        }
    }

    /// Stable short id derived from the dedupe key.
    pub fn id_for(dedupe_key: &str) -> String {
        let digest = Sha256::digest(dedupe_key.as_bytes());
        hex::encode(&digest[..8])
    }
}

// === Scores ===

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScoreScope {
    Live,
    Today,
    Upcoming,
}

impl ScoreScope {
    pub const ALL: [ScoreScope; 3] = [ScoreScope::Live, ScoreScope::Today, ScoreScope::Upcoming];

    /// Days past today covered by the upcoming window.
    pub const UPCOMING_DAYS: i64 = 3;

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreScope::Live => "live",
            ScoreScope::Today => "today",
            ScoreScope::Upcoming => "upcoming",
        }
    }
}

impl fmt::Display for ScoreScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoreScope {
    type Err = shared::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "live" => Ok(ScoreScope::Live),
            "today" => Ok(ScoreScope::Today),
            "upcoming" => Ok(ScoreScope::Upcoming),
            other => Err(shared::Error::validation(
                "scope",
                format!("'{}' is not one of live, today, upcoming", other),
            )),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamScore {
    pub id: Option<String>,
    pub name: String,
    pub logo: Option<String>,
    pub goals: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: String,
    pub league: String,
    pub country: Option<String>,
    pub datetime: Option<DateTime<Utc>>,
    pub status: String,
    pub minute: Option<u32>,
    pub home: TeamScore,
    pub away: TeamScore,
}

// === Polls ===

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub id: Uuid,
    pub question: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_active: bool,
}

impl Poll {
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.starts_at <= now && now <= self.ends_at
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOption {
    pub id: Uuid,
    pub poll_id: Uuid,
    pub text: String,
    pub order: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub poll_id: Uuid,
    pub option_id: Uuid,
    pub device_hash: String,
}

/// Poll as submitted by an admin, before the store assigns ids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewPoll {
    pub question: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_active: bool,
    pub options: Vec<String>,
}
