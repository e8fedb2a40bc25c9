use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Upstream feed entry: display name plus RSS/Atom URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedConfig {
    pub name: String,
    pub url: String,
}

/// Deployment mode. `Hardened` suppresses internal error detail in responses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Development,
    Hardened,
}

/// Per-operation costs and budget for the video catalog API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub daily_max: u32,
    pub safety_margin: u32,
    pub search_cost: u32,
    pub list_cost: u32,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            daily_max: 10_000,
            safety_margin: 500,
            search_cost: 100,
            list_cost: 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheTtls {
    pub channel_id: Duration,
    pub channel_profile: Duration,
    pub handle_videos: Duration,
    pub global_videos: Duration,
    pub news: Duration,
    pub scores_live: Duration,
    pub scores_today: Duration,
    pub scores_upcoming: Duration,
    /// How long a handle with no matching channel is remembered as unknown.
    pub unknown_handle: Duration,
    /// Expiry applied to a stale entry after a failed refresh.
    pub stale_restamp: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            channel_id: Duration::from_secs(7 * 24 * 3600),
            channel_profile: Duration::from_secs(24 * 3600),
            handle_videos: Duration::from_secs(15 * 60),
            global_videos: Duration::from_secs(15 * 60),
            news: Duration::from_secs(10 * 60),
            scores_live: Duration::from_secs(60),
            scores_today: Duration::from_secs(5 * 60),
            scores_upcoming: Duration::from_secs(30 * 60),
            unknown_handle: Duration::from_secs(3600),
            stale_restamp: Duration::from_secs(60),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpstreamEndpoints {
    pub youtube: String,
    pub api_football: String,
    pub allsports: String,
}

impl Default for UpstreamEndpoints {
    fn default() -> Self {
        Self {
            youtube: "https://www.googleapis.com/youtube/v3".to_string(),
            api_football: "https://v3.football.api-sports.io".to_string(),
            allsports: "https://apiv2.allsportsapi.com/football".to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub http_port: u16,
    pub mode: Mode,
    pub youtube_api_key: Option<String>,
    pub api_football_key: Option<String>,
    pub allsports_api_key: Option<String>,
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub admin_secret: Option<String>,
    pub quota: QuotaPolicy,
    pub ttls: CacheTtls,
    pub endpoints: UpstreamEndpoints,
    pub upstream_timeout: Duration,
    pub channel_handles: Vec<String>,
    pub news_feeds: Vec<FeedConfig>,
}

impl Config {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_HTTP_PORT: u16 = 8080;
    const DEFAULT_TIMEOUT_SECS: u64 = 10;
    const DEFAULT_CHANNEL_HANDLES: &'static [&'static str] = &[
        "@premierleague",
        "@LaLiga",
        "@ChampionsLeague",
        "@SkySportsFootball",
        "@ESPNFC",
        "@TNTSportsFootball",
    ];
    const DEFAULT_NEWS_FEEDS: &'static [(&'static str, &'static str)] = &[
        ("BBC Sport", "https://feeds.bbci.co.uk/sport/football/rss.xml"),
        ("Sky Sports", "https://www.skysports.com/rss/12040"),
        ("The Guardian", "https://www.theguardian.com/football/rss"),
        ("ESPN", "https://www.espn.com/espn/rss/soccer/news"),
    ];

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        // Blank values count as unset.
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let secs = |key: &str, default: Duration| {
            Duration::from_secs(parse_or(key, var(key), default.as_secs()))
        };

        let mode = match var("PITCHSIDE_ENV").as_deref() {
            Some("production") | Some("prod") => Mode::Hardened,
            _ => Mode::Development,
        };

        let quota_defaults = QuotaPolicy::default();
        let quota = QuotaPolicy {
            daily_max: parse_or(
                "YOUTUBE_DAILY_QUOTA",
                var("YOUTUBE_DAILY_QUOTA"),
                quota_defaults.daily_max,
            ),
            safety_margin: parse_or(
                "YOUTUBE_QUOTA_SAFETY_MARGIN",
                var("YOUTUBE_QUOTA_SAFETY_MARGIN"),
                quota_defaults.safety_margin,
            ),
            search_cost: parse_or(
                "YOUTUBE_COST_SEARCH",
                var("YOUTUBE_COST_SEARCH"),
                quota_defaults.search_cost,
            ),
            list_cost: parse_or(
                "YOUTUBE_COST_LIST",
                var("YOUTUBE_COST_LIST"),
                quota_defaults.list_cost,
            ),
        };

        let t = CacheTtls::default();
        let ttls = CacheTtls {
            channel_id: secs("PITCHSIDE_TTL_CHANNEL_ID_SECS", t.channel_id),
            channel_profile: secs("PITCHSIDE_TTL_CHANNEL_PROFILE_SECS", t.channel_profile),
            handle_videos: secs("PITCHSIDE_TTL_HANDLE_VIDEOS_SECS", t.handle_videos),
            global_videos: secs("PITCHSIDE_TTL_GLOBAL_VIDEOS_SECS", t.global_videos),
            news: secs("PITCHSIDE_TTL_NEWS_SECS", t.news),
            scores_live: secs("PITCHSIDE_TTL_SCORES_LIVE_SECS", t.scores_live),
            scores_today: secs("PITCHSIDE_TTL_SCORES_TODAY_SECS", t.scores_today),
            scores_upcoming: secs("PITCHSIDE_TTL_SCORES_UPCOMING_SECS", t.scores_upcoming),
            unknown_handle: secs("PITCHSIDE_TTL_UNKNOWN_HANDLE_SECS", t.unknown_handle),
            stale_restamp: secs("PITCHSIDE_TTL_STALE_RESTAMP_SECS", t.stale_restamp),
        };

        let e = UpstreamEndpoints::default();
        let endpoints = UpstreamEndpoints {
            youtube: var("YOUTUBE_API_BASE").unwrap_or(e.youtube),
            api_football: var("API_FOOTBALL_BASE").unwrap_or(e.api_football),
            allsports: var("ALLSPORTS_API_BASE").unwrap_or(e.allsports),
        };

        let channel_handles = match var("PITCHSIDE_CHANNEL_HANDLES") {
            Some(raw) => parse_list(&raw),
            None => Self::DEFAULT_CHANNEL_HANDLES
                .iter()
                .map(|h| h.to_string())
                .collect(),
        };

        let news_feeds = match var("PITCHSIDE_NEWS_FEEDS") {
            Some(raw) => parse_feeds(&raw),
            None => Self::DEFAULT_NEWS_FEEDS
                .iter()
                .map(|(name, url)| FeedConfig {
                    name: name.to_string(),
                    url: url.to_string(),
                })
                .collect(),
        };

        let admin_secret = var("ADMIN_SECRET");
        if admin_secret.is_none() {
            warn!("ADMIN_SECRET not set, admin endpoints are disabled");
        }

        Self {
            host: var("PITCHSIDE_HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_string()),
            http_port: parse_or(
                "PITCHSIDE_HTTP_PORT",
                var("PITCHSIDE_HTTP_PORT"),
                Self::DEFAULT_HTTP_PORT,
            ),
            mode,
            youtube_api_key: var("YOUTUBE_API_KEY"),
            api_football_key: var("API_FOOTBALL_KEY"),
            allsports_api_key: var("ALLSPORTS_API_KEY"),
            supabase_url: var("SUPABASE_URL"),
            supabase_key: var("SUPABASE_SERVICE_KEY"),
            admin_secret,
            quota,
            ttls,
            endpoints,
            upstream_timeout: secs(
                "PITCHSIDE_UPSTREAM_TIMEOUT_SECS",
                Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            ),
            channel_handles,
            news_feeds,
        }
    }

    pub fn is_hardened(&self) -> bool {
        self.mode == Mode::Hardened
    }
}

/// Parse straight into the target type so out-of-range values fall back
/// instead of wrapping.
fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + Display,
{
    match raw {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} is not a valid number ({}), using {}", key, raw, default);
            default
        }),
        None => default,
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// `Name|url` pairs; a bare URL uses its host as the name.
fn parse_feeds(raw: &str) -> Vec<FeedConfig> {
    parse_list(raw)
        .into_iter()
        .map(|entry| match entry.split_once('|') {
            Some((name, url)) => FeedConfig {
                name: name.trim().to_string(),
                url: url.trim().to_string(),
            },
            None => {
                let name = entry
                    .split("://")
                    .nth(1)
                    .and_then(|rest| rest.split('/').next())
                    .unwrap_or(&entry)
                    .to_string();
                FeedConfig { name, url: entry }
            }
        })
        .collect()
}
