use super::http::ensure_success;
use crate::domain::{ChannelDetails, Thumbnails, VideoDetails};
use crate::ports::VideoCatalog;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use shared::{Error, Result};
use tracing::debug;

/// YouTube Data API v3 adapter.
pub struct YouTubeClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl YouTubeClient {
    /// The API caps `id=` batches at 50.
    const MAX_BATCH: usize = 50;

    pub fn new(http: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    async fn get<T: DeserializeOwned>(&self, resource: &str, query: &[(&str, &str)]) -> Result<T> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(Error::ConfigurationMissing("YOUTUBE_API_KEY"))?;
        let url = format!("{}/{}", self.base_url, resource);
        debug!("youtube GET {} {:?}", resource, query);

        let response = self
            .http
            .get(&url)
            .query(query)
            .query(&[("key", key)])
            .send()
            .await?;

        if response.status() == StatusCode::FORBIDDEN {
            let body: ApiErrorBody = response.json().await.unwrap_or_default();
            if body.is_quota_exceeded() {
                return Err(Error::QuotaExceeded);
            }
            return Err(Error::UpstreamUnavailable(format!(
                "youtube {} forbidden: {}",
                resource, body.error.message
            )));
        }

        let response = ensure_success("youtube", response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl VideoCatalog for YouTubeClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn search_channel(&self, handle: &str) -> Result<Option<String>> {
        let page: ListResponse<SearchItem> = self
            .get(
                "search",
                &[
                    ("part", "snippet"),
                    ("type", "channel"),
                    ("maxResults", "1"),
                    ("q", handle),
                ],
            )
            .await?;

        Ok(page
            .items
            .into_iter()
            .find_map(|item| item.id.channel_id.or(item.snippet.channel_id)))
    }

    async fn recent_video_ids(&self, channel_id: &str, max: usize) -> Result<Vec<String>> {
        let max = max.clamp(1, Self::MAX_BATCH).to_string();
        let page: ListResponse<SearchItem> = self
            .get(
                "search",
                &[
                    ("part", "snippet"),
                    ("channelId", channel_id),
                    ("order", "date"),
                    ("type", "video"),
                    ("maxResults", &max),
                ],
            )
            .await?;

        Ok(page
            .items
            .into_iter()
            .filter_map(|item| item.id.video_id)
            .collect())
    }

    async fn video_details(&self, ids: &[String]) -> Result<Vec<VideoDetails>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let batch = ids
            .iter()
            .take(Self::MAX_BATCH)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let page: ListResponse<VideoItem> = self
            .get("videos", &[("part", "snippet,contentDetails"), ("id", &batch)])
            .await?;

        Ok(page.items.into_iter().filter_map(VideoItem::into_details).collect())
    }

    async fn channel_details(&self, channel_id: &str) -> Result<Option<ChannelDetails>> {
        let page: ListResponse<ChannelItem> = self
            .get("channels", &[("part", "snippet"), ("id", channel_id)])
            .await?;

        Ok(page.items.into_iter().next().map(|item| ChannelDetails {
            title: item.snippet.title,
            avatar: item.snippet.thumbnails.small().or(item.snippet.thumbnails.medium()),
        }))
    }
}

/// Seconds in an ISO-8601 duration such as `PT1H2M3S`. Absent components
/// count as zero; anything unparseable (including `""` and `PT`) is 0.
pub fn parse_iso8601_duration(raw: &str) -> u32 {
    let Some(rest) = raw.trim().strip_prefix('P') else {
        return 0;
    };

    let mut total = 0f64;
    let mut number = String::new();
    let mut in_time = false;

    for c in rest.chars() {
        match c {
            'T' => in_time = true,
            '0'..='9' | '.' => number.push(c),
            unit => {
                let value: f64 = number.parse().unwrap_or(0.0);
                number.clear();
                let seconds = match (in_time, unit) {
                    (false, 'W') => 7.0 * 86_400.0,
                    (false, 'D') => 86_400.0,
                    (true, 'H') => 3_600.0,
                    (true, 'M') => 60.0,
                    (true, 'S') => 1.0,
                    _ => 0.0,
                };
                total += value * seconds;
            }
        }
    }

    total.floor().min(u32::MAX as f64) as u32
}

// === Wire types ===

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchId {
    video_id: Option<String>,
    channel_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchSnippet {
    channel_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    id: SearchId,
    #[serde(default)]
    snippet: SearchSnippet,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnail {
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ThumbnailSet {
    #[serde(default)]
    default: Thumbnail,
    #[serde(default)]
    medium: Thumbnail,
    #[serde(default)]
    high: Thumbnail,
}

impl ThumbnailSet {
    fn small(&self) -> Option<String> {
        self.default.url.clone()
    }

    fn medium(&self) -> Option<String> {
        self.medium.url.clone().or_else(|| self.high.url.clone())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    channel_id: String,
    #[serde(default)]
    channel_title: String,
    published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    thumbnails: ThumbnailSet,
}

#[derive(Debug, Default, Deserialize)]
struct ContentDetails {
    #[serde(default)]
    duration: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    snippet: Option<VideoSnippet>,
    #[serde(default)]
    content_details: ContentDetails,
}

impl VideoItem {
    fn into_details(self) -> Option<VideoDetails> {
        let snippet = self.snippet?;
        Some(VideoDetails {
            id: self.id,
            duration_sec: parse_iso8601_duration(&self.content_details.duration),
            thumbnails: Thumbnails {
                sm: snippet.thumbnails.small(),
                md: snippet.thumbnails.medium(),
            },
            title: snippet.title,
            channel_id: snippet.channel_id,
            channel_title: snippet.channel_title,
            published_at: snippet.published_at?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChannelSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    thumbnails: ThumbnailSet,
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    snippet: ChannelSnippet,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorReason {
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ApiErrorReason>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error: ApiErrorDetail,
}

impl ApiErrorBody {
    fn is_quota_exceeded(&self) -> bool {
        self.error
            .errors
            .iter()
            .any(|e| e.reason == "quotaExceeded" || e.reason == "dailyLimitExceeded")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::Duration;

    fn client(server: &MockServer, key: Option<&str>) -> YouTubeClient {
        let http = crate::adapters::build_client(Duration::from_secs(5)).unwrap();
        YouTubeClient::new(http, server.base_url(), key.map(String::from))
    }

    #[test]
    fn test_duration_parsing() {
        assert_eq!(parse_iso8601_duration("PT1H2M3S"), 3723);
        assert_eq!(parse_iso8601_duration("PT5M"), 300);
        assert_eq!(parse_iso8601_duration("PT45S"), 45);
        assert_eq!(parse_iso8601_duration("PT1H"), 3600);
        assert_eq!(parse_iso8601_duration("P1DT1S"), 86_401);
        assert_eq!(parse_iso8601_duration("PT"), 0);
        assert_eq!(parse_iso8601_duration(""), 0);
        assert_eq!(parse_iso8601_duration("P0D"), 0);
        assert_eq!(parse_iso8601_duration("garbage"), 0);
    }

    #[tokio::test]
    async fn test_search_channel() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/search")
                    .query_param("type", "channel")
                    .query_param("q", "@League")
                    .query_param("key", "k");
                then.status(200).json_body(json!({
                    "items": [{
                        "id": { "kind": "youtube#channel", "channelId": "UC_LEAGUE" },
                        "snippet": { "channelId": "UC_LEAGUE", "title": "League" }
                    }]
                }));
            })
            .await;

        let found = client(&server, Some("k")).search_channel("@League").await.unwrap();

        mock.assert_async().await;
        assert_eq!(found.as_deref(), Some("UC_LEAGUE"));
    }

    #[tokio::test]
    async fn test_search_channel_no_match() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/search");
                then.status(200).json_body(json!({ "items": [] }));
            })
            .await;

        let found = client(&server, Some("k")).search_channel("@ghost").await.unwrap();

        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn test_recent_video_ids() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/search")
                    .query_param("channelId", "UC_LEAGUE")
                    .query_param("order", "date")
                    .query_param("maxResults", "12");
                then.status(200).json_body(json!({
                    "items": [
                        { "id": { "kind": "youtube#video", "videoId": "v1" } },
                        { "id": { "kind": "youtube#video", "videoId": "v2" } },
                        { "id": { "kind": "youtube#playlist", "playlistId": "p1" } }
                    ]
                }));
            })
            .await;

        let ids = client(&server, Some("k"))
            .recent_video_ids("UC_LEAGUE", 12)
            .await
            .unwrap();

        assert_eq!(ids, vec!["v1", "v2"]);
    }

    #[tokio::test]
    async fn test_video_details() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/videos").query_param("id", "v1,v2");
                then.status(200).json_body(json!({
                    "items": [{
                        "id": "v1",
                        "snippet": {
                            "title": "Highlights",
                            "channelId": "UC_LEAGUE",
                            "channelTitle": "League",
                            "publishedAt": "2024-05-01T18:30:00Z",
                            "thumbnails": {
                                "default": { "url": "https://i.ytimg.com/vi/v1/default.jpg" },
                                "medium": { "url": "https://i.ytimg.com/vi/v1/mqdefault.jpg" }
                            }
                        },
                        "contentDetails": { "duration": "PT10M5S" }
                    }]
                }));
            })
            .await;

        let details = client(&server, Some("k"))
            .video_details(&["v1".to_string(), "v2".to_string()])
            .await
            .unwrap();

        assert_eq!(details.len(), 1);
        let v = &details[0];
        assert_eq!(v.title, "Highlights");
        assert_eq!(v.duration_sec, 605);
        assert_eq!(v.channel_title, "League");
        assert_eq!(
            v.thumbnails.md.as_deref(),
            Some("https://i.ytimg.com/vi/v1/mqdefault.jpg")
        );
    }

    #[tokio::test]
    async fn test_channel_details() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/channels").query_param("id", "UC_LEAGUE");
                then.status(200).json_body(json!({
                    "items": [{
                        "id": "UC_LEAGUE",
                        "snippet": {
                            "title": "The League",
                            "thumbnails": { "default": { "url": "https://yt3.example/a.jpg" } }
                        }
                    }]
                }));
            })
            .await;

        let details = client(&server, Some("k"))
            .channel_details("UC_LEAGUE")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(details.title, "The League");
        assert_eq!(details.avatar.as_deref(), Some("https://yt3.example/a.jpg"));
    }

    #[tokio::test]
    async fn test_quota_error_is_recognised() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/search");
                then.status(403).json_body(json!({
                    "error": {
                        "code": 403,
                        "message": "The request cannot be completed because you have exceeded your quota.",
                        "errors": [{ "reason": "quotaExceeded", "domain": "youtube.quota" }]
                    }
                }));
            })
            .await;

        let result = client(&server, Some("k")).search_channel("@League").await;

        assert_eq!(result, Err(Error::QuotaExceeded));
    }

    #[tokio::test]
    async fn test_server_error_is_upstream_unavailable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/channels");
                then.status(500).body("oops");
            })
            .await;

        let result = client(&server, Some("k")).channel_details("UC").await;

        assert!(matches!(result, Err(Error::UpstreamUnavailable(_))));
    }

    #[tokio::test]
    async fn test_missing_key_makes_no_request() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.any_request();
                then.status(200);
            })
            .await;

        let youtube = client(&server, None);

        assert!(!youtube.is_configured());
        assert_eq!(
            youtube.search_channel("@League").await,
            Err(Error::ConfigurationMissing("YOUTUBE_API_KEY"))
        );
        mock.assert_hits_async(0).await;
    }
}
