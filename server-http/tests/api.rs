use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use pitchside::domain::{
    ChannelDetails, MatchRecord, NewsRecord, ScoreScope, TeamScore, Thumbnails, VideoDetails,
};
use pitchside::persistence::MemoryPollRepository;
use pitchside::ports::{FeedFetcher, ScoreProvider, VideoCatalog};
use reqwest::StatusCode;
use serde_json::{Value, json};
use server_http::{AppState, Collaborators, build_router};
use shared::config::{Config, FeedConfig};
use shared::{Error, Result, SystemClock};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;

const SECRET: &str = "correct horse battery staple";

// === Fakes ===

struct StaticCatalog {
    configured: bool,
}

#[async_trait]
impl VideoCatalog for StaticCatalog {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn search_channel(&self, handle: &str) -> Result<Option<String>> {
        Ok(Some(format!("UC{}", handle.trim_start_matches('@'))))
    }

    async fn recent_video_ids(&self, _channel_id: &str, _max: usize) -> Result<Vec<String>> {
        Ok(vec!["v1".into()])
    }

    async fn video_details(&self, ids: &[String]) -> Result<Vec<VideoDetails>> {
        Ok(ids
            .iter()
            .map(|id| VideoDetails {
                id: id.clone(),
                title: "Extended highlights".into(),
                channel_id: "UCleague".into(),
                channel_title: "League".into(),
                published_at: Utc::now() - Duration::hours(2),
                duration_sec: 600,
                thumbnails: Thumbnails::default(),
            })
            .collect())
    }

    async fn channel_details(&self, _channel_id: &str) -> Result<Option<ChannelDetails>> {
        Ok(Some(ChannelDetails {
            title: "League".into(),
            avatar: Some("https://img.example/league.png".into()),
        }))
    }
}

struct StaticFeeds;

#[async_trait]
impl FeedFetcher for StaticFeeds {
    async fn fetch(&self, feed: &FeedConfig) -> Result<Vec<NewsRecord>> {
        let url = format!("https://{}.example/story", feed.name.to_lowercase());
        Ok(vec![NewsRecord {
            id: NewsRecord::id_for(&url),
            url,
            title: "Late winner".into(),
            image: None,
            source: feed.name.clone(),
            published_at: Some(Utc::now()),
            summary: None,
        }])
    }
}

struct StaticProvider {
    name: &'static str,
    up: bool,
}

#[async_trait]
impl ScoreProvider for StaticProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self, _scope: ScoreScope, _today: NaiveDate) -> Result<Vec<MatchRecord>> {
        if !self.up {
            return Err(Error::UpstreamUnavailable(format!("{} is down", self.name)));
        }
        Ok(vec![MatchRecord {
            id: format!("{}-1", self.name),
            league: "Serie A".into(),
            country: Some("Italy".into()),
            datetime: None,
            status: "1H".into(),
            minute: Some(12),
            home: TeamScore {
                name: "Inter".into(),
                goals: Some(1),
                ..TeamScore::default()
            },
            away: TeamScore {
                name: "Roma".into(),
                goals: Some(0),
                ..TeamScore::default()
            },
        }])
    }
}

// === Harness ===

struct Setup {
    vars: HashMap<&'static str, String>,
    youtube_configured: bool,
    primary_up: bool,
}

impl Setup {
    fn new() -> Self {
        let mut vars = HashMap::new();
        vars.insert("ADMIN_SECRET", SECRET.to_string());
        vars.insert("PITCHSIDE_CHANNEL_HANDLES", "@league".to_string());
        vars.insert("PITCHSIDE_NEWS_FEEDS", "Wire|https://wire.example/rss".to_string());
        Self {
            vars,
            youtube_configured: true,
            primary_up: true,
        }
    }

    fn var(mut self, key: &'static str, value: &str) -> Self {
        self.vars.insert(key, value.to_string());
        self
    }

    fn without(mut self, key: &'static str) -> Self {
        self.vars.remove(key);
        self
    }

    async fn spawn(self) -> String {
        let config = Config::from_lookup(|key| self.vars.get(key).cloned());
        let collaborators = Collaborators {
            catalog: Arc::new(StaticCatalog {
                configured: self.youtube_configured,
            }),
            feeds: Arc::new(StaticFeeds),
            score_providers: vec![
                Arc::new(StaticProvider {
                    name: "primary",
                    up: self.primary_up,
                }),
                Arc::new(StaticProvider {
                    name: "secondary",
                    up: true,
                }),
            ],
            polls: Arc::new(MemoryPollRepository::new()),
            clock: Arc::new(SystemClock),
        };
        let router = build_router(AppState::new(&config, collaborators));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }
}

async fn get(url: String) -> (StatusCode, Value) {
    let res = reqwest::get(url).await.unwrap();
    let status = res.status();
    (status, res.json().await.unwrap())
}

async fn post(url: String, body: Value, secret: Option<&str>) -> (StatusCode, Value) {
    let mut req = reqwest::Client::new().post(url).json(&body);
    if let Some(secret) = secret {
        req = req.header("x-admin-secret", secret);
    }
    let res = req.send().await.unwrap();
    let status = res.status();
    (status, res.json().await.unwrap())
}

fn device(c: char) -> String {
    c.to_string().repeat(64)
}

async fn create_open_poll(base: &str) -> Value {
    let now = Utc::now();
    let (status, body) = post(
        format!("{}/admin/polls", base),
        json!({
            "question": "Man of the match?",
            "startsAt": now - Duration::hours(1),
            "endsAt": now + Duration::hours(1),
            "isActive": true,
            "options": ["Lautaro", "Barella", "Dybala"]
        }),
        Some(SECRET),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

// === Public endpoints ===

#[tokio::test]
async fn test_health() {
    let base = Setup::new().spawn().await;

    let (status, body) = get(format!("{}/health", base)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));
}

#[tokio::test]
async fn test_videos_and_channels() {
    let base = Setup::new().spawn().await;

    let (status, body) = get(format!("{}/videos", base)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nextCursor"], Value::Null);
    assert_eq!(body["items"][0]["id"], "v1");
    assert_eq!(body["items"][0]["url"], "https://www.youtube.com/watch?v=v1");

    let (status, body) = get(format!("{}/channels", base)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"][0]["handle"], "@league");
    assert_eq!(body["items"][0]["channelId"], "UCleague");
    assert_eq!(body["items"][0]["avatar"], "https://img.example/league.png");
}

#[tokio::test]
async fn test_videos_without_key_is_server_error() {
    let mut setup = Setup::new();
    setup.youtube_configured = false;
    let base = setup.spawn().await;

    let (status, body) = get(format!("{}/videos?handle=@league", base)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("YOUTUBE_API_KEY"));
}

#[tokio::test]
async fn test_hardened_mode_hides_server_error_detail() {
    let mut setup = Setup::new().var("PITCHSIDE_ENV", "production");
    setup.youtube_configured = false;
    let base = setup.spawn().await;

    let (status, body) = get(format!("{}/videos", base)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "internal error" }));

    // Client errors keep their message.
    let (status, body) = get(format!("{}/scores?scope=yesterday", base)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("scope"));
}

#[tokio::test]
async fn test_news() {
    let base = Setup::new().spawn().await;

    let (status, body) = get(format!("{}/news", base)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nextCursor"], Value::Null);
    assert_eq!(body["items"][0]["source"], "Wire");
}

#[tokio::test]
async fn test_scores_default_scope_and_failover() {
    let mut setup = Setup::new();
    setup.primary_up = false;
    let base = setup.spawn().await;

    let (status, body) = get(format!("{}/scores", base)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"][0]["id"], "secondary-1");
    assert_eq!(body["items"][0]["home"]["goals"], 1);
}

#[tokio::test]
async fn test_scores_rejects_unknown_scope() {
    let base = Setup::new().spawn().await;

    let (status, body) = get(format!("{}/scores?scope=yesterday", base)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

// === Polls ===

#[tokio::test]
async fn test_no_active_poll_is_null() {
    let base = Setup::new().spawn().await;

    let (status, body) = get(format!("{}/polls/active", base)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn test_vote_flow_is_idempotent() {
    let base = Setup::new().spawn().await;
    let created = create_open_poll(&base).await;
    let poll_id = created["poll"]["id"].as_str().unwrap().to_string();
    let option_id = created["options"][1]["id"].as_str().unwrap().to_string();
    let vote = json!({ "optionId": option_id, "deviceIdHash": device('a') });

    let (status, first) = post(format!("{}/polls/{}/vote", base, poll_id), vote.clone(), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["ok"], true);
    assert_eq!(first["totals"][&option_id], 1);

    let (status, second) = post(format!("{}/polls/{}/vote", base, poll_id), vote, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["totals"], first["totals"]);

    let (_, view) = get(format!("{}/polls/active?device={}", base, device('a'))).await;
    assert_eq!(view["id"], poll_id.as_str());
    assert_eq!(view["hasVoted"], true);
    assert_eq!(view["votedOptionId"], option_id.as_str());
    assert_eq!(view["totalVotes"], 1);
    assert_eq!(view["options"].as_array().unwrap().len(), 3);

    let (_, view) = get(format!("{}/polls/active?device={}", base, device('b'))).await;
    assert_eq!(view["hasVoted"], false);
}

#[tokio::test]
async fn test_vote_validation() {
    let base = Setup::new().spawn().await;
    let created = create_open_poll(&base).await;
    let poll_id = created["poll"]["id"].as_str().unwrap().to_string();
    let option_id = created["options"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = post(
        format!("{}/polls/{}/vote", base, poll_id),
        json!({ "optionId": option_id, "deviceIdHash": "short" }),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("deviceIdHash"));

    let (status, _) = post(
        format!("{}/polls/not-a-uuid/vote", base),
        json!({ "optionId": option_id, "deviceIdHash": device('a') }),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let res = reqwest::Client::new()
        .post(format!("{}/polls/{}/vote", base, poll_id))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

// === Admin ===

#[tokio::test]
async fn test_admin_requires_secret() {
    let base = Setup::new().spawn().await;

    let (status, _) = get(format!("{}/admin/polls", base)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = post(
        format!("{}/admin/polls", base),
        json!({}),
        Some("wrong secret"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, body) = get(format!("{}/admin/polls?secret={}", base, "correct%20horse%20battery%20staple")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"], json!([]));
}

#[tokio::test]
async fn test_admin_disabled_without_secret() {
    let base = Setup::new().without("ADMIN_SECRET").spawn().await;

    let (status, _) = post(format!("{}/admin/polls", base), json!({}), Some("anything")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_admin_page_is_public() {
    let base = Setup::new().without("ADMIN_SECRET").spawn().await;

    let res = reqwest::get(format!("{}/admin", base)).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.text().await.unwrap().contains("Pitchside admin"));
}

#[tokio::test]
async fn test_admin_poll_lifecycle() {
    let base = Setup::new().spawn().await;
    let created = create_open_poll(&base).await;
    let poll_id = created["poll"]["id"].as_str().unwrap().to_string();
    assert_eq!(created["options"][2]["order"], 2);

    let (status, body) = post(
        format!("{}/admin/polls/{}/deactivate", base, poll_id),
        Value::Null,
        Some(SECRET),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["poll"]["isActive"], false);

    let (_, active) = get(format!("{}/polls/active", base)).await;
    assert_eq!(active, Value::Null);

    let (status, body) = post(
        format!("{}/admin/polls/{}/activate", base, poll_id),
        Value::Null,
        Some(SECRET),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["poll"]["isActive"], true);

    let (status, _) = post(
        format!("{}/admin/polls/{}/activate", base, uuid::Uuid::new_v4()),
        Value::Null,
        Some(SECRET),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_create_validation() {
    let base = Setup::new().spawn().await;
    let now = Utc::now();

    let (status, body) = post(
        format!("{}/admin/polls", base),
        json!({
            "question": "Only one choice?",
            "startsAt": now,
            "endsAt": now + Duration::days(1),
            "options": ["Yes"]
        }),
        Some(SECRET),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("options"));
}

#[tokio::test]
async fn test_admin_quota() {
    let base = Setup::new().spawn().await;
    get(format!("{}/videos", base)).await;

    let res = reqwest::Client::new()
        .get(format!("{}/admin/quota", base))
        .header("x-admin-secret", SECRET)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();

    assert_eq!(body["dailyMax"], 10000);
    assert_eq!(body["safetyMargin"], 500);
    assert!(body["used"].as_u64().unwrap() > 0);
    assert!(body["resetAt"].is_string());
}
