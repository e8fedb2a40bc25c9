use super::http::ensure_success;
use super::{value_to_string, value_to_u32};
use crate::domain::{MatchRecord, ScoreScope, TeamScore};
use crate::ports::ScoreProvider;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde_json::Value;
use shared::{Error, Result};
use tracing::debug;

/// Primary score provider (API-Football v3).
pub struct ApiFootballClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ApiFootballClient {
    pub fn new(http: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn query(scope: ScoreScope, today: NaiveDate) -> Vec<(&'static str, String)> {
        let mut query = match scope {
            ScoreScope::Live => vec![("live", "all".to_string())],
            ScoreScope::Today => vec![("date", today.to_string())],
            ScoreScope::Upcoming => vec![
                ("from", today.to_string()),
                (
                    "to",
                    (today + chrono::Days::new(ScoreScope::UPCOMING_DAYS as u64)).to_string(),
                ),
            ],
        };
        query.push(("timezone", "UTC".to_string()));
        query
    }
}

#[async_trait]
impl ScoreProvider for ApiFootballClient {
    fn name(&self) -> &'static str {
        "api-football"
    }

    async fn fetch(&self, scope: ScoreScope, today: NaiveDate) -> Result<Vec<MatchRecord>> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(Error::ConfigurationMissing("API_FOOTBALL_KEY"))?;

        let response = self
            .http
            .get(format!("{}/fixtures", self.base_url))
            .header("x-apisports-key", key)
            .query(&Self::query(scope, today))
            .send()
            .await?;
        let body: Value = ensure_success(self.name(), response).await?.json().await?;

        // Auth and plan errors come back as 200 with a populated `errors` field.
        if has_errors(&body["errors"]) {
            return Err(Error::UpstreamUnavailable(format!(
                "api-football rejected request: {}",
                body["errors"]
            )));
        }

        let fixtures = body["response"].as_array().map(Vec::as_slice).unwrap_or(&[]);
        let matches: Vec<MatchRecord> = fixtures.iter().filter_map(normalize).collect();
        debug!("api-football {}: {} fixtures", scope, matches.len());
        Ok(matches)
    }
}

fn has_errors(errors: &Value) -> bool {
    match errors {
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::String(s) => !s.is_empty(),
        _ => false,
    }
}

/// Convert one fixture object to a [`MatchRecord`]. Fixtures without an id
/// are dropped.
pub fn normalize(fixture: &Value) -> Option<MatchRecord> {
    let id = value_to_string(&fixture["fixture"]["id"])?;
    let status = &fixture["fixture"]["status"];

    Some(MatchRecord {
        id,
        league: fixture["league"]["name"].as_str().unwrap_or_default().to_string(),
        country: value_to_string(&fixture["league"]["country"]),
        datetime: fixture["fixture"]["date"]
            .as_str()
            .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
            .map(|d| d.with_timezone(&Utc)),
        status: status["short"].as_str().unwrap_or("NS").to_string(),
        minute: value_to_u32(&status["elapsed"]),
        home: team(&fixture["teams"]["home"], &fixture["goals"]["home"]),
        away: team(&fixture["teams"]["away"], &fixture["goals"]["away"]),
    })
}

fn team(team: &Value, goals: &Value) -> TeamScore {
    TeamScore {
        id: value_to_string(&team["id"]),
        name: team["name"].as_str().unwrap_or_default().to_string(),
        logo: value_to_string(&team["logo"]),
        goals: value_to_u32(goals),
    }
}
