use super::http::ensure_success;
use super::value_to_string;
use crate::domain::{MatchRecord, ScoreScope, TeamScore};
use crate::ports::ScoreProvider;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use reqwest::Client;
use serde_json::Value;
use shared::{Error, Result};
use tracing::debug;

/// Fallback score provider (AllSportsAPI football).
pub struct AllSportsClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl AllSportsClient {
    pub fn new(http: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn query(scope: ScoreScope, today: NaiveDate) -> Vec<(&'static str, String)> {
        let mut query = match scope {
            ScoreScope::Live => vec![("met", "Livescore".to_string())],
            ScoreScope::Today => vec![
                ("met", "Fixtures".to_string()),
                ("from", today.to_string()),
                ("to", today.to_string()),
            ],
            ScoreScope::Upcoming => vec![
                ("met", "Fixtures".to_string()),
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
impl ScoreProvider for AllSportsClient {
    fn name(&self) -> &'static str {
        "allsportsapi"
    }

    async fn fetch(&self, scope: ScoreScope, today: NaiveDate) -> Result<Vec<MatchRecord>> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(Error::ConfigurationMissing("ALLSPORTS_API_KEY"))?;

        let response = self
            .http
            .get(format!("{}/", self.base_url))
            .query(&Self::query(scope, today))
            .query(&[("APIkey", key)])
            .send()
            .await?;
        let body: Value = ensure_success(self.name(), response).await?.json().await?;

        if body.get("error").is_some() || body["success"].as_i64() == Some(0) {
            let reason = body["result"][0]["msg"].as_str().unwrap_or("unknown error");
            return Err(Error::UpstreamUnavailable(format!(
                "allsportsapi rejected request: {}",
                reason
            )));
        }

        // An empty day comes back without a `result` field at all.
        let events = body["result"].as_array().map(Vec::as_slice).unwrap_or(&[]);
        let matches: Vec<MatchRecord> = events.iter().filter_map(normalize).collect();
        debug!("allsportsapi {}: {} events", scope, matches.len());
        Ok(matches)
    }
}

/// Convert one event object to a [`MatchRecord`]. Events without a key are
/// dropped.
pub fn normalize(event: &Value) -> Option<MatchRecord> {
    let id = value_to_string(&event["event_key"])?;
    let status = event["event_status"].as_str().unwrap_or_default().trim();
    let (home_goals, away_goals) = event["event_final_result"]
        .as_str()
        .and_then(parse_result)
        .or_else(|| event["event_ft_result"].as_str().and_then(parse_result))
        .unwrap_or((None, None));

    Some(MatchRecord {
        id,
        league: event["league_name"].as_str().unwrap_or_default().to_string(),
        country: value_to_string(&event["country_name"]),
        datetime: kickoff(&event["event_date"], &event["event_time"]),
        status: if status.is_empty() { "NS" } else { status }.to_string(),
        minute: parse_minute(status),
        home: TeamScore {
            id: value_to_string(&event["home_team_key"]),
            name: event["event_home_team"].as_str().unwrap_or_default().to_string(),
            logo: value_to_string(&event["home_team_logo"]),
            goals: home_goals,
        },
        away: TeamScore {
            id: value_to_string(&event["away_team_key"]),
            name: event["event_away_team"].as_str().unwrap_or_default().to_string(),
            logo: value_to_string(&event["away_team_logo"]),
            goals: away_goals,
        },
    })
}

fn kickoff(date: &Value, time: &Value) -> Option<DateTime<Utc>> {
    let date = date.as_str()?.trim();
    let time = time.as_str().map(str::trim).filter(|t| !t.is_empty()).unwrap_or("00:00");
    NaiveDateTime::parse_from_str(&format!("{} {}", date, time), "%Y-%m-%d %H:%M")
        .ok()
        .map(|naive| naive.and_utc())
}

/// `"2 - 1"` into per-side goals. A bare `"-"` means no score yet.
fn parse_result(raw: &str) -> Option<(Option<u32>, Option<u32>)> {
    let (home, away) = raw.split_once('-')?;
    let home = home.trim().parse().ok();
    let away = away.trim().parse().ok();
    match (home, away) {
        (None, None) => None,
        goals => Some(goals),
    }
}

/// Leading digits of a live status such as `"67"` or `"45+"`.
fn parse_minute(status: &str) -> Option<u32> {
    let digits: String = status.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}
