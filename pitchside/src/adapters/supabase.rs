use crate::domain::{NewPoll, Poll, PollOption, Vote};
use crate::ports::PollRepository;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared::{Error, Result};
use tracing::{debug, error, warn};
use uuid::Uuid;

/// SQLSTATE for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

/// Poll storage on a Supabase project through its PostgREST endpoint.
///
/// Tables: `polls`, `poll_options` (ordered by `sort_order`) and `poll_votes`
/// with a unique constraint on `(poll_id, device_hash)`.
pub struct SupabasePollRepository {
    http: Client,
    rest_url: String,
    service_key: String,
}

impl SupabasePollRepository {
    pub fn new(http: Client, project_url: &str, service_key: impl Into<String>) -> Self {
        Self {
            http,
            rest_url: format!("{}/rest/v1", project_url.trim_end_matches('/')),
            service_key: service_key.into(),
        }
    }

    fn request(&self, method: reqwest::Method, table: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}/{}", self.rest_url, table))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn delete_poll(&self, poll_id: Uuid) {
        let result = self
            .request(reqwest::Method::DELETE, "polls")
            .query(&[("id", format!("eq.{}", poll_id))])
            .send()
            .await
            .map_err(storage_error);
        let result = match result {
            Ok(response) => ensure_stored(response).await.map(|_| ()),
            Err(err) => Err(err),
        };
        match result {
            Ok(()) => debug!("removed poll {} after failed option insert", poll_id),
            Err(err) => error!("poll {} left without options: {}", poll_id, err),
        }
    }

    async fn read<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(storage_error)?;
        let response = ensure_stored(response).await?;
        response.json::<T>().await.map_err(storage_error)
    }
}

fn storage_error(err: reqwest::Error) -> Error {
    Error::Storage(err.to_string())
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Default, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

async fn ensure_stored(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body: PostgrestError = response.json().await.unwrap_or_default();
    if status == StatusCode::CONFLICT || body.code == UNIQUE_VIOLATION {
        return Err(Error::Conflict);
    }
    warn!("poll store returned {}: {} {}", status, body.code, body.message);
    Err(Error::Storage(format!("poll store returned {}", status)))
}

#[derive(Debug, Serialize, Deserialize)]
struct PollRow {
    id: Uuid,
    question: String,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    is_active: bool,
}

impl From<PollRow> for Poll {
    fn from(row: PollRow) -> Self {
        Poll {
            id: row.id,
            question: row.question,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            is_active: row.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
struct NewPollRow<'a> {
    question: &'a str,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    is_active: bool,
}

#[derive(Debug, Deserialize)]
struct OptionRow {
    id: Uuid,
    poll_id: Uuid,
    text: String,
    sort_order: i32,
}

impl From<OptionRow> for PollOption {
    fn from(row: OptionRow) -> Self {
        PollOption {
            id: row.id,
            poll_id: row.poll_id,
            text: row.text,
            order: row.sort_order,
        }
    }
}

#[derive(Debug, Serialize)]
struct NewOptionRow<'a> {
    poll_id: Uuid,
    text: &'a str,
    sort_order: i32,
}

#[derive(Debug, Serialize, Deserialize)]
struct VoteRow {
    poll_id: Uuid,
    option_id: Uuid,
    device_hash: String,
}

#[async_trait]
impl PollRepository for SupabasePollRepository {
    async fn active_poll(&self, now: DateTime<Utc>) -> Result<Option<Poll>> {
        let now = timestamp(now);
        let started = format!("lte.{}", now);
        let not_ended = format!("gte.{}", now);
        let rows: Vec<PollRow> = Self::read(self.request(reqwest::Method::GET, "polls").query(&[
            ("select", "*"),
            ("is_active", "eq.true"),
            ("starts_at", started.as_str()),
            ("ends_at", not_ended.as_str()),
            ("order", "starts_at.desc,id.desc"),
            ("limit", "1"),
        ]))
        .await?;
        Ok(rows.into_iter().next().map(Poll::from))
    }

    async fn options(&self, poll_id: Uuid) -> Result<Vec<PollOption>> {
        let poll_filter = format!("eq.{}", poll_id);
        let rows: Vec<OptionRow> =
            Self::read(self.request(reqwest::Method::GET, "poll_options").query(&[
                ("select", "*"),
                ("poll_id", poll_filter.as_str()),
                ("order", "sort_order.asc"),
            ]))
            .await?;
        Ok(rows.into_iter().map(PollOption::from).collect())
    }

    async fn votes(&self, poll_id: Uuid) -> Result<Vec<Vote>> {
        let poll_filter = format!("eq.{}", poll_id);
        let rows: Vec<VoteRow> =
            Self::read(self.request(reqwest::Method::GET, "poll_votes").query(&[
                ("select", "poll_id,option_id,device_hash"),
                ("poll_id", poll_filter.as_str()),
            ]))
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| Vote {
                poll_id: row.poll_id,
                option_id: row.option_id,
                device_hash: row.device_hash,
            })
            .collect())
    }

    async fn insert_vote(&self, vote: &Vote) -> Result<()> {
        let row = VoteRow {
            poll_id: vote.poll_id,
            option_id: vote.option_id,
            device_hash: vote.device_hash.clone(),
        };
        let response = self
            .request(reqwest::Method::POST, "poll_votes")
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await
            .map_err(storage_error)?;
        ensure_stored(response).await?;
        debug!("stored vote for poll {}", vote.poll_id);
        Ok(())
    }

    async fn list_polls(&self) -> Result<Vec<Poll>> {
        let rows: Vec<PollRow> = Self::read(
            self.request(reqwest::Method::GET, "polls")
                .query(&[("select", "*"), ("order", "starts_at.desc")]),
        )
        .await?;
        Ok(rows.into_iter().map(Poll::from).collect())
    }

    async fn create_poll(&self, poll: NewPoll) -> Result<(Poll, Vec<PollOption>)> {
        let rows: Vec<PollRow> = Self::read(
            self.request(reqwest::Method::POST, "polls")
                .header("Prefer", "return=representation")
                .json(&[NewPollRow {
                    question: &poll.question,
                    starts_at: poll.starts_at,
                    ends_at: poll.ends_at,
                    is_active: poll.is_active,
                }]),
        )
        .await?;
        let created: Poll = rows
            .into_iter()
            .next()
            .map(Poll::from)
            .ok_or_else(|| Error::Storage("poll insert returned no row".into()))?;

        let option_rows: Vec<NewOptionRow> = poll
            .options
            .iter()
            .enumerate()
            .map(|(index, text)| NewOptionRow {
                poll_id: created.id,
                text,
                sort_order: index as i32,
            })
            .collect();
        let inserted = Self::read::<Vec<OptionRow>>(
            self.request(reqwest::Method::POST, "poll_options")
                .header("Prefer", "return=representation")
                .json(&option_rows),
        )
        .await;
        let rows = match inserted {
            Ok(rows) => rows,
            Err(err) => {
                // A poll without options must not outlive the failed create.
                self.delete_poll(created.id).await;
                return Err(err);
            }
        };
        let mut options: Vec<PollOption> = rows.into_iter().map(PollOption::from).collect();
        options.sort_by_key(|o| o.order);

        Ok((created, options))
    }

    async fn set_active(&self, poll_id: Uuid, active: bool) -> Result<Poll> {
        let rows: Vec<PollRow> = Self::read(
            self.request(reqwest::Method::PATCH, "polls")
                .query(&[("id", format!("eq.{}", poll_id))])
                .header("Prefer", "return=representation")
                .json(&serde_json::json!({ "is_active": active })),
        )
        .await?;
        rows.into_iter()
            .next()
            .map(Poll::from)
            .ok_or_else(|| Error::NotFound(format!("poll {}", poll_id)))
    }
}
