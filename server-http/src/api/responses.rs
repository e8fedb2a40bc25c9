use chrono::{DateTime, Utc};
use pitchside::domain::{Poll, PollOption};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Serialize)]
pub struct HealthResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct ItemsResponse<T> {
    pub items: Vec<T>,
}

/// List with a cursor slot. Nothing is paginated yet, so the cursor is
/// always `null`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResponse<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> PagedResponse<T> {
    pub fn single_page(items: Vec<T>) -> Self {
        Self {
            items,
            next_cursor: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub ok: bool,
    pub totals: BTreeMap<Uuid, u64>,
}

#[derive(Debug, Serialize)]
pub struct CreatePollResponse {
    pub poll: Poll,
    pub options: Vec<PollOption>,
}

#[derive(Debug, Serialize)]
pub struct PollResponse {
    pub ok: bool,
    pub poll: Poll,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaResponse {
    pub used: u32,
    pub remaining: u32,
    pub daily_max: u32,
    pub safety_margin: u32,
    pub reset_at: DateTime<Utc>,
}

// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
