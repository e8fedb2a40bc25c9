use chrono::{DateTime, Utc};
use pitchside::domain::NewPoll;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct VideosQuery {
    pub handle: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScoresQuery {
    pub scope: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ActivePollQuery {
    pub device: Option<String>,
}

/// Admin secret passed as `?secret=` instead of the header.
#[derive(Debug, Default, Deserialize)]
pub struct AdminSecretQuery {
    pub secret: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    #[serde(default)]
    pub option_id: String,
    #[serde(default)]
    pub device_id_hash: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePollRequest {
    pub question: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(default)]
    pub is_active: bool,
    pub options: Vec<String>,
}

impl From<CreatePollRequest> for NewPoll {
    fn from(req: CreatePollRequest) -> Self {
        NewPoll {
            question: req.question,
            starts_at: req.starts_at,
            ends_at: req.ends_at,
            is_active: req.is_active,
            options: req.options,
        }
    }
}
