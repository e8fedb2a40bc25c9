use super::{parse_uuid, validate_device_hash};
use crate::domain::{Poll, PollOption, Vote};
use crate::ports::PollRepository;
use serde::Serialize;
use shared::{Clock, Error, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionTally {
    pub id: Uuid,
    pub text: String,
    pub order: i32,
    pub votes: u64,
}

/// The open poll as seen by one device.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivePollView {
    #[serde(flatten)]
    pub poll: Poll,
    pub options: Vec<OptionTally>,
    pub total_votes: u64,
    pub has_voted: bool,
    pub voted_option_id: Option<Uuid>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VoteReceipt {
    /// Count per option, zero-vote options included.
    pub totals: BTreeMap<Uuid, u64>,
    /// The device had already voted; nothing was inserted.
    #[serde(skip)]
    pub duplicate: bool,
}

/// Read, vote and tally over a [`PollRepository`].
pub struct PollEngine {
    repo: Arc<dyn PollRepository>,
    clock: Arc<dyn Clock>,
}

impl PollEngine {
    pub fn new(repo: Arc<dyn PollRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// `None` when no poll is open. `device` is optional; without a usable
    /// hash the view reports `has_voted = false`.
    pub async fn active_poll(&self, device: Option<&str>) -> Result<Option<ActivePollView>> {
        let Some(poll) = self.repo.active_poll(self.clock.now()).await? else {
            return Ok(None);
        };
        let options = self.repo.options(poll.id).await?;
        let votes = self.repo.votes(poll.id).await?;

        let device = device.and_then(|d| validate_device_hash(d).ok());
        let voted_option_id = device.and_then(|hash| {
            votes
                .iter()
                .find(|v| v.device_hash == hash)
                .map(|v| v.option_id)
        });

        let totals = tally(&options, &votes);
        let options: Vec<OptionTally> = options
            .into_iter()
            .map(|o| OptionTally {
                votes: totals.get(&o.id).copied().unwrap_or(0),
                id: o.id,
                text: o.text,
                order: o.order,
            })
            .collect();

        Ok(Some(ActivePollView {
            poll,
            total_votes: options.iter().map(|o| o.votes).sum(),
            options,
            has_voted: voted_option_id.is_some(),
            voted_option_id,
        }))
    }

    /// Record one vote per device. A repeat vote from the same device is a
    /// successful no-op; either way the current totals are returned.
    pub async fn cast_vote(
        &self,
        poll_id: &str,
        option_id: &str,
        device_hash: &str,
    ) -> Result<VoteReceipt> {
        let poll_id = parse_uuid("pollId", poll_id)?;
        let option_id = parse_uuid("optionId", option_id)?;
        let device_hash = validate_device_hash(device_hash)?;

        let options = self.repo.options(poll_id).await?;
        if options.is_empty() {
            return Err(Error::NotFound(format!("poll {}", poll_id)));
        }
        if !options.iter().any(|o| o.id == option_id) {
            return Err(Error::validation(
                "optionId",
                format!("option {} is not part of poll {}", option_id, poll_id),
            ));
        }

        let vote = Vote {
            poll_id,
            option_id,
            device_hash: device_hash.to_string(),
        };
        let duplicate = match self.repo.insert_vote(&vote).await {
            Ok(()) => {
                info!("vote recorded for poll {}", poll_id);
                false
            }
            Err(Error::Conflict) => {
                debug!("device already voted on poll {}", poll_id);
                true
            }
            Err(err) => return Err(err),
        };

        let votes = self.repo.votes(poll_id).await?;
        Ok(VoteReceipt {
            totals: tally(&options, &votes),
            duplicate,
        })
    }
}

/// Per-option vote counts. Votes for options outside `options` are ignored.
pub fn tally(options: &[PollOption], votes: &[Vote]) -> BTreeMap<Uuid, u64> {
    let mut totals: BTreeMap<Uuid, u64> = options.iter().map(|o| (o.id, 0)).collect();
    for vote in votes {
        if let Some(count) = totals.get_mut(&vote.option_id) {
            *count += 1;
        }
    }
    totals
}
