use super::parse_uuid;
use crate::domain::{NewPoll, Poll, PollOption};
use crate::ports::PollRepository;
use shared::{Error, Result};
use std::sync::Arc;
use tracing::info;

/// Poll management behind the admin gate.
pub struct PollAdmin {
    repo: Arc<dyn PollRepository>,
}

impl PollAdmin {
    pub const MIN_OPTIONS: usize = 2;
    pub const MAX_OPTIONS: usize = 10;

    pub fn new(repo: Arc<dyn PollRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<Poll>> {
        self.repo.list_polls().await
    }

    pub async fn create(&self, poll: NewPoll) -> Result<(Poll, Vec<PollOption>)> {
        let poll = validate(poll)?;
        let (created, options) = self.repo.create_poll(poll).await?;
        info!("created poll {} with {} options", created.id, options.len());
        Ok((created, options))
    }

    pub async fn activate(&self, poll_id: &str) -> Result<Poll> {
        self.set_active(poll_id, true).await
    }

    pub async fn deactivate(&self, poll_id: &str) -> Result<Poll> {
        self.set_active(poll_id, false).await
    }

    async fn set_active(&self, poll_id: &str, active: bool) -> Result<Poll> {
        let id = parse_uuid("pollId", poll_id)?;
        let poll = self.repo.set_active(id, active).await?;
        info!("poll {} is_active={}", poll.id, poll.is_active);
        Ok(poll)
    }
}

/// Trim text fields and check the poll is well formed.
fn validate(poll: NewPoll) -> Result<NewPoll> {
    let question = poll.question.trim().to_string();
    if question.is_empty() {
        return Err(Error::validation("question", "must not be empty"));
    }
    if poll.ends_at <= poll.starts_at {
        return Err(Error::validation("endsAt", "must be after startsAt"));
    }

    let options: Vec<String> = poll.options.iter().map(|o| o.trim().to_string()).collect();
    if options.iter().any(String::is_empty) {
        return Err(Error::validation("options", "option text must not be empty"));
    }
    if !(PollAdmin::MIN_OPTIONS..=PollAdmin::MAX_OPTIONS).contains(&options.len()) {
        return Err(Error::validation(
            "options",
            format!(
                "between {} and {} options required",
                PollAdmin::MIN_OPTIONS,
                PollAdmin::MAX_OPTIONS
            ),
        ));
    }

    Ok(NewPoll {
        question,
        options,
        ..poll
    })
}
