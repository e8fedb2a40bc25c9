use crate::domain::{NewPoll, Poll, PollOption, Vote};
use crate::ports::PollRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{Error, Result};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    polls: HashMap<Uuid, Poll>,
    options: HashMap<Uuid, Vec<PollOption>>,
    votes: Vec<Vote>,
    voted: HashSet<(Uuid, String)>,
}

/// In-process poll store, used when no external store is configured and in
/// tests. Enforces one vote per `(poll, device)` like the real table.
#[derive(Default)]
pub struct MemoryPollRepository {
    tables: RwLock<Tables>,
}

impl MemoryPollRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PollRepository for MemoryPollRepository {
    async fn active_poll(&self, now: DateTime<Utc>) -> Result<Option<Poll>> {
        let tables = self.tables.read().await;
        Ok(tables
            .polls
            .values()
            .filter(|p| p.is_open_at(now))
            // same start: highest id wins, matching `starts_at.desc,id.desc`
            .max_by_key(|p| (p.starts_at, p.id))
            .cloned())
    }

    async fn options(&self, poll_id: Uuid) -> Result<Vec<PollOption>> {
        let tables = self.tables.read().await;
        let mut options = tables.options.get(&poll_id).cloned().unwrap_or_default();
        options.sort_by_key(|o| o.order);
        Ok(options)
    }

    async fn votes(&self, poll_id: Uuid) -> Result<Vec<Vote>> {
        let tables = self.tables.read().await;
        Ok(tables
            .votes
            .iter()
            .filter(|v| v.poll_id == poll_id)
            .cloned()
            .collect())
    }

    async fn insert_vote(&self, vote: &Vote) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.voted.insert((vote.poll_id, vote.device_hash.clone())) {
            return Err(Error::Conflict);
        }
        tables.votes.push(vote.clone());
        Ok(())
    }

    async fn list_polls(&self) -> Result<Vec<Poll>> {
        let tables = self.tables.read().await;
        let mut polls: Vec<Poll> = tables.polls.values().cloned().collect();
        polls.sort_by(|a, b| b.starts_at.cmp(&a.starts_at));
        Ok(polls)
    }

    async fn create_poll(&self, poll: NewPoll) -> Result<(Poll, Vec<PollOption>)> {
        let created = Poll {
            id: Uuid::new_v4(),
            question: poll.question,
            starts_at: poll.starts_at,
            ends_at: poll.ends_at,
            is_active: poll.is_active,
        };
        let options: Vec<PollOption> = poll
            .options
            .into_iter()
            .enumerate()
            .map(|(index, text)| PollOption {
                id: Uuid::new_v4(),
                poll_id: created.id,
                text,
                order: index as i32,
            })
            .collect();

        let mut tables = self.tables.write().await;
        tables.polls.insert(created.id, created.clone());
        tables.options.insert(created.id, options.clone());
        Ok((created, options))
    }

    async fn set_active(&self, poll_id: Uuid, active: bool) -> Result<Poll> {
        let mut tables = self.tables.write().await;
        let poll = tables
            .polls
            .get_mut(&poll_id)
            .ok_or_else(|| Error::NotFound(format!("poll {}", poll_id)))?;
        poll.is_active = active;
        Ok(poll.clone())
    }
}
