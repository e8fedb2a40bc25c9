use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use shared::config::QuotaPolicy;
use shared::{Clock, Error, Result};
use std::sync::Arc;
use tracing::{debug, warn};

/// Video catalog operations, priced by [`QuotaPolicy`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuotaOp {
    Search,
    List,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaState {
    pub used: u32,
    pub reset_at: DateTime<Utc>,
}

/// Daily call budget for the video catalog API.
///
/// State is per process; separate instances do not share a budget.
pub struct QuotaGovernor {
    policy: QuotaPolicy,
    state: Mutex<QuotaState>,
    clock: Arc<dyn Clock>,
}

impl QuotaGovernor {
    const WINDOW_HOURS: i64 = 24;

    pub fn new(policy: QuotaPolicy, clock: Arc<dyn Clock>) -> Self {
        let reset_at = clock.now() + Duration::hours(Self::WINDOW_HOURS);
        Self {
            policy,
            state: Mutex::new(QuotaState { used: 0, reset_at }),
            clock,
        }
    }

    pub fn policy(&self) -> &QuotaPolicy {
        &self.policy
    }

    pub fn cost(&self, op: QuotaOp) -> u32 {
        match op {
            QuotaOp::Search => self.policy.search_cost,
            QuotaOp::List => self.policy.list_cost,
        }
    }

    fn ceiling(&self) -> u32 {
        self.policy
            .daily_max
            .saturating_sub(self.policy.safety_margin)
    }

    fn roll(&self, state: &mut QuotaState) {
        let now = self.clock.now();
        if now > state.reset_at {
            debug!("quota window rolled over, {} units were used", state.used);
            state.used = 0;
            state.reset_at = now + Duration::hours(Self::WINDOW_HOURS);
        }
    }

    pub fn can_make_call(&self, op: QuotaOp) -> bool {
        let mut state = self.state.lock();
        self.roll(&mut state);
        state.used.saturating_add(self.cost(op)) < self.ceiling()
    }

    /// Call after a confirmed successful upstream call.
    pub fn record_usage(&self, op: QuotaOp) {
        let mut state = self.state.lock();
        self.roll(&mut state);
        state.used = state.used.saturating_add(self.cost(op));
    }

    /// [`Self::can_make_call`] as a `Result`, logging denials.
    pub fn ensure(&self, op: QuotaOp) -> Result<()> {
        if self.can_make_call(op) {
            Ok(())
        } else {
            warn!("quota denied {:?} call ({} units)", op, self.cost(op));
            Err(Error::QuotaExceeded)
        }
    }

    pub fn snapshot(&self) -> QuotaState {
        let mut state = self.state.lock();
        self.roll(&mut state);
        *state
    }
}

impl std::fmt::Debug for QuotaGovernor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuotaGovernor")
            .field("policy", &self.policy)
            .field("state", &*self.state.lock())
            .finish()
    }
}
