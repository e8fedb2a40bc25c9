use super::{Freshness, cached_or_refresh};
use crate::domain::{MatchRecord, ScoreScope};
use crate::ports::ScoreProvider;
use shared::config::CacheTtls;
use shared::{Clock, Error, Result};
use std::fmt;
use std::sync::Arc;
use storage_engine::TtlCache;
use tracing::{debug, info, warn};

/// Why a provider was skipped.
#[derive(Clone, Debug, PartialEq)]
pub struct ProviderFailure {
    pub provider: &'static str,
    pub error: Error,
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.provider, self.error)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScoreOutcome {
    pub provider: &'static str,
    pub items: Vec<MatchRecord>,
    /// Providers tried before the one that answered.
    pub failures: Vec<ProviderFailure>,
}

/// Ordered list of providers; the first success wins.
pub struct ScoreFailover {
    providers: Vec<Arc<dyn ScoreProvider>>,
}

impl ScoreFailover {
    pub fn new(providers: Vec<Arc<dyn ScoreProvider>>) -> Self {
        Self { providers }
    }

    pub async fn fetch(
        &self,
        scope: ScoreScope,
        today: chrono::NaiveDate,
    ) -> std::result::Result<ScoreOutcome, Vec<ProviderFailure>> {
        let mut failures = Vec::new();

        for provider in &self.providers {
            match provider.fetch(scope, today).await {
                Ok(items) => {
                    if !failures.is_empty() {
                        info!(
                            "{} scores served by {} after failover",
                            scope,
                            provider.name()
                        );
                    }
                    return Ok(ScoreOutcome {
                        provider: provider.name(),
                        items,
                        failures,
                    });
                }
                Err(error) => {
                    warn!("score provider {} failed for {}: {}", provider.name(), scope, error);
                    failures.push(ProviderFailure {
                        provider: provider.name(),
                        error,
                    });
                }
            }
        }

        Err(failures)
    }
}

/// Live / today / upcoming matches, each scope cached independently.
pub struct ScoreAggregator {
    failover: ScoreFailover,
    cache: TtlCache<Vec<MatchRecord>>,
    clock: Arc<dyn Clock>,
    ttls: CacheTtls,
}

impl ScoreAggregator {
    pub fn new(failover: ScoreFailover, ttls: CacheTtls, clock: Arc<dyn Clock>) -> Self {
        Self {
            failover,
            cache: TtlCache::new("scores", clock.clone()),
            clock,
            ttls,
        }
    }

    fn ttl(&self, scope: ScoreScope) -> std::time::Duration {
        match scope {
            ScoreScope::Live => self.ttls.scores_live,
            ScoreScope::Today => self.ttls.scores_today,
            ScoreScope::Upcoming => self.ttls.scores_upcoming,
        }
    }

    /// Matches for `scope`. When every provider fails and nothing is cached
    /// the result is empty rather than an error.
    pub async fn scores(&self, scope: ScoreScope) -> Vec<MatchRecord> {
        let freshness = Freshness::new(self.ttl(scope), self.ttls.stale_restamp);

        let result: Result<Vec<MatchRecord>> =
            cached_or_refresh(&self.cache, scope.as_str(), freshness, || async {
                let today = self.clock.now().date_naive();
                match self.failover.fetch(scope, today).await {
                    Ok(outcome) => {
                        debug!(
                            "{} {} matches from {}",
                            outcome.items.len(),
                            scope,
                            outcome.provider
                        );
                        Ok(outcome.items)
                    }
                    Err(failures) => {
                        let reasons: Vec<String> =
                            failures.iter().map(ToString::to_string).collect();
                        Err(Error::UpstreamUnavailable(format!(
                            "no score provider answered: {}",
                            reasons.join("; ")
                        )))
                    }
                }
            })
            .await;

        result.unwrap_or_else(|err| {
            warn!("{} scores unavailable, returning empty list: {}", scope, err);
            Vec::new()
        })
    }
}
