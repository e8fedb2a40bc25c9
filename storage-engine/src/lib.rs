pub mod moka_cache;

use chrono::{DateTime, Utc};
use std::time::Duration;

pub use moka_cache::TtlCache;

/// A cached value and the instant it stops being fresh.
///
/// Entries are retained past `expires_at` so a failed refresh can still serve
/// the last good value.
#[derive(Clone, Debug, PartialEq)]
pub struct CacheEntry<T> {
    pub data: T,
    pub expires_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn new(data: T, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            data,
            expires_at: expiry_after(now, ttl),
        }
    }

    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Outcome of a cache read.
#[derive(Clone, Debug, PartialEq)]
pub enum Lookup<T> {
    Fresh(T),
    /// Past expiry but still held.
    Stale(T),
    Miss,
}

impl<T> Lookup<T> {
    pub fn into_fresh(self) -> Option<T> {
        match self {
            Lookup::Fresh(v) => Some(v),
            _ => None,
        }
    }

    /// Any value, regardless of staleness.
    pub fn into_any(self) -> Option<T> {
        match self {
            Lookup::Fresh(v) | Lookup::Stale(v) => Some(v),
            Lookup::Miss => None,
        }
    }
}

pub fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
