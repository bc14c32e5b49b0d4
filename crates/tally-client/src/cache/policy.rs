//! Staleness policy per key.

use std::time::Duration;

use tokio::time::Instant;

use super::keys::QueryKey;

/// Default TTL of the expense list (5 minutes).
const DEFAULT_EXPENSES_TTL_SECS: u64 = 5 * 60;

/// How long a stored value counts as fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staleness {
    /// Stale as soon as it is stored; every query refetches.
    Immediately,
    /// Fresh for a fixed duration after the last write.
    Ttl(Duration),
    /// Only an explicit write or invalidation changes it.
    Never,
}

impl Staleness {
    pub(crate) fn is_stale(&self, updated_at: Instant, now: Instant) -> bool {
        match self {
            Self::Immediately => true,
            Self::Ttl(ttl) => now.saturating_duration_since(updated_at) >= *ttl,
            Self::Never => false,
        }
    }
}

/// Cache policy configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL of `all-expenses`.
    pub expenses_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            expenses_ttl: Duration::from_secs(DEFAULT_EXPENSES_TTL_SECS),
        }
    }
}

impl CacheConfig {
    /// `TALLY_EXPENSES_TTL_SECS` overrides the list TTL.
    pub fn from_env() -> Self {
        let secs = std::env::var("TALLY_EXPENSES_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_EXPENSES_TTL_SECS);

        Self {
            expenses_ttl: Duration::from_secs(secs),
        }
    }

    pub fn with_expenses_ttl(mut self, ttl: Duration) -> Self {
        self.expenses_ttl = ttl;
        self
    }

    pub fn staleness(&self, key: QueryKey) -> Staleness {
        match key {
            QueryKey::AllExpenses => Staleness::Ttl(self.expenses_ttl),
            QueryKey::PendingCreate => Staleness::Never,
            QueryKey::TotalSpent => Staleness::Immediately,
            QueryKey::CurrentUser => Staleness::Never,
        }
    }
}
