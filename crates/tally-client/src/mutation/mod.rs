//! Optimistic mutation controller.
//!
//! Create is optimistic-then-confirmed: a placeholder is shown while the
//! request settles and the list is rewritten from a baseline frozen before the
//! placeholder write. Delete is confirmed-then-applied: the row leaves the list
//! only after the server agrees.
//!
//! Every service failure is handled here (cache reconciled, notification
//! emitted) and then returned to the caller.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::cache::QueryCache;
use crate::client::ExpenseService;
use crate::error::{MutationError, MutationResult};
use crate::notify::Notifier;

mod create;
mod delete;

/// Default pause before the create request.
const DEFAULT_CREATE_DELAY_MS: u64 = 5_000;

/// Default pause before the delete request.
const DEFAULT_DELETE_DELAY_MS: u64 = 3_000;

/// Artificial delays that keep the pending states on screen long enough to
/// see. Zero delays change nothing but timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationConfig {
    pub create_delay: Duration,
    pub delete_delay: Duration,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            create_delay: Duration::from_millis(DEFAULT_CREATE_DELAY_MS),
            delete_delay: Duration::from_millis(DEFAULT_DELETE_DELAY_MS),
        }
    }
}

impl MutationConfig {
    /// No artificial delays.
    pub fn immediate() -> Self {
        Self {
            create_delay: Duration::ZERO,
            delete_delay: Duration::ZERO,
        }
    }

    /// | Variable | Default |
    /// |----------|---------|
    /// | `TALLY_CREATE_DELAY_MS` | 5000 |
    /// | `TALLY_DELETE_DELAY_MS` | 3000 |
    pub fn from_env() -> Self {
        let ms = |var: &str, default: u64| {
            std::env::var(var)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        };

        Self {
            create_delay: Duration::from_millis(ms("TALLY_CREATE_DELAY_MS", DEFAULT_CREATE_DELAY_MS)),
            delete_delay: Duration::from_millis(ms("TALLY_DELETE_DELAY_MS", DEFAULT_DELETE_DELAY_MS)),
        }
    }

    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = delay;
        self
    }

    pub fn with_delete_delay(mut self, delay: Duration) -> Self {
        self.delete_delay = delay;
        self
    }
}

/// Where the create protocol is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatePhase {
    Idle,
    /// Reading (or fetching) the baseline list.
    AwaitingBaseline,
    /// Placeholder written.
    Optimistic,
    /// Create request in flight.
    Settling,
    /// List rewritten with the server's expense.
    Committed,
    /// Request failed; list untouched.
    Failed,
}

/// Drives creates and deletes against the service and the cache.
pub struct MutationController {
    service: Arc<dyn ExpenseService>,
    cache: Arc<QueryCache>,
    notifier: Arc<dyn Notifier>,
    config: MutationConfig,
    create_phase: Mutex<CreatePhase>,
    deleting: Mutex<HashSet<i64>>,
}

impl MutationController {
    pub fn new(
        service: Arc<dyn ExpenseService>,
        cache: Arc<QueryCache>,
        notifier: Arc<dyn Notifier>,
        config: MutationConfig,
    ) -> Self {
        Self {
            service,
            cache,
            notifier,
            config,
            create_phase: Mutex::new(CreatePhase::Idle),
            deleting: Mutex::new(HashSet::new()),
        }
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn config(&self) -> &MutationConfig {
        &self.config
    }

    pub fn create_phase(&self) -> CreatePhase {
        *lock(&self.create_phase)
    }

    /// Whether the submit affordance should be disabled.
    pub fn is_creating(&self) -> bool {
        self.create_phase() != CreatePhase::Idle
    }

    /// Whether this row's delete affordance should be disabled.
    pub fn is_deleting(&self, id: i64) -> bool {
        lock(&self.deleting).contains(&id)
    }

    /// Claim the single create slot.
    fn begin_create(&self) -> MutationResult<create::CreateFlight<'_>> {
        let mut phase = lock(&self.create_phase);
        if *phase != CreatePhase::Idle {
            return Err(MutationError::CreateInFlight);
        }
        *phase = CreatePhase::AwaitingBaseline;
        drop(phase);

        Ok(create::CreateFlight::new(self))
    }

    fn set_create_phase(&self, next: CreatePhase) {
        let mut phase = lock(&self.create_phase);
        tracing::debug!(from = ?*phase, to = ?next, "create phase");
        *phase = next;
    }

    /// Claim the delete slot of one row; other rows stay available.
    fn begin_delete(&self, id: i64) -> MutationResult<delete::DeleteFlight<'_>> {
        if !lock(&self.deleting).insert(id) {
            return Err(MutationError::DeleteInFlight { id });
        }
        Ok(delete::DeleteFlight::new(self, id))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests;
