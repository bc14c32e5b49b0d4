//! Process-wide query cache.
//!
//! A key-addressed store shared by reference (`Arc<QueryCache>`) between the
//! views and the mutation controller. Writes are last-write-wins with no merge:
//! callers compute the full next value before writing. Every write publishes
//! the key on a broadcast channel so views can re-project.
//!
//! # Keys
//!
//! | Key | Value | Staleness |
//! |-----|-------|-----------|
//! | `all-expenses` | [`ExpenseList`] | TTL (default 5 min) |
//! | `pending-create` | [`PendingState`] | never, starts `Empty` |
//! | `total-spent` | [`TotalSpent`] | immediately |
//! | `current-user` | `Option<CurrentUser>` | never |
//!
//! The lock is never held across an `.await`.

use std::future::Future;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::client::ExpenseService;
use crate::error::ServiceResult;
use crate::types::{CreateExpenseInput, CurrentUser, ExpenseList, TotalSpent};

mod keys;
mod policy;
mod slot;

pub use keys::QueryKey;
pub use policy::{CacheConfig, Staleness};
pub use slot::EntryState;

use slot::Slot;

/// Buffered change events per subscriber before it starts lagging.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Value of the `pending-create` key.
///
/// Single slot: at most one optimistic create is shown at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PendingState {
    #[default]
    Empty,
    Pending(CreateExpenseInput),
}

impl PendingState {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn input(&self) -> Option<&CreateExpenseInput> {
        match self {
            Self::Pending(input) => Some(input),
            Self::Empty => None,
        }
    }
}

#[derive(Debug)]
struct Slots {
    expenses: Slot<ExpenseList>,
    pending: Slot<PendingState>,
    total: Slot<TotalSpent>,
    user: Slot<Option<CurrentUser>>,
}

type Select<T> = fn(&mut Slots) -> &mut Slot<T>;

fn expenses_slot(slots: &mut Slots) -> &mut Slot<ExpenseList> {
    &mut slots.expenses
}

fn total_slot(slots: &mut Slots) -> &mut Slot<TotalSpent> {
    &mut slots.total
}

fn user_slot(slots: &mut Slots) -> &mut Slot<Option<CurrentUser>> {
    &mut slots.user
}

/// How a read decides whether to hit the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadMode {
    /// Any present value, fresh or stale.
    Ensure,
    /// Fresh values only.
    Query,
    /// Always fetch.
    Refetch,
}

/// Key-addressed query cache.
#[derive(Debug)]
pub struct QueryCache {
    slots: Mutex<Slots>,
    changes: broadcast::Sender<QueryKey>,
    config: CacheConfig,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl QueryCache {
    pub fn new(config: CacheConfig) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let slots = Slots {
            expenses: Slot::empty(config.staleness(QueryKey::AllExpenses)),
            pending: Slot::with_value(
                config.staleness(QueryKey::PendingCreate),
                PendingState::Empty,
            ),
            total: Slot::empty(config.staleness(QueryKey::TotalSpent)),
            user: Slot::empty(config.staleness(QueryKey::CurrentUser)),
        };

        Self {
            slots: Mutex::new(slots),
            changes,
            config,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Receive the key of every write from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<QueryKey> {
        self.changes.subscribe()
    }

    // ---- all-expenses ----

    pub fn expenses(&self) -> EntryState<ExpenseList> {
        self.lock().expenses.state()
    }

    pub fn set_expenses(&self, list: ExpenseList) {
        debug!(key = %QueryKey::AllExpenses, count = list.len(), "cache write");
        self.lock().expenses.store(list, Instant::now());
        self.publish(QueryKey::AllExpenses);
    }

    /// Replace the list with `f(current)` in one critical section.
    ///
    /// Returns `false` (and writes nothing) when no list is cached.
    pub fn update_expenses(&self, f: impl FnOnce(&ExpenseList) -> ExpenseList) -> bool {
        {
            let mut slots = self.lock();
            let next = match slots.expenses.value() {
                Some(current) => f(current),
                None => return false,
            };
            debug!(key = %QueryKey::AllExpenses, count = next.len(), "cache update");
            slots.expenses.store(next, Instant::now());
        }
        self.publish(QueryKey::AllExpenses);
        true
    }

    /// Cached list if present (fresh or stale), otherwise fetch it.
    pub async fn ensure_expenses(&self, service: &dyn ExpenseService) -> ServiceResult<ExpenseList> {
        self.read(
            QueryKey::AllExpenses,
            expenses_slot,
            ReadMode::Ensure,
            || service.list_expenses(),
        )
        .await
    }

    /// Fresh cached list, or refetch when stale or absent.
    pub async fn query_expenses(&self, service: &dyn ExpenseService) -> ServiceResult<ExpenseList> {
        self.read(
            QueryKey::AllExpenses,
            expenses_slot,
            ReadMode::Query,
            || service.list_expenses(),
        )
        .await
    }

    /// Fetch the list regardless of freshness.
    pub async fn refetch_expenses(
        &self,
        service: &dyn ExpenseService,
    ) -> ServiceResult<ExpenseList> {
        self.read(
            QueryKey::AllExpenses,
            expenses_slot,
            ReadMode::Refetch,
            || service.list_expenses(),
        )
        .await
    }

    // ---- pending-create ----

    pub fn pending(&self) -> PendingState {
        self.lock()
            .pending
            .value()
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_pending(&self, state: PendingState) {
        debug!(key = %QueryKey::PendingCreate, empty = state.is_empty(), "cache write");
        self.lock().pending.store(state, Instant::now());
        self.publish(QueryKey::PendingCreate);
    }

    /// Store the committed list and clear the placeholder in one critical
    /// section, so no reader sees the new row next to its placeholder.
    pub fn commit_create(&self, list: ExpenseList) {
        debug!(key = %QueryKey::AllExpenses, count = list.len(), "cache commit");
        {
            let mut slots = self.lock();
            let now = Instant::now();
            slots.expenses.store(list, now);
            slots.pending.store(PendingState::Empty, now);
        }
        self.publish(QueryKey::AllExpenses);
        self.publish(QueryKey::PendingCreate);
    }

    /// The list entry and the placeholder, read under one lock.
    pub fn expenses_and_pending(&self) -> (EntryState<ExpenseList>, PendingState) {
        let slots = self.lock();
        let pending = slots.pending.value().cloned().unwrap_or_default();
        (slots.expenses.state(), pending)
    }

    // ---- total-spent ----

    pub fn total(&self) -> EntryState<TotalSpent> {
        self.lock().total.state()
    }

    pub fn set_total(&self, total: TotalSpent) {
        self.lock().total.store(total, Instant::now());
        self.publish(QueryKey::TotalSpent);
    }

    pub async fn query_total(&self, service: &dyn ExpenseService) -> ServiceResult<TotalSpent> {
        self.read(QueryKey::TotalSpent, total_slot, ReadMode::Query, || {
            service.total_spent()
        })
        .await
    }

    // ---- current-user ----

    pub fn user(&self) -> EntryState<Option<CurrentUser>> {
        self.lock().user.state()
    }

    pub fn set_user(&self, user: Option<CurrentUser>) {
        self.lock().user.store(user, Instant::now());
        self.publish(QueryKey::CurrentUser);
    }

    pub(crate) async fn query_user(
        &self,
        service: &dyn ExpenseService,
        force: bool,
    ) -> ServiceResult<Option<CurrentUser>> {
        let mode = if force {
            ReadMode::Refetch
        } else {
            ReadMode::Query
        };
        self.read(QueryKey::CurrentUser, user_slot, mode, || {
            service.current_user()
        })
        .await
    }

    // ---- any key ----

    /// Mark a key stale without dropping its value.
    pub fn invalidate(&self, key: QueryKey) {
        debug!(key = %key, "invalidate");
        let mut slots = self.lock();
        match key {
            QueryKey::AllExpenses => slots.expenses.invalidate(),
            QueryKey::PendingCreate => slots.pending.invalidate(),
            QueryKey::TotalSpent => slots.total.invalidate(),
            QueryKey::CurrentUser => slots.user.invalidate(),
        }
    }

    pub fn is_stale(&self, key: QueryKey) -> bool {
        let now = Instant::now();
        let slots = self.lock();
        match key {
            QueryKey::AllExpenses => slots.expenses.is_stale(now),
            QueryKey::PendingCreate => slots.pending.is_stale(now),
            QueryKey::TotalSpent => slots.total.is_stale(now),
            QueryKey::CurrentUser => slots.user.is_stale(now),
        }
    }

    async fn read<T, F, Fut>(
        &self,
        key: QueryKey,
        select: Select<T>,
        mode: ReadMode,
        fetch: F,
    ) -> ServiceResult<T>
    where
        T: Clone,
        F: FnOnce() -> Fut,
        Fut: Future<Output = ServiceResult<T>>,
    {
        {
            let mut slots = self.lock();
            let slot = select(&mut slots);
            let cached = match mode {
                ReadMode::Ensure => slot.value().cloned(),
                ReadMode::Query => slot.fresh_value(Instant::now()),
                ReadMode::Refetch => None,
            };
            if let Some(value) = cached {
                debug!(key = %key, "cache hit");
                return Ok(value);
            }
            slot.begin_fetch();
        }

        debug!(key = %key, ?mode, "cache miss, fetching");
        let guard = FetchGuard {
            cache: self,
            select,
        };
        let result = fetch().await;
        drop(guard);

        match result {
            Ok(value) => {
                select(&mut self.lock()).store(value.clone(), Instant::now());
                self.publish(key);
                Ok(value)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "fetch failed, keeping previous value");
                Err(e)
            }
        }
    }

    fn publish(&self, key: QueryKey) {
        // No subscribers is fine.
        let _ = self.changes.send(key);
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        // Slots hold plain data; a panic mid-write cannot leave them torn.
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Ends the in-flight mark even when the fetching future is dropped.
struct FetchGuard<'a, T: Clone> {
    cache: &'a QueryCache,
    select: Select<T>,
}

impl<T: Clone> Drop for FetchGuard<'_, T> {
    fn drop(&mut self) {
        (self.select)(&mut self.cache.lock()).end_fetch();
    }
}
