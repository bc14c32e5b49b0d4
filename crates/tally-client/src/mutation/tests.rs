use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use super::*;
use crate::cache::{EntryState, PendingState, QueryKey};
use crate::error::{ErrorKind, ServiceError, ServiceResult};
use crate::notify::{ChannelNotifier, Notification, NotificationKind};
use crate::projection::project_cache;
use crate::types::{CreateExpenseInput, CurrentUser, Expense, ExpenseList, TotalSpent};

fn rent() -> Expense {
    Expense {
        id: 1,
        title: "Rent".to_string(),
        amount: "1200".to_string(),
        date: "2024-01-01".to_string(),
        expense_group: Some("bil".to_string()),
    }
}

fn food_input() -> CreateExpenseInput {
    CreateExpenseInput::new("Food", "50", "2024-01-02").with_group("matvarer")
}

fn food(id: i64) -> Expense {
    Expense {
        id,
        title: "Food".to_string(),
        amount: "50".to_string(),
        date: "2024-01-02".to_string(),
        expense_group: Some("matvarer".to_string()),
    }
}

fn network_error() -> ServiceError {
    ServiceError::Network {
        message: "connection reset".to_string(),
    }
}

/// One scripted answer, optionally held until a gate opens.
struct Step<T> {
    gate: Option<oneshot::Receiver<()>>,
    result: ServiceResult<T>,
}

/// In-memory service answering from per-operation queues.
#[derive(Default)]
struct ScriptedService {
    lists: Mutex<VecDeque<ServiceResult<ExpenseList>>>,
    creates: Mutex<VecDeque<Step<Expense>>>,
    deletes: Mutex<VecDeque<Step<()>>>,
    list_calls: AtomicUsize,
    create_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

impl ScriptedService {
    fn list(self, result: ServiceResult<ExpenseList>) -> Self {
        lock(&self.lists).push_back(result);
        self
    }

    fn create(self, result: ServiceResult<Expense>) -> Self {
        lock(&self.creates).push_back(Step { gate: None, result });
        self
    }

    fn create_gated(self, result: ServiceResult<Expense>) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        lock(&self.creates).push_back(Step {
            gate: Some(rx),
            result,
        });
        (self, tx)
    }

    fn delete(self, result: ServiceResult<()>) -> Self {
        lock(&self.deletes).push_back(Step { gate: None, result });
        self
    }

    fn delete_gated(self, result: ServiceResult<()>) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        lock(&self.deletes).push_back(Step {
            gate: Some(rx),
            result,
        });
        (self, tx)
    }
}

async fn play<T>(step: Option<Step<T>>, what: &str) -> ServiceResult<T> {
    let step = step.unwrap_or_else(|| panic!("unexpected {} call", what));
    if let Some(gate) = step.gate {
        // A dropped sender also releases the call.
        let _ = gate.await;
    }
    step.result
}

#[async_trait]
impl ExpenseService for ScriptedService {
    async fn list_expenses(&self) -> ServiceResult<ExpenseList> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.lists)
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected list call"))
    }

    async fn total_spent(&self) -> ServiceResult<TotalSpent> {
        unreachable!("controller never reads the total")
    }

    async fn create_expense(&self, _input: &CreateExpenseInput) -> ServiceResult<Expense> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let step = lock(&self.creates).pop_front();
        play(step, "create").await
    }

    async fn delete_expense(&self, _id: i64) -> ServiceResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        let step = lock(&self.deletes).pop_front();
        play(step, "delete").await
    }

    async fn current_user(&self) -> ServiceResult<Option<CurrentUser>> {
        unreachable!("controller never reads the session")
    }
}

struct Harness {
    controller: Arc<MutationController>,
    service: Arc<ScriptedService>,
    cache: Arc<QueryCache>,
    notifications: mpsc::UnboundedReceiver<Notification>,
}

impl Harness {
    fn new(service: ScriptedService) -> Self {
        Self::with_config(service, MutationConfig::immediate())
    }

    fn with_config(service: ScriptedService, config: MutationConfig) -> Self {
        let service = Arc::new(service);
        let cache = Arc::new(QueryCache::default());
        let (notifier, notifications) = ChannelNotifier::new();
        let controller = Arc::new(MutationController::new(
            service.clone(),
            cache.clone(),
            Arc::new(notifier),
            config,
        ));

        Self {
            controller,
            service,
            cache,
            notifications,
        }
    }

    fn with_baseline(self, expenses: Vec<Expense>) -> Self {
        self.cache.set_expenses(ExpenseList::new(expenses));
        self
    }

    fn list_ids(&self) -> Vec<i64> {
        self.cache
            .expenses()
            .into_value()
            .expect("list cached")
            .expenses
            .iter()
            .map(|e| e.id)
            .collect()
    }

    fn drain(&mut self) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Ok(n) = self.notifications.try_recv() {
            out.push(n);
        }
        out
    }

    async fn wait_for_phase(&self, phase: CreatePhase) {
        while self.controller.create_phase() != phase {
            tokio::task::yield_now().await;
        }
    }
}

// ---- create ----

#[tokio::test]
async fn test_create_success_prepends_to_baseline() {
    let mut h = Harness::new(ScriptedService::default().create(Ok(food(2)))).with_baseline(vec![rent()]);

    let created = h.controller.create_expense(food_input()).await.unwrap();

    assert_eq!(created.id, 2);
    assert_eq!(h.list_ids(), vec![2, 1]);
    assert!(h.cache.pending().is_empty());
    assert_eq!(h.controller.create_phase(), CreatePhase::Idle);
    assert_eq!(h.drain(), vec![Notification::create_succeeded(2)]);

    let view = project_cache(&h.cache);
    assert_eq!(view.groups.len(), 2);
    assert_eq!(view.group("bil").unwrap().expenses, vec![rent()]);
    assert_eq!(view.group("matvarer").unwrap().expenses, vec![food(2)]);
    assert!(view.placeholder.is_none());
}

#[tokio::test]
async fn test_create_network_failure_leaves_list_untouched() {
    let mut h = Harness::new(ScriptedService::default().create(Err(network_error())))
        .with_baseline(vec![rent()]);

    let err = h.controller.create_expense(food_input()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Service);
    assert_eq!(h.list_ids(), vec![1]);
    assert!(h.cache.pending().is_empty());

    let notes = h.drain();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].kind, NotificationKind::CreateFailed);
    assert_eq!(notes[0].expense_id, None);
}

#[tokio::test]
async fn test_create_malformed_response_is_a_failure() {
    let malformed = ServiceError::InvalidResponse {
        message: "failed to parse created expense: missing field `id`".to_string(),
    };
    let mut h =
        Harness::new(ScriptedService::default().create(Err(malformed))).with_baseline(vec![rent()]);

    let err = h.controller.create_expense(food_input()).await.unwrap_err();

    assert!(matches!(
        err,
        MutationError::Service(ServiceError::InvalidResponse { .. })
    ));
    assert_eq!(h.list_ids(), vec![1]);
    assert!(h.cache.pending().is_empty());
    assert_eq!(h.drain(), vec![Notification::create_failed()]);
}

#[tokio::test]
async fn test_placeholder_visible_only_while_settling() {
    let (service, release) = ScriptedService::default().create_gated(Ok(food(2)));
    let h = Harness::new(service).with_baseline(vec![rent()]);
    let mut changes = h.cache.subscribe();

    let task = {
        let controller = h.controller.clone();
        tokio::spawn(async move { controller.create_expense(food_input()).await })
    };
    h.wait_for_phase(CreatePhase::Settling).await;

    assert_eq!(h.cache.pending(), PendingState::Pending(food_input()));
    let view = project_cache(&h.cache);
    assert_eq!(view.placeholder.as_ref().unwrap().title, "Food");
    assert_eq!(view.confirmed_count(), 1, "placeholder is not a confirmed row");
    assert!(h.controller.is_creating());

    release.send(()).unwrap();
    task.await.unwrap().unwrap();

    assert!(h.cache.pending().is_empty());
    assert!(!h.controller.is_creating());

    // placeholder shown, list committed, placeholder cleared
    let mut seen = Vec::new();
    while let Ok(key) = changes.try_recv() {
        seen.push(key);
    }
    assert_eq!(
        seen,
        vec![
            QueryKey::PendingCreate,
            QueryKey::AllExpenses,
            QueryKey::PendingCreate
        ]
    );
}

#[tokio::test]
async fn test_commit_ignores_refetch_during_pending_window() {
    let (service, release) = ScriptedService::default().create_gated(Ok(food(2)));
    let h = Harness::new(service).with_baseline(vec![rent()]);

    let task = {
        let controller = h.controller.clone();
        tokio::spawn(async move { controller.create_expense(food_input()).await })
    };
    h.wait_for_phase(CreatePhase::Settling).await;

    // An unrelated refetch lands while the create is pending.
    let mut other = rent();
    other.id = 99;
    h.cache.set_expenses(ExpenseList::new(vec![rent(), other]));

    release.send(()).unwrap();
    task.await.unwrap().unwrap();

    assert_eq!(h.list_ids(), vec![2, 1], "exactly [new, ...baseline]");
}

#[tokio::test]
async fn test_second_create_is_refused_while_one_is_in_flight() {
    let (service, release) = ScriptedService::default().create_gated(Ok(food(2)));
    let mut h = Harness::new(service).with_baseline(vec![rent()]);

    let task = {
        let controller = h.controller.clone();
        tokio::spawn(async move { controller.create_expense(food_input()).await })
    };
    h.wait_for_phase(CreatePhase::Settling).await;

    let second = h.controller.create_expense(food_input()).await;
    assert!(matches!(second, Err(MutationError::CreateInFlight)));
    assert_eq!(
        h.cache.pending(),
        PendingState::Pending(food_input()),
        "refusal does not touch the first placeholder"
    );

    release.send(()).unwrap();
    task.await.unwrap().unwrap();
    assert_eq!(h.service.create_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.drain().len(), 1);
}

#[tokio::test]
async fn test_create_fetches_baseline_when_absent() {
    let mut h = Harness::new(
        ScriptedService::default()
            .list(Ok(ExpenseList::new(vec![rent()])))
            .create(Ok(food(2))),
    );

    h.controller.create_expense(food_input()).await.unwrap();

    assert_eq!(h.service.list_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.list_ids(), vec![2, 1]);
    assert_eq!(h.drain(), vec![Notification::create_succeeded(2)]);
}

#[tokio::test(start_paused = true)]
async fn test_create_uses_stale_baseline_without_refetch() {
    let h = Harness::new(ScriptedService::default().create(Ok(food(2)))).with_baseline(vec![rent()]);
    tokio::time::advance(Duration::from_secs(3600)).await;
    assert!(h.cache.is_stale(QueryKey::AllExpenses));

    h.controller.create_expense(food_input()).await.unwrap();

    assert_eq!(h.service.list_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.list_ids(), vec![2, 1]);
}

#[tokio::test]
async fn test_baseline_failure_fails_the_create() {
    let mut h = Harness::new(ScriptedService::default().list(Err(network_error())));
    let mut changes = h.cache.subscribe();

    let err = h.controller.create_expense(food_input()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Service);
    assert_eq!(h.service.create_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.cache.expenses(), EntryState::Absent);
    assert!(changes.try_recv().is_err(), "placeholder never written");
    assert_eq!(h.drain(), vec![Notification::create_failed()]);
    assert_eq!(h.controller.create_phase(), CreatePhase::Idle);
}

#[tokio::test]
async fn test_invalid_input_is_refused_before_anything_happens() {
    let mut h = Harness::new(ScriptedService::default());

    let err = h
        .controller
        .create_expense(CreateExpenseInput::new("Food", "fifty", "2024-01-02"))
        .await
        .unwrap_err();

    assert!(matches!(err, MutationError::Validation(ref v) if v.field == "amount"));
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(h.service.list_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.service.create_calls.load(Ordering::SeqCst), 0);
    assert!(h.drain().is_empty());
    assert!(h.cache.pending().is_empty());
}

#[tokio::test]
async fn test_dropped_create_clears_placeholder() {
    let (service, _release) = ScriptedService::default().create_gated(Ok(food(2)));
    let h = Harness::new(service).with_baseline(vec![rent()]);

    let task = {
        let controller = h.controller.clone();
        tokio::spawn(async move { controller.create_expense(food_input()).await })
    };
    h.wait_for_phase(CreatePhase::Settling).await;
    assert!(!h.cache.pending().is_empty());

    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());

    assert!(h.cache.pending().is_empty());
    assert_eq!(h.controller.create_phase(), CreatePhase::Idle);
    assert_eq!(h.list_ids(), vec![1]);
}

#[tokio::test(start_paused = true)]
async fn test_create_waits_for_configured_delay() {
    let config = MutationConfig::immediate().with_create_delay(Duration::from_secs(5));
    let h = Harness::with_config(ScriptedService::default().create(Ok(food(2))), config)
        .with_baseline(vec![rent()]);

    let task = {
        let controller = h.controller.clone();
        tokio::spawn(async move { controller.create_expense(food_input()).await })
    };
    h.wait_for_phase(CreatePhase::Settling).await;

    tokio::time::advance(Duration::from_secs(4)).await;
    assert_eq!(h.service.create_calls.load(Ordering::SeqCst), 0);
    assert!(!h.cache.pending().is_empty());

    tokio::time::advance(Duration::from_secs(1)).await;
    task.await.unwrap().unwrap();
    assert_eq!(h.service.create_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.list_ids(), vec![2, 1]);
}

// ---- delete ----

#[tokio::test]
async fn test_delete_success_removes_row() {
    let mut h = Harness::new(ScriptedService::default().delete(Ok(()))).with_baseline(vec![rent()]);

    h.controller.delete_expense(1).await.unwrap();

    assert!(h.list_ids().is_empty());
    assert_eq!(h.drain(), vec![Notification::delete_succeeded(1)]);
    assert!(!h.controller.is_deleting(1));
}

#[tokio::test]
async fn test_delete_failure_keeps_row() {
    let mut h =
        Harness::new(ScriptedService::default().delete(Err(ServiceError::Server {
            status: 500,
            message: "Internal Server Error".to_string(),
        })))
        .with_baseline(vec![rent()]);

    let err = h.controller.delete_expense(1).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Service);
    assert_eq!(h.list_ids(), vec![1]);
    let notes = h.drain();
    assert_eq!(notes, vec![Notification::delete_failed(1)]);
    assert_eq!(notes[0].expense_id, Some(1));
}

#[tokio::test]
async fn test_delete_keeps_row_until_confirmed() {
    let (service, release) = ScriptedService::default().delete_gated(Ok(()));
    let h = Harness::new(service.delete(Ok(()))).with_baseline(vec![rent(), food(2)]);

    let task = {
        let controller = h.controller.clone();
        tokio::spawn(async move { controller.delete_expense(1).await })
    };
    while !h.controller.is_deleting(1) || h.service.delete_calls.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }

    assert_eq!(h.list_ids(), vec![1, 2], "no optimistic removal");

    // Same row is blocked, other rows are not.
    assert!(matches!(
        h.controller.delete_expense(1).await,
        Err(MutationError::DeleteInFlight { id: 1 })
    ));
    h.controller.delete_expense(2).await.unwrap();
    assert_eq!(h.list_ids(), vec![1]);

    release.send(()).unwrap();
    task.await.unwrap().unwrap();
    assert!(h.list_ids().is_empty());
    assert!(!h.controller.is_deleting(1));
}

#[tokio::test]
async fn test_delete_without_cached_list() {
    let mut h = Harness::new(ScriptedService::default().delete(Ok(())));

    h.controller.delete_expense(7).await.unwrap();

    assert_eq!(h.cache.expenses(), EntryState::Absent);
    assert_eq!(h.drain(), vec![Notification::delete_succeeded(7)]);
}

#[test]
fn test_config_defaults() {
    let config = MutationConfig::default();
    assert_eq!(config.create_delay, Duration::from_secs(5));
    assert_eq!(config.delete_delay, Duration::from_secs(3));
    assert_eq!(MutationConfig::immediate().create_delay, Duration::ZERO);
}
