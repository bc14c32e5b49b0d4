//! User-visible notifications emitted when a mutation settles.

use tokio::sync::mpsc;
use tracing::{info, warn};

/// The four occasions a notification is emitted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    CreateSucceeded,
    CreateFailed,
    DeleteSucceeded,
    DeleteFailed,
}

impl NotificationKind {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::CreateFailed | Self::DeleteFailed)
    }
}

/// A toast-style message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
    /// Expense the event is about; a failed create names none.
    pub expense_id: Option<i64>,
}

impl Notification {
    pub fn create_succeeded(id: i64) -> Self {
        Self {
            kind: NotificationKind::CreateSucceeded,
            title: "Expense created".to_string(),
            description: format!("Successfully created new expense: {}", id),
            expense_id: Some(id),
        }
    }

    pub fn create_failed() -> Self {
        Self {
            kind: NotificationKind::CreateFailed,
            title: "Error".to_string(),
            description: "Failed to create new expense".to_string(),
            expense_id: None,
        }
    }

    pub fn delete_succeeded(id: i64) -> Self {
        Self {
            kind: NotificationKind::DeleteSucceeded,
            title: "Expense deleted".to_string(),
            description: format!("Successfully deleted expense: {}", id),
            expense_id: Some(id),
        }
    }

    pub fn delete_failed(id: i64) -> Self {
        Self {
            kind: NotificationKind::DeleteFailed,
            title: "Error".to_string(),
            description: format!("Failed to delete expense: {}", id),
            expense_id: Some(id),
        }
    }
}

/// Sink for notifications. Must not block.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Forwards notifications to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            warn!("notification receiver dropped");
        }
    }
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, n: Notification) {
        if n.kind.is_failure() {
            warn!(title = %n.title, id = ?n.expense_id, "{}", n.description);
        } else {
            info!(title = %n.title, id = ?n.expense_id, "{}", n.description);
        }
    }
}
