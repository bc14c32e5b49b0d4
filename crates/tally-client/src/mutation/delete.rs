//! Delete protocol: request → remove on success.

use tracing::{debug, info, warn};

use crate::error::{MutationError, MutationResult};
use crate::notify::Notification;

use super::{lock, MutationController};

/// Marks one row as deleting until dropped.
pub(super) struct DeleteFlight<'a> {
    controller: &'a MutationController,
    id: i64,
}

impl<'a> DeleteFlight<'a> {
    pub(super) fn new(controller: &'a MutationController, id: i64) -> Self {
        Self { controller, id }
    }
}

impl Drop for DeleteFlight<'_> {
    fn drop(&mut self) {
        lock(&self.controller.deleting).remove(&self.id);
    }
}

impl MutationController {
    /// Delete an expense, removing it from the cached list only after the
    /// server confirms.
    pub async fn delete_expense(&self, id: i64) -> MutationResult<()> {
        let _row = self.begin_delete(id)?;
        debug!(id, "deleting expense");

        if !self.config.delete_delay.is_zero() {
            tokio::time::sleep(self.config.delete_delay).await;
        }

        match self.service.delete_expense(id).await {
            Ok(()) => {
                if !self.cache.update_expenses(|list| list.without(id)) {
                    debug!(id, "no cached list to remove the expense from");
                }
                info!(id, "expense deleted");
                self.notifier.notify(Notification::delete_succeeded(id));
                Ok(())
            }
            Err(e) => {
                warn!(id, error = %e, "expense delete failed");
                self.notifier.notify(Notification::delete_failed(id));
                Err(MutationError::Service(e))
            }
        }
    }
}
