//! Create protocol: baseline → placeholder → request → commit or fail.

use tracing::{debug, info, warn};

use crate::cache::PendingState;
use crate::error::{MutationError, MutationResult};
use crate::notify::Notification;
use crate::types::{CreateExpenseInput, Expense, ExpenseList};

use super::{CreatePhase, MutationController};

/// Holds the create slot. Dropping it clears the placeholder (if written) and
/// returns the controller to `Idle`, on every exit path including a dropped
/// future.
pub(super) struct CreateFlight<'a> {
    controller: &'a MutationController,
    placeholder_written: bool,
}

impl<'a> CreateFlight<'a> {
    pub(super) fn new(controller: &'a MutationController) -> Self {
        Self {
            controller,
            placeholder_written: false,
        }
    }

    fn show_placeholder(&mut self, input: &CreateExpenseInput) {
        self.controller
            .cache
            .set_pending(PendingState::Pending(input.clone()));
        self.placeholder_written = true;
    }

    /// Replace the list and drop the placeholder as one cache write.
    fn commit(&mut self, list: ExpenseList) {
        self.controller.cache.commit_create(list);
        self.placeholder_written = false;
    }

    fn clear_placeholder(&mut self) {
        if self.placeholder_written {
            self.controller.cache.set_pending(PendingState::Empty);
            self.placeholder_written = false;
        }
    }

    fn phase(&self, next: CreatePhase) {
        self.controller.set_create_phase(next);
    }
}

impl Drop for CreateFlight<'_> {
    fn drop(&mut self) {
        if self.placeholder_written {
            debug!("create abandoned before settling, clearing placeholder");
        }
        self.clear_placeholder();
        self.phase(CreatePhase::Idle);
    }
}

impl MutationController {
    /// Create an expense optimistically.
    ///
    /// Invalid input and a concurrent create are refused before any cache
    /// write or request. On success the list becomes `[created, ...baseline]`,
    /// where the baseline is the list as it was before the placeholder
    /// appeared. On failure the list is left as it is. Either way the
    /// placeholder is gone when this returns.
    pub async fn create_expense(&self, input: CreateExpenseInput) -> MutationResult<Expense> {
        input.validate()?;
        let mut flight = self.begin_create()?;

        let baseline = match self.cache.ensure_expenses(self.service.as_ref()).await {
            Ok(list) => list,
            Err(e) => {
                flight.phase(CreatePhase::Failed);
                warn!(error = %e, "could not load expenses before create");
                self.notifier.notify(Notification::create_failed());
                return Err(MutationError::Service(e));
            }
        };

        // The baseline is frozen above; nothing below re-reads the list.
        flight.phase(CreatePhase::Optimistic);
        flight.show_placeholder(&input);

        flight.phase(CreatePhase::Settling);
        if !self.config.create_delay.is_zero() {
            tokio::time::sleep(self.config.create_delay).await;
        }

        match self.service.create_expense(&input).await {
            Ok(expense) => {
                flight.commit(baseline.prepended(expense.clone()));
                flight.phase(CreatePhase::Committed);
                info!(id = expense.id, title = %expense.title, "expense created");
                self.notifier
                    .notify(Notification::create_succeeded(expense.id));
                Ok(expense)
            }
            Err(e) => {
                flight.clear_placeholder();
                flight.phase(CreatePhase::Failed);
                warn!(error = %e, title = %input.title, "expense create failed");
                self.notifier.notify(Notification::create_failed());
                Err(MutationError::Service(e))
            }
        }
    }
}
