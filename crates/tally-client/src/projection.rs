//! Grouped view of the cached expense list.
//!
//! Pure: no I/O, no cache writes. The same inputs always give the same view.

use crate::cache::{EntryState, PendingState, QueryCache};
use crate::types::{Expense, ExpenseList};

/// Label for expenses without a group.
pub const UNSPECIFIED_GROUP: &str = "Unspecified";

/// Characters of the date shown on the placeholder row (`YYYY-MM-DD`).
const PLACEHOLDER_DATE_CHARS: usize = 10;

/// The not-yet-persisted expense, shown as a loading row above all groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderRow {
    pub title: String,
    pub amount: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseGroup {
    /// Display label: the group name or [`UNSPECIFIED_GROUP`].
    pub label: String,
    /// True for the sentinel group of ungrouped expenses.
    pub unspecified: bool,
    pub expenses: Vec<Expense>,
}

/// Everything a list view renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseView {
    pub placeholder: Option<PlaceholderRow>,
    pub groups: Vec<ExpenseGroup>,
    /// The list has not arrived yet; render skeleton rows.
    pub loading: bool,
}

impl ExpenseView {
    /// Confirmed rows across all groups.
    pub fn confirmed_count(&self) -> usize {
        self.groups.iter().map(|g| g.expenses.len()).sum()
    }

    pub fn group(&self, label: &str) -> Option<&ExpenseGroup> {
        self.groups.iter().find(|g| g.label == label)
    }
}

/// Build the view from the list entry and the placeholder.
pub fn project(expenses: &EntryState<ExpenseList>, pending: &PendingState) -> ExpenseView {
    let placeholder = pending.input().map(|input| PlaceholderRow {
        title: input.title.clone(),
        amount: input.amount.clone(),
        date: input.date.chars().take(PLACEHOLDER_DATE_CHARS).collect(),
    });

    match expenses {
        EntryState::Ready(list) => ExpenseView {
            placeholder,
            groups: group_expenses(&list.expenses),
            loading: false,
        },
        EntryState::Absent | EntryState::Pending => ExpenseView {
            placeholder,
            groups: Vec::new(),
            loading: true,
        },
    }
}

/// Read both keys under one lock and project.
pub fn project_cache(cache: &QueryCache) -> ExpenseView {
    let (expenses, pending) = cache.expenses_and_pending();
    project(&expenses, &pending)
}

/// Partition by group in order of first appearance, keeping list order inside
/// each group. Empty and absent groups share the unspecified bucket.
pub fn group_expenses(expenses: &[Expense]) -> Vec<ExpenseGroup> {
    let mut groups: Vec<(Option<&str>, ExpenseGroup)> = Vec::new();

    for expense in expenses {
        let key = expense.expense_group.as_deref().filter(|g| !g.is_empty());

        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, group)) => group.expenses.push(expense.clone()),
            None => groups.push((
                key,
                ExpenseGroup {
                    label: key.unwrap_or(UNSPECIFIED_GROUP).to_string(),
                    unspecified: key.is_none(),
                    expenses: vec![expense.clone()],
                },
            )),
        }
    }

    groups.into_iter().map(|(_, group)| group).collect()
}
