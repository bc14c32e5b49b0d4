//! Cache key set.

use std::fmt;

/// Keys of the query cache. Each key holds at most one live entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// `{expenses: [...]}` from GET /expenses.
    AllExpenses,
    /// The optimistic create placeholder.
    PendingCreate,
    /// `{total}` from GET /expenses/total-spent.
    TotalSpent,
    /// The signed-in user, if any.
    CurrentUser,
}

impl QueryKey {
    pub const ALL: [QueryKey; 4] = [
        QueryKey::AllExpenses,
        QueryKey::PendingCreate,
        QueryKey::TotalSpent,
        QueryKey::CurrentUser,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AllExpenses => "all-expenses",
            Self::PendingCreate => "pending-create",
            Self::TotalSpent => "total-spent",
            Self::CurrentUser => "current-user",
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
