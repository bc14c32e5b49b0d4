//! Client data layer for the Tally expense tracker.
//!
//! This crate keeps cached, derived and optimistic expense state consistent
//! while asynchronous, possibly-failing requests are in flight:
//!
//! - HTTP client for the expense API ([`ExpenseClient`], behind the
//!   [`ExpenseService`] trait)
//! - Process-wide query cache with per-key staleness ([`QueryCache`])
//! - Optimistic create / confirmed delete ([`MutationController`])
//! - Grouped list view derived from the cache ([`project`])
//! - Session lookup that treats any failure as "signed out" ([`SessionProvider`])
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tally_client::{
//!     project_cache, CacheConfig, CreateExpenseInput, ExpenseClient, LogNotifier,
//!     MutationConfig, MutationController, QueryCache,
//! };
//!
//! # async fn example() -> anyhow::Result<()> {
//! let service = Arc::new(ExpenseClient::from_env()?);
//! let cache = Arc::new(QueryCache::new(CacheConfig::from_env()));
//! let controller = MutationController::new(
//!     service.clone(),
//!     cache.clone(),
//!     Arc::new(LogNotifier),
//!     MutationConfig::from_env(),
//! );
//!
//! cache.query_expenses(service.as_ref()).await?;
//! controller
//!     .create_expense(CreateExpenseInput::new("Food", "50", "2024-01-02").with_group("matvarer"))
//!     .await?;
//!
//! for group in project_cache(&cache).groups {
//!     println!("{}: {} expenses", group.label, group.expenses.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `TALLY_API_URL` | API base URL (default: `http://localhost:3000/api`) |
//! | `TALLY_SESSION_TOKEN` | Session token sent as a bearer credential |
//! | `TALLY_TIMEOUT` | Request timeout in seconds (default: 30) |
//! | `TALLY_EXPENSES_TTL_SECS` | Freshness of the cached list (default: 300) |
//! | `TALLY_CREATE_DELAY_MS` | Pause before the create request (default: 5000) |
//! | `TALLY_DELETE_DELAY_MS` | Pause before the delete request (default: 3000) |

pub mod auth;
pub mod cache;
pub mod client;
pub mod error;
pub mod mutation;
pub mod notify;
pub mod projection;
pub mod session;
pub mod types;
pub mod validate;

// Re-export main types
pub use auth::SessionCredential;
pub use cache::{CacheConfig, EntryState, PendingState, QueryCache, QueryKey, Staleness};
pub use client::{ExpenseClient, ExpenseService, CLIENT_USER_AGENT};
pub use error::{
    ErrorKind, MutationError, MutationResult, ServiceError, ServiceResult, ValidationError,
};
pub use mutation::{CreatePhase, MutationConfig, MutationController};
pub use notify::{ChannelNotifier, LogNotifier, Notification, NotificationKind, Notifier};
pub use projection::{
    group_expenses, project, project_cache, ExpenseGroup, ExpenseView, PlaceholderRow,
    UNSPECIFIED_GROUP,
};
pub use session::SessionProvider;
pub use types::{
    ClientConfig, CreateExpenseInput, CurrentUser, Expense, ExpenseList, TotalSpent, UserProfile,
};
