//! The `current_user()` provider.
//!
//! Backed by the never-stale `current-user` cache key. A missing session and a
//! failed lookup both read as "no user"; neither is fatal.

use std::sync::Arc;

use tracing::warn;

use crate::cache::QueryCache;
use crate::client::ExpenseService;
use crate::types::CurrentUser;

#[derive(Clone)]
pub struct SessionProvider {
    service: Arc<dyn ExpenseService>,
    cache: Arc<QueryCache>,
}

impl SessionProvider {
    pub fn new(service: Arc<dyn ExpenseService>, cache: Arc<QueryCache>) -> Self {
        Self { service, cache }
    }

    /// Signed-in user, fetched once and then served from the cache.
    pub async fn current_user(&self) -> Option<CurrentUser> {
        self.lookup(false).await
    }

    /// Drop the cached answer and ask the server again (after login/logout).
    pub async fn refresh(&self) -> Option<CurrentUser> {
        self.lookup(true).await
    }

    async fn lookup(&self, force: bool) -> Option<CurrentUser> {
        match self.cache.query_user(self.service.as_ref(), force).await {
            Ok(user) => user,
            Err(e) => {
                // Not cached, so the next call asks again.
                warn!(error = %e, "session lookup failed, treating as signed out");
                None
            }
        }
    }
}
