//! Remote expense service client.
//!
//! Public API: no status code knowledge. All HTTP/status mapping in http.rs.
//! The client never touches the query cache.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;

use crate::auth::SessionCredential;
use crate::error::{ServiceError, ServiceResult};
use crate::types::{ClientConfig, CreateExpenseInput, CurrentUser, Expense, ExpenseList, TotalSpent};

mod helpers;
mod http;

use helpers::{expense_url, normalize_base_url};
use http::{HttpBackend, UserOutcome};

pub const CLIENT_USER_AGENT: &str = concat!("tally-client/", env!("CARGO_PKG_VERSION"));

/// The backend operations the cache and the mutation controller consume.
///
/// Each call is a single request/response round trip with no retries and no
/// side effects beyond the network call.
#[async_trait]
pub trait ExpenseService: Send + Sync {
    /// GET /expenses.
    async fn list_expenses(&self) -> ServiceResult<ExpenseList>;

    /// GET /expenses/total-spent.
    async fn total_spent(&self) -> ServiceResult<TotalSpent>;

    /// POST /expenses.
    async fn create_expense(&self, input: &CreateExpenseInput) -> ServiceResult<Expense>;

    /// DELETE /expenses/{id}.
    async fn delete_expense(&self, id: i64) -> ServiceResult<()>;

    /// GET /me. `None` when there is no session.
    async fn current_user(&self) -> ServiceResult<Option<CurrentUser>>;
}

/// HTTP implementation of [`ExpenseService`].
#[derive(Debug, Clone)]
pub struct ExpenseClient {
    http: HttpBackend,
}

impl ExpenseClient {
    pub fn new(config: ClientConfig) -> ServiceResult<Self> {
        let credential = config
            .token
            .as_ref()
            .map(SessionCredential::bearer)
            .unwrap_or_else(SessionCredential::from_env);

        Self::with_credential(config, credential)
    }

    pub fn with_credential(
        config: ClientConfig,
        credential: SessionCredential,
    ) -> ServiceResult<Self> {
        let base_url = normalize_base_url(&config.url)?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| ServiceError::Network {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http: HttpBackend {
                client,
                base_url,
                credential,
            },
        })
    }

    pub fn from_env() -> ServiceResult<Self> {
        Self::new(ClientConfig::from_env())
    }

    pub fn base_url(&self) -> &str {
        &self.http.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.http.credential.is_authenticated()
    }

    fn expenses_url(&self) -> String {
        format!("{}/expenses", self.http.base_url)
    }
}

#[async_trait]
impl ExpenseService for ExpenseClient {
    async fn list_expenses(&self) -> ServiceResult<ExpenseList> {
        let url = self.expenses_url();
        debug!(url = %url, "listing expenses");

        self.http.get_json(&url, "expense list").await
    }

    async fn total_spent(&self) -> ServiceResult<TotalSpent> {
        let url = format!("{}/total-spent", self.expenses_url());
        debug!(url = %url, "fetching total spent");

        self.http.get_json(&url, "total spent").await
    }

    async fn create_expense(&self, input: &CreateExpenseInput) -> ServiceResult<Expense> {
        let url = self.expenses_url();
        debug!(url = %url, title = %input.title, "creating expense");

        self.http.post_json(&url, input, "created expense").await
    }

    async fn delete_expense(&self, id: i64) -> ServiceResult<()> {
        let url = expense_url(&self.http.base_url, id);
        debug!(url = %url, id, "deleting expense");

        self.http.delete(&url).await
    }

    async fn current_user(&self) -> ServiceResult<Option<CurrentUser>> {
        let url = format!("{}/me", self.http.base_url);
        debug!(url = %url, "fetching current user");

        match self.http.fetch_user_optional(&url).await? {
            UserOutcome::Anonymous => Ok(None),
            UserOutcome::SignedIn(user) => Ok(Some(user)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_rejects_invalid_url() {
        let config = ClientConfig::default().with_url("localhost without scheme");
        assert!(matches!(
            ExpenseClient::new(config),
            Err(ServiceError::Config { .. })
        ));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = ClientConfig::default()
            .with_url("http://localhost:3000/api/")
            .with_token("t");
        let client = ExpenseClient::new(config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000/api");
        assert_eq!(client.expenses_url(), "http://localhost:3000/api/expenses");
        assert!(client.is_authenticated());
    }

    #[test]
    fn test_explicit_credential_wins() {
        let config = ClientConfig::default();
        let client =
            ExpenseClient::with_credential(config, SessionCredential::Anonymous).unwrap();
        assert!(!client.is_authenticated());
    }
}
