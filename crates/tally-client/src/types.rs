//! Wire types for the expense API and client configuration.

use serde::{Deserialize, Deserializer, Serialize};

/// A persisted expense, as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    /// Server-assigned id.
    pub id: i64,

    pub title: String,

    /// Decimal string (e.g. "12.50").
    pub amount: String,

    /// ISO-8601 timestamp or calendar date.
    pub date: String,

    /// Category label; absent and empty both mean "no group".
    #[serde(
        rename = "expenseGroup",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub expense_group: Option<String>,
}

/// Response from GET /expenses, and the value cached under `all-expenses`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseList {
    pub expenses: Vec<Expense>,
}

impl ExpenseList {
    pub fn new(expenses: Vec<Expense>) -> Self {
        Self { expenses }
    }

    /// New list with `expense` in front of the current entries.
    pub fn prepended(&self, expense: Expense) -> Self {
        let mut expenses = Vec::with_capacity(self.expenses.len() + 1);
        expenses.push(expense);
        expenses.extend(self.expenses.iter().cloned());
        Self { expenses }
    }

    /// New list without the entry carrying `id`.
    pub fn without(&self, id: i64) -> Self {
        Self {
            expenses: self
                .expenses
                .iter()
                .filter(|e| e.id != id)
                .cloned()
                .collect(),
        }
    }

    pub fn contains(&self, id: i64) -> bool {
        self.expenses.iter().any(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.expenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }
}

/// User-supplied fields of an expense before the server assigns an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateExpenseInput {
    pub title: String,
    pub amount: String,
    pub date: String,
    #[serde(
        rename = "expenseGroup",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub expense_group: Option<String>,
}

impl CreateExpenseInput {
    pub fn new(
        title: impl Into<String>,
        amount: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            amount: amount.into(),
            date: date.into(),
            expense_group: None,
        }
    }

    /// Set the category label.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.expense_group = Some(group.into());
        self
    }
}

/// Response from GET /expenses/total-spent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TotalSpent {
    /// Sum of all amounts. Accepts a JSON number or a numeric string.
    #[serde(deserialize_with = "number_or_string")]
    pub total: f64,
}

fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
        Null(()),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("total is not numeric: {:?}", s))),
        // An empty table sums to null on some backends.
        Raw::Null(()) => Ok(0.0),
    }
}

/// Profile fields of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub given_name: Option<String>,

    #[serde(default)]
    pub family_name: Option<String>,

    #[serde(default)]
    pub picture: Option<String>,
}

impl UserProfile {
    /// "Given Family", falling back to email, then id.
    pub fn display_name(&self) -> String {
        let name = [self.given_name.as_deref(), self.family_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if !name.is_empty() {
            name
        } else {
            self.email.clone().unwrap_or_else(|| self.id.clone())
        }
    }
}

/// Response from GET /me.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub user: UserProfile,
}

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the API (everything before `/expenses`).
    #[serde(default = "default_api_url")]
    pub url: String,

    /// Session token sent as a bearer credential.
    #[serde(default)]
    pub token: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: default_api_url(),
            token: None,
            timeout_secs: default_timeout(),
        }
    }
}

impl ClientConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `TALLY_API_URL` | API base URL |
    /// | `TALLY_SESSION_TOKEN` | Session token |
    /// | `TALLY_TIMEOUT` | Request timeout in seconds |
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("TALLY_API_URL").unwrap_or_else(|_| default_api_url()),
            token: std::env::var("TALLY_SESSION_TOKEN")
                .ok()
                .filter(|t| !t.is_empty()),
            timeout_secs: std::env::var("TALLY_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_timeout),
        }
    }

    /// Set the session token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the base URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}
