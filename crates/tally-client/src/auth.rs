//! Session credential attached to API requests.
//!
//! The API authenticates with a session token issued by the login flow. How
//! the token is obtained is outside this crate; the client only forwards it.

/// Session credential for API requests.
#[derive(Clone, Default)]
pub enum SessionCredential {
    /// Bearer token (from config or env).
    Bearer(String),

    /// Anonymous; protected endpoints answer 401.
    #[default]
    Anonymous,
}

impl SessionCredential {
    /// Create a bearer credential. An empty token is treated as anonymous.
    pub fn bearer(token: impl Into<String>) -> Self {
        let token = token.into();
        if token.is_empty() {
            Self::Anonymous
        } else {
            Self::Bearer(token)
        }
    }

    /// Read `TALLY_SESSION_TOKEN`, falling back to anonymous.
    pub fn from_env() -> Self {
        std::env::var("TALLY_SESSION_TOKEN")
            .map(Self::bearer)
            .unwrap_or(Self::Anonymous)
    }

    /// Value for the `Authorization` header, if any.
    pub fn authorization(&self) -> Option<String> {
        match self {
            Self::Bearer(token) => Some(format!("Bearer {}", token)),
            Self::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Bearer(_))
    }
}

// Keep tokens out of logs.
impl std::fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bearer(_) => f.write_str("Bearer(***)"),
            Self::Anonymous => f.write_str("Anonymous"),
        }
    }
}
