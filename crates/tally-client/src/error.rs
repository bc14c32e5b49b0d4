//! Error types for the expense client.

/// Coarse classification used by callers that only care about the error family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Non-2xx status, transport failure or unparseable response.
    Service,
    /// Input rejected before submission.
    Validation,
}

/// Errors surfaced by the remote expense service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Transport failure (connect, timeout, body read).
    #[error("network error: {message}")]
    Network { message: String },

    /// Non-success HTTP status.
    #[error("server error: HTTP {status}: {message}")]
    Server { status: u16, message: String },

    /// Session missing or expired.
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// Response body does not match the expected shape.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl ServiceError {
    /// Every service failure is a service error, parse failures included.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Service
    }

    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => 1,
            Self::Unauthorized { .. } => 2,
            Self::Network { .. } => 5,
            Self::Server { .. } => 5,
            Self::InvalidResponse { .. } => 6,
        }
    }

    /// HTTP status, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            Self::Unauthorized { .. } => Some(401),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

/// A create input field that failed the shared schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub(crate) fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Errors returned by the mutation controller.
///
/// Service failures have already been handled (cache reconciled, notification
/// emitted) by the time the caller sees them.
#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    /// Input refused before submission.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The remote call failed.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Another create is still settling.
    #[error("a create is already in flight")]
    CreateInFlight,

    /// A delete for this id is still settling.
    #[error("delete of expense {id} is already in flight")]
    DeleteInFlight { id: i64 },
}

impl MutationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Service(e) => e.kind(),
            Self::CreateInFlight | Self::DeleteInFlight { .. } => ErrorKind::Validation,
        }
    }

    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Service(e) => e.exit_code(),
            Self::Validation(_) => 1,
            Self::CreateInFlight | Self::DeleteInFlight { .. } => 3,
        }
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result type for controller operations.
pub type MutationResult<T> = Result<T, MutationError>;
