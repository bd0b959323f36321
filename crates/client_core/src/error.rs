use shared::{domain::UserType, error::ErrorCode};
use thiserror::Error;

/// Failure reported by a [`RemoteStore`](crate::RemoteStore).
///
/// The display form is the backend's human-readable message, which the page
/// shell shows verbatim.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{message}")]
    Status {
        status: u16,
        code: ErrorCode,
        message: String,
    },
    #[error("{0}")]
    Rejected(String),
    #[error("bills backend unreachable: {0}")]
    Transport(String),
    #[error("invalid response from bills backend: {0}")]
    Decode(String),
    #[error("invalid bills endpoint: {0}")]
    Endpoint(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::Decode(value.to_string())
        } else {
            Self::Transport(value.to_string())
        }
    }
}

impl StoreError {
    /// Backend error code, for failures the backend answered.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("invalid bill date '{0}'")]
    InvalidDate(String),
    #[error("unknown bill status '{0}'")]
    UnknownStatus(String),
}

#[derive(Debug, Error)]
pub enum RetrieveError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Format(#[from] FormatError),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no signed-in user in session")]
    MissingUser,
    #[error("malformed session user: {0}")]
    InvalidUser(#[from] serde_json::Error),
    #[error("bills pages are for employees; signed in as {0:?}")]
    NotEmployee(UserType),
}
