use crate::access::Route;
use crate::account::AccountId;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("an account with email {0} already exists")]
    Conflict(String),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("{route} requires sign-in with the matching role; redirecting to {redirect}")]
    AuthorizationRequired { route: Route, redirect: Route },
    #[error("no current report")]
    NoCurrentReport,
    #[error("unknown account: {0}")]
    UnknownAccount(AccountId),
    #[error("no {0} ids left to allocate")]
    IdsExhausted(&'static str),
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;

impl From<labdiag_types::TextError> for SessionError {
    fn from(err: labdiag_types::TextError) -> Self {
        SessionError::Validation(err.to_string())
    }
}

impl From<labdiag_types::EmailError> for SessionError {
    fn from(err: labdiag_types::EmailError) -> Self {
        SessionError::Validation(err.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize saved results: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize saved results: {0}")]
    Deserialization(serde_json::Error),
}

pub type PersistenceResult<T> = std::result::Result<T, PersistenceError>;
