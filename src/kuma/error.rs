/// Failure of a single call against the monitoring service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The server no longer recognises the session; re-authenticating may help.
    #[error("session expired: {0}")]
    AuthExpired(String),
    /// Network or server trouble; the call may succeed later.
    #[error("transient failure: {0}")]
    Transient(String),
    /// The server rejected the call; repeating it will not help.
    #[error("rejected by server: {0}")]
    Permanent(String),
}

impl ApiError {
    /// Classifies the `msg` of a negative acknowledgement.
    pub fn from_rejection(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        let lower = msg.to_lowercase();
        if lower.contains("not logged in") || lower.contains("unauthorized") {
            ApiError::AuthExpired(msg)
        } else {
            ApiError::Permanent(msg)
        }
    }

    pub fn is_auth_expired(&self) -> bool {
        matches!(self, ApiError::AuthExpired(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transient(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
