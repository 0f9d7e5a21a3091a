use crate::kuma::ApiError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to log in to Uptime Kuma: {0}")]
    Login(#[source] ApiError),
    #[error("re-authentication failed: {0}")]
    Reauthentication(#[source] ApiError),
    #[error("`{operation}` still failed with an expired session after {attempts} re-authentication(s)")]
    AuthRetriesExhausted {
        operation: &'static str,
        attempts: u32,
    },
    #[error("`{operation}` failed: {source}")]
    Call {
        operation: &'static str,
        #[source]
        source: ApiError,
    },
}

impl Error {
    /// Whether the error must end the run instead of skipping a single item.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Call { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
