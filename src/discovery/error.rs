use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid source endpoint `{endpoint}`: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to `{url}` failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("`{url}` answered with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("failed to decode response from `{url}`: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to connect to socket `{path}`: {source}")]
    SocketConnect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("HTTP exchange over socket `{path}` failed: {source}")]
    SocketHttp {
        path: PathBuf,
        #[source]
        source: hyper::Error,
    },
    #[error("no answer from socket `{path}` within {timeout:?}")]
    SocketTimeout { path: PathBuf, timeout: Duration },
    #[error("failed to build request for socket `{path}`: {source}")]
    SocketRequest {
        path: PathBuf,
        #[source]
        source: hyper::http::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
