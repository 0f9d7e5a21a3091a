use std::fmt;
use std::path::PathBuf;

use reqwest::Url;
use serde::de::DeserializeOwned;

use super::error::{Error, Result};
use super::{REQUEST_TIMEOUT, unix};

/// Where a source is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Http(Url),
    /// HTTP/1 over a Unix domain socket.
    Unix(PathBuf),
}

impl Endpoint {
    /// Parses `http(s)://`, `tcp://` (treated as plain HTTP) and
    /// `unix:///path` endpoints.
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidEndpoint {
            endpoint: raw.to_owned(),
            reason: reason.to_owned(),
        };

        if let Some(path) = raw.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(invalid("missing socket path"));
            }
            return Ok(Endpoint::Unix(PathBuf::from(path)));
        }

        let rewritten = match raw.strip_prefix("tcp://") {
            Some(rest) => format!("http://{rest}"),
            None => raw.to_owned(),
        };
        let url = Url::parse(&rewritten).map_err(|err| invalid(&err.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("expected http, https, tcp or unix scheme"));
        }
        Ok(Endpoint::Http(url))
    }

    /// Fetches `path` (starting with `/`) below the endpoint and decodes the
    /// JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        client: &reqwest::Client,
        path: &str,
    ) -> Result<T> {
        let (url, status, body) = match self {
            Endpoint::Http(base) => {
                let url = format!("{}{path}", base.as_str().trim_end_matches('/'));
                log::debug!("GET {url}");
                let response = client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|source| Error::Request {
                        url: url.clone(),
                        source,
                    })?;
                let status = response.status().as_u16();
                let body = response.bytes().await.map_err(|source| Error::Request {
                    url: url.clone(),
                    source,
                })?;
                (url, status, body)
            }
            Endpoint::Unix(socket) => {
                let (status, body) = unix::get(socket, path, REQUEST_TIMEOUT).await?;
                (format!("unix://{}{path}", socket.display()), status, body)
            }
        };

        if !(200..300).contains(&status) {
            return Err(Error::Status { url, status });
        }
        serde_json::from_slice(&body).map_err(|source| Error::Decode { url, source })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Http(url) => write!(f, "{}", url.as_str().trim_end_matches('/')),
            Endpoint::Unix(path) => write!(f, "unix://{}", path.display()),
        }
    }
}
