//! Engine.IO HTTP long-polling transport.

use std::time::Duration;

use reqwest::{StatusCode, Url};

use super::engineio::{self, Handshake, Packet};
use super::error::{ApiError, Result};

/// Extra time granted to a poll on top of the server's ping interval.
const POLL_GRACE: Duration = Duration::from_secs(5);

/// One Engine.IO session over HTTP long-polling.
#[derive(Debug)]
pub struct PollingTransport {
    http: reqwest::Client,
    endpoint: Url,
    handshake: Handshake,
}

impl PollingTransport {
    /// Performs the Engine.IO handshake against `base`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transient`] if the server is unreachable or answers
    /// with something other than an `open` packet.
    pub async fn open(http: reqwest::Client, base: &Url) -> Result<Self> {
        let endpoint = socket_endpoint(base)?;
        log::debug!("Opening engine.io session at {endpoint}");
        let response = http.get(endpoint.clone()).send().await?;
        let body = read_body(response).await?;
        let packets = engineio::decode_payload(&body)
            .map_err(|err| ApiError::Transient(err.to_string()))?;

        let handshake = packets
            .into_iter()
            .find_map(|packet| match packet {
                Packet::Open(handshake) => Some(handshake),
                _ => None,
            })
            .ok_or_else(|| {
                ApiError::Transient(format!("server did not open a session: `{body}`"))
            })?;
        log::debug!("Engine.io session {} opened", handshake.sid);

        Ok(Self {
            http,
            endpoint,
            handshake,
        })
    }

    pub fn sid(&self) -> &str {
        &self.handshake.sid
    }

    fn session_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("sid", &self.handshake.sid);
        url
    }

    fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake.ping_interval + self.handshake.ping_timeout)
            + POLL_GRACE
    }

    pub async fn send(&self, packets: &[Packet]) -> Result<()> {
        let body = engineio::encode_payload(packets);
        log::trace!("engine.io send: {body:?}");
        let response = self
            .http
            .post(self.session_url())
            .header(reqwest::header::CONTENT_TYPE, "text/plain;charset=UTF-8")
            .body(body)
            .send()
            .await?;
        read_body(response).await.map(|_| ())
    }

    /// Waits for the next batch of packets from the server.
    pub async fn poll(&self) -> Result<Vec<Packet>> {
        let response = self
            .http
            .get(self.session_url())
            .timeout(self.poll_timeout())
            .send()
            .await?;
        let body = read_body(response).await?;
        log::trace!("engine.io recv: {body:?}");
        engineio::decode_payload(&body).map_err(|err| ApiError::Transient(err.to_string()))
    }
}

/// Builds `<base>/socket.io/?EIO=4&transport=polling`, keeping any path prefix.
fn socket_endpoint(base: &Url) -> Result<Url> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    let mut endpoint = base
        .join("socket.io/")
        .map_err(|err| ApiError::Permanent(format!("invalid service url `{base}`: {err}")))?;
    endpoint
        .query_pairs_mut()
        .clear()
        .append_pair("EIO", "4")
        .append_pair("transport", "polling");
    Ok(endpoint)
}

async fn read_body(response: reqwest::Response) -> Result<String> {
    let status = response.status();
    let body = response.text().await?;
    match status {
        s if s.is_success() => Ok(body),
        // engine.io answers unknown or closed sessions with 400
        StatusCode::BAD_REQUEST => Err(ApiError::AuthExpired(format!(
            "engine.io session rejected: {body}"
        ))),
        s if s.is_server_error() => Err(ApiError::Transient(format!("HTTP {s}: {body}"))),
        s => Err(ApiError::Permanent(format!("HTTP {s}: {body}"))),
    }
}
