use std::path::Path;
use std::time::Duration;

use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper_util::rt::TokioIo;

use super::error::{Error, Result};

/// Issues a single `GET` over HTTP/1 on the Unix socket at `path` and returns
/// status and body. The whole exchange is bounded by `timeout`.
pub async fn get(path: &Path, uri: &str, timeout: Duration) -> Result<(u16, Bytes)> {
    tokio::time::timeout(timeout, exchange(path, uri))
        .await
        .map_err(|_| Error::SocketTimeout {
            path: path.to_path_buf(),
            timeout,
        })?
}

async fn exchange(path: &Path, uri: &str) -> Result<(u16, Bytes)> {
    log::debug!("Connecting to {}...", path.display());
    let stream = tokio::net::UnixStream::connect(path)
        .await
        .map_err(|source| Error::SocketConnect {
            path: path.to_path_buf(),
            source,
        })?;

    let http_error = |source: hyper::Error| Error::SocketHttp {
        path: path.to_path_buf(),
        source,
    };
    let (mut sender, connection) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
        .await
        .map_err(http_error)?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            log::debug!("Unix socket connection closed: {err}");
        }
    });

    let request = hyper::Request::get(uri)
        .header(hyper::header::HOST, "localhost")
        .body(Empty::<Bytes>::new())
        .map_err(|source| Error::SocketRequest {
            path: path.to_path_buf(),
            source,
        })?;
    let response = sender.send_request(request).await.map_err(http_error)?;
    let status = response.status().as_u16();
    let body = response
        .into_body()
        .collect()
        .await
        .map_err(http_error)?
        .to_bytes();
    log::debug!("GET {uri} on {} answered {status}", path.display());

    Ok((status, body))
}
