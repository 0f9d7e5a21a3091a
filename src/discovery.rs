//! Source extractors: the sets of endpoints that should be monitored.

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

mod docker;
mod endpoint;
mod error;
mod traefik;
mod unix;

pub use docker::{Container, workload_names};
pub use endpoint::Endpoint;
pub use error::{Error, Result};
pub use traefik::{RawData, Router, hosts_from_rawdata, parse_host_rule};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A Traefik instance; yields `https://<host>` identifiers.
    Proxy,
    /// A Docker engine; yields container names.
    Workload,
}

impl SourceKind {
    /// The tag every monitor from this kind of source carries.
    pub fn tag_name(self) -> &'static str {
        match self {
            SourceKind::Proxy => "traefik",
            SourceKind::Workload => "docker",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceKind::Proxy => "Traefik",
            SourceKind::Workload => "Docker",
        })
    }
}

/// One configured source and the tag its monitors are grouped under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceGroup {
    pub kind: SourceKind,
    pub endpoint: Endpoint,
    pub label: String,
    /// Name of the Docker host registered in Uptime Kuma. Workload groups only.
    pub runtime_host: Option<String>,
}

impl SourceGroup {
    pub fn proxy(endpoint: Endpoint, label: impl Into<String>) -> Self {
        Self {
            kind: SourceKind::Proxy,
            endpoint,
            label: label.into(),
            runtime_host: None,
        }
    }

    /// A workload group; `runtime_host` defaults to `<label>-docker`.
    pub fn workload(
        endpoint: Endpoint,
        label: impl Into<String>,
        runtime_host: Option<String>,
    ) -> Self {
        let label = label.into();
        let runtime_host = runtime_host.unwrap_or_else(|| format!("{label}-docker"));
        Self {
            kind: SourceKind::Workload,
            endpoint,
            label,
            runtime_host: Some(runtime_host),
        }
    }
}

pub trait Discover {
    /// The identifiers currently offered by `group`'s source.
    fn discover(
        &self,
        group: &SourceGroup,
    ) -> impl std::future::Future<Output = Result<BTreeSet<String>>> + Send;
}

/// Queries Traefik and Docker over their HTTP APIs.
#[derive(Debug, Clone)]
pub struct HttpDiscoverer {
    client: reqwest::Client,
}

impl HttpDiscoverer {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(Error::Client)?;
        Ok(Self { client })
    }
}

impl Discover for HttpDiscoverer {
    async fn discover(&self, group: &SourceGroup) -> Result<BTreeSet<String>> {
        match group.kind {
            SourceKind::Proxy => traefik::fetch_hosts(&self.client, &group.endpoint).await,
            SourceKind::Workload => docker::fetch_workloads(&self.client, &group.endpoint).await,
        }
    }
}
