use std::collections::{BTreeSet, HashMap};

use serde::Deserialize;

use super::Endpoint;
use super::error::Result;

/// Only routers on this entry point are monitored.
const HTTPS_ENTRY_POINT: &str = "https";

/// The part of Traefik's `/api/rawdata` response we care about.
#[derive(Debug, Default, Deserialize)]
pub struct RawData {
    #[serde(default)]
    pub routers: HashMap<String, Router>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Router {
    #[serde(default, rename = "entryPoints")]
    pub entry_points: Vec<String>,
    #[serde(default)]
    pub rule: String,
}

/// Extracts the host of the first well-formed ``Host(`name`)`` matcher.
pub fn parse_host_rule(rule: &str) -> Option<&str> {
    const OPEN: &str = "Host(`";

    let mut rest = rule;
    while let Some(start) = rest.find(OPEN) {
        let after = &rest[start + OPEN.len()..];
        let end = after.find('`')?;
        let name = &after[..end];
        if !name.is_empty() && after[end..].starts_with("`)") {
            return Some(name);
        }
        rest = &rest[start + 1..];
    }
    None
}

/// `https://<host>` for every router served on the `https` entry point.
pub fn hosts_from_rawdata(data: &RawData) -> BTreeSet<String> {
    data.routers
        .values()
        .filter(|router| router.entry_points.iter().any(|ep| ep == HTTPS_ENTRY_POINT))
        .filter_map(|router| parse_host_rule(&router.rule))
        .map(|host| format!("https://{host}"))
        .collect()
}

pub async fn fetch_hosts(client: &reqwest::Client, endpoint: &Endpoint) -> Result<BTreeSet<String>> {
    let data: RawData = endpoint.get_json(client, "/api/rawdata").await?;
    log::debug!("Traefik at {endpoint} reports {} routers", data.routers.len());
    Ok(hosts_from_rawdata(&data))
}
