use std::collections::BTreeSet;

use serde::Deserialize;

use super::Endpoint;
use super::error::Result;

/// One entry of Docker's `/containers/json` listing.
#[derive(Debug, Default, Deserialize)]
pub struct Container {
    #[serde(default, rename = "Names")]
    pub names: Vec<String>,
}

impl Container {
    /// The container's primary name without Docker's leading `/`.
    pub fn workload_name(&self) -> Option<&str> {
        let name = self.names.first()?.trim_start_matches('/');
        (!name.is_empty()).then_some(name)
    }
}

pub fn workload_names(containers: &[Container]) -> BTreeSet<String> {
    containers
        .iter()
        .filter_map(Container::workload_name)
        .map(str::to_owned)
        .collect()
}

/// Names of the containers currently running on `endpoint`.
pub async fn fetch_workloads(
    client: &reqwest::Client,
    endpoint: &Endpoint,
) -> Result<BTreeSet<String>> {
    let containers: Vec<Container> = endpoint.get_json(client, "/containers/json").await?;
    Ok(workload_names(&containers))
}
