use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Treats an explicit JSON `null` the same as a missing field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Identifier of a monitor inside Uptime Kuma.
    MonitorId
);
id_type!(
    /// Identifier of a tag inside Uptime Kuma.
    TagId
);
id_type!(
    /// Identifier of a Docker host registered in Uptime Kuma.
    DockerHostId
);

/// The check type of a monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorType {
    Http,
    Docker,
    #[serde(other)]
    Other,
}

/// A tag attached to a monitor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TagRef {
    pub tag_id: TagId,
    #[serde(default, deserialize_with = "nullable")]
    pub value: String,
}

impl TagRef {
    pub fn new(tag_id: TagId) -> Self {
        Self {
            tag_id,
            value: String::new(),
        }
    }
}

/// A monitor as reported by the `monitorList` event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Monitor {
    pub id: MonitorId,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(rename = "type")]
    pub monitor_type: MonitorType,
    #[serde(default, deserialize_with = "nullable")]
    pub url: String,
    #[serde(default, deserialize_with = "nullable")]
    pub docker_container: String,
    #[serde(default)]
    pub docker_host: Option<DockerHostId>,
    #[serde(default, deserialize_with = "nullable")]
    pub tags: Vec<TagRef>,
}

impl Monitor {
    /// The string compared against ignore patterns: the URL when the monitor
    /// watches one, the name otherwise.
    pub fn ignore_subject(&self) -> &str {
        if self.monitor_type != MonitorType::Docker && !self.url.is_empty() {
            &self.url
        } else {
            &self.name
        }
    }

    pub fn has_tag(&self, tag_id: TagId) -> bool {
        self.tags.iter().any(|tag| tag.tag_id == tag_id)
    }
}

/// A tag definition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub color: String,
}

/// A Docker host as reported by the `dockerHostList` event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DockerHost {
    pub id: DockerHostId,
    pub name: String,
}

/// Check settings applied to newly created HTTP monitors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpCheck {
    pub method: String,
    pub interval: u32,
    pub retry_interval: u32,
    pub max_retries: u32,
    pub accepted_status_codes: Vec<String>,
    pub max_redirects: u32,
    pub timeout: u32,
}

impl Default for HttpCheck {
    fn default() -> Self {
        Self {
            method: "GET".to_owned(),
            interval: 60,
            retry_interval: 60,
            max_retries: 0,
            accepted_status_codes: vec!["200-299".to_owned()],
            max_redirects: 10,
            timeout: 48,
        }
    }
}

/// Everything needed to create a monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorSpec {
    Http {
        name: String,
        url: String,
        check: HttpCheck,
    },
    Docker {
        name: String,
        container: String,
        docker_host: DockerHostId,
    },
}

impl MonitorSpec {
    pub fn name(&self) -> &str {
        match self {
            MonitorSpec::Http { name, .. } | MonitorSpec::Docker { name, .. } => name,
        }
    }

    /// The monitor Uptime Kuma will report once this spec has been created.
    pub fn into_monitor(self, id: MonitorId, tags: Vec<TagRef>) -> Monitor {
        match self {
            MonitorSpec::Http { name, url, .. } => Monitor {
                id,
                name,
                monitor_type: MonitorType::Http,
                url,
                docker_container: String::new(),
                docker_host: None,
                tags,
            },
            MonitorSpec::Docker {
                name,
                container,
                docker_host,
            } => Monitor {
                id,
                name,
                monitor_type: MonitorType::Docker,
                url: String::new(),
                docker_container: container,
                docker_host: Some(docker_host),
                tags,
            },
        }
    }
}
