use std::collections::HashMap;

use crate::kuma::{DockerHostId, Monitor, MonitorId, MonitorType, TagId, TagRef};

/// The identity of a monitor, independent of its service-assigned id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NaturalKey {
    Url(String),
    Workload { name: String, host: DockerHostId },
}

impl NaturalKey {
    /// The key an existing monitor is indexed under, if it has one.
    pub fn of(monitor: &Monitor) -> Option<Self> {
        match (&monitor.monitor_type, monitor.docker_host) {
            (MonitorType::Docker, Some(host)) => Some(NaturalKey::Workload {
                name: monitor.name.clone(),
                host,
            }),
            (MonitorType::Docker, None) => None,
            _ if monitor.url.is_empty() => None,
            _ => Some(NaturalKey::Url(monitor.url.clone())),
        }
    }
}

/// The monitors known to exist, indexed by natural key.
///
/// When several monitors share a key the first one wins, so duplicates left
/// behind by earlier runs are matched deterministically.
#[derive(Debug, Default)]
pub struct Snapshot {
    monitors: Vec<Monitor>,
    index: HashMap<NaturalKey, usize>,
}

impl Snapshot {
    pub fn new(monitors: Vec<Monitor>) -> Self {
        let mut snapshot = Self::default();
        for monitor in monitors {
            snapshot.insert(monitor);
        }
        snapshot
    }

    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }

    pub fn monitors(&self) -> &[Monitor] {
        &self.monitors
    }

    pub fn find(&self, key: &NaturalKey) -> Option<&Monitor> {
        self.index.get(key).map(|&position| &self.monitors[position])
    }

    pub fn get(&self, id: MonitorId) -> Option<&Monitor> {
        self.monitors.iter().find(|monitor| monitor.id == id)
    }

    pub fn insert(&mut self, monitor: Monitor) {
        if let Some(key) = NaturalKey::of(&monitor) {
            self.index.entry(key).or_insert(self.monitors.len());
        }
        self.monitors.push(monitor);
    }

    /// Drops the given monitors and rebuilds the index.
    pub fn remove_all(&mut self, ids: &[MonitorId]) {
        let monitors = std::mem::take(&mut self.monitors);
        *self = Self::new(
            monitors
                .into_iter()
                .filter(|monitor| !ids.contains(&monitor.id))
                .collect(),
        );
    }

    pub fn add_tag(&mut self, id: MonitorId, tag: TagRef) {
        if let Some(monitor) = self.get_mut(id) {
            monitor.tags.push(tag);
        }
    }

    pub fn remove_tag(&mut self, id: MonitorId, tag_id: TagId, value: &str) {
        let Some(monitor) = self.get_mut(id) else {
            return;
        };
        if let Some(position) = monitor
            .tags
            .iter()
            .position(|tag| tag.tag_id == tag_id && tag.value == value)
        {
            monitor.tags.remove(position);
        }
    }

    fn get_mut(&mut self, id: MonitorId) -> Option<&mut Monitor> {
        self.monitors.iter_mut().find(|monitor| monitor.id == id)
    }
}
