//! An in-memory Uptime Kuma for tests.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::kuma::{
    ApiError, ApiFuture, Credentials, DockerHost, DockerHostId, Monitor, MonitorId,
    MonitorService, MonitorSpec, MonitorType, Result, Tag, TagId, TagRef,
};

pub fn credentials() -> Credentials {
    Credentials {
        username: "admin".into(),
        password: "secret".into(),
    }
}

/// Operations of [`MonitorService`], used to script failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Connect,
    Login,
    Disconnect,
    ListMonitors,
    CreateMonitor,
    DeleteMonitor,
    ListTags,
    CreateTag,
    AddMonitorTag,
    RemoveMonitorTag,
    ListDockerHosts,
}

impl Op {
    fn needs_login(self) -> bool {
        !matches!(self, Op::Connect | Op::Login | Op::Disconnect)
    }
}

/// A successfully applied change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    CreateMonitor(MonitorId),
    DeleteMonitor(MonitorId),
    CreateTag(TagId),
    AddMonitorTag(MonitorId, TagId),
    RemoveMonitorTag(MonitorId, TagId),
}

#[derive(Debug, Default)]
struct State {
    connected: bool,
    logged_in: bool,
    logins: u32,
    next_id: i64,
    monitors: BTreeMap<MonitorId, Monitor>,
    tags: Vec<Tag>,
    docker_hosts: Vec<DockerHost>,
    failures: HashMap<Op, VecDeque<ApiError>>,
    mutations: Vec<Mutation>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn monitor_mut(&mut self, id: MonitorId) -> Result<&mut Monitor> {
        self.monitors
            .get_mut(&id)
            .ok_or_else(|| ApiError::Permanent(format!("Monitor {id} not found")))
    }
}

/// Cloning yields another handle onto the same server state.
#[derive(Debug, Clone, Default)]
pub struct FakeKuma {
    state: Arc<Mutex<State>>,
}

impl FakeKuma {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn add_tag(&self, name: &str) -> TagId {
        let mut state = self.state();
        let id = TagId(state.next_id());
        state.tags.push(Tag {
            id,
            name: name.to_owned(),
            color: "#000000".to_owned(),
        });
        id
    }

    pub fn add_docker_host(&self, name: &str) -> DockerHostId {
        let mut state = self.state();
        let id = DockerHostId(state.next_id());
        state.docker_hosts.push(DockerHost {
            id,
            name: name.to_owned(),
        });
        id
    }

    pub fn add_http_monitor(&self, url: &str, tags: &[TagId]) -> MonitorId {
        let mut state = self.state();
        let id = MonitorId(state.next_id());
        state.monitors.insert(
            id,
            Monitor {
                id,
                name: url.trim_start_matches("https://").to_owned(),
                monitor_type: MonitorType::Http,
                url: url.to_owned(),
                docker_container: String::new(),
                docker_host: None,
                tags: tags.iter().copied().map(TagRef::new).collect(),
            },
        );
        id
    }

    pub fn add_docker_monitor(&self, name: &str, host: DockerHostId, tags: &[TagId]) -> MonitorId {
        let mut state = self.state();
        let id = MonitorId(state.next_id());
        state.monitors.insert(
            id,
            Monitor {
                id,
                name: name.to_owned(),
                monitor_type: MonitorType::Docker,
                url: String::new(),
                docker_container: name.to_owned(),
                docker_host: Some(host),
                tags: tags.iter().copied().map(TagRef::new).collect(),
            },
        );
        id
    }

    /// Makes the next call of `op` fail with `err`. Calls queue up.
    pub fn fail_next(&self, op: Op, err: ApiError) {
        self.state().failures.entry(op).or_default().push_back(err);
    }

    /// Invalidates the session server-side.
    pub fn expire_session(&self) {
        self.state().logged_in = false;
    }

    pub fn logins(&self) -> u32 {
        self.state().logins
    }

    pub fn is_logged_in(&self) -> bool {
        self.state().logged_in
    }

    pub fn is_connected(&self) -> bool {
        self.state().connected
    }

    pub fn monitor(&self, id: MonitorId) -> Option<Monitor> {
        self.state().monitors.get(&id).cloned()
    }

    pub fn monitors(&self) -> Vec<Monitor> {
        self.state().monitors.values().cloned().collect()
    }

    pub fn monitor_by_url(&self, url: &str) -> Option<Monitor> {
        self.monitors().into_iter().find(|monitor| monitor.url == url)
    }

    pub fn tag_id(&self, name: &str) -> Option<TagId> {
        self.state()
            .tags
            .iter()
            .find(|tag| tag.name == name)
            .map(|tag| tag.id)
    }

    pub fn tag_count(&self) -> usize {
        self.state().tags.len()
    }

    /// Tag names attached to a monitor, duplicates included.
    pub fn tag_names(&self, id: MonitorId) -> Vec<String> {
        let state = self.state();
        let Some(monitor) = state.monitors.get(&id) else {
            return Vec::new();
        };
        let mut names: Vec<String> = monitor
            .tags
            .iter()
            .filter_map(|tag_ref| state.tags.iter().find(|tag| tag.id == tag_ref.tag_id))
            .map(|tag| tag.name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn mutations(&self) -> Vec<Mutation> {
        self.state().mutations.clone()
    }

    pub fn clear_mutations(&self) {
        self.state().mutations.clear();
    }

    fn run<T: Send + 'static>(
        &mut self,
        op: Op,
        apply: impl FnOnce(&mut State) -> Result<T>,
    ) -> ApiFuture<'_, T> {
        let result = {
            let mut state = self.state();
            let scripted = state.failures.get_mut(&op).and_then(VecDeque::pop_front);
            match scripted {
                Some(err) => Err(err),
                None if op.needs_login() && !(state.connected && state.logged_in) => Err(
                    ApiError::AuthExpired("You are not logged in.".to_owned()),
                ),
                None => apply(&mut state),
            }
        };
        Box::pin(std::future::ready(result))
    }
}

impl MonitorService for FakeKuma {
    fn connect(&mut self) -> ApiFuture<'_, ()> {
        self.run(Op::Connect, |state| {
            state.connected = true;
            Ok(())
        })
    }

    fn login(&mut self, credentials: Credentials) -> ApiFuture<'_, ()> {
        self.run(Op::Login, move |state| {
            if !state.connected {
                return Err(ApiError::Transient("not connected".into()));
            }
            if credentials.password != "secret" {
                return Err(ApiError::Permanent("Incorrect username or password.".into()));
            }
            state.logged_in = true;
            state.logins += 1;
            Ok(())
        })
    }

    fn disconnect(&mut self) -> ApiFuture<'_, ()> {
        self.run(Op::Disconnect, |state| {
            state.connected = false;
            state.logged_in = false;
            Ok(())
        })
    }

    fn list_monitors(&mut self) -> ApiFuture<'_, Vec<Monitor>> {
        self.run(Op::ListMonitors, |state| {
            Ok(state.monitors.values().cloned().collect())
        })
    }

    fn create_monitor(&mut self, spec: MonitorSpec) -> ApiFuture<'_, MonitorId> {
        self.run(Op::CreateMonitor, move |state| {
            let id = MonitorId(state.next_id());
            state.monitors.insert(id, spec.into_monitor(id, Vec::new()));
            state.mutations.push(Mutation::CreateMonitor(id));
            Ok(id)
        })
    }

    fn delete_monitor(&mut self, id: MonitorId) -> ApiFuture<'_, ()> {
        self.run(Op::DeleteMonitor, move |state| {
            state
                .monitors
                .remove(&id)
                .ok_or_else(|| ApiError::Permanent(format!("Monitor {id} not found")))?;
            state.mutations.push(Mutation::DeleteMonitor(id));
            Ok(())
        })
    }

    fn list_tags(&mut self) -> ApiFuture<'_, Vec<Tag>> {
        self.run(Op::ListTags, |state| Ok(state.tags.clone()))
    }

    fn create_tag(&mut self, name: String, color: String) -> ApiFuture<'_, TagId> {
        self.run(Op::CreateTag, move |state| {
            let id = TagId(state.next_id());
            state.tags.push(Tag { id, name, color });
            state.mutations.push(Mutation::CreateTag(id));
            Ok(id)
        })
    }

    fn add_monitor_tag(
        &mut self,
        monitor: MonitorId,
        tag: TagId,
        value: String,
    ) -> ApiFuture<'_, ()> {
        self.run(Op::AddMonitorTag, move |state| {
            state.monitor_mut(monitor)?.tags.push(TagRef { tag_id: tag, value });
            state.mutations.push(Mutation::AddMonitorTag(monitor, tag));
            Ok(())
        })
    }

    fn remove_monitor_tag(
        &mut self,
        monitor: MonitorId,
        tag: TagId,
        value: String,
    ) -> ApiFuture<'_, ()> {
        self.run(Op::RemoveMonitorTag, move |state| {
            let tags = &mut state.monitor_mut(monitor)?.tags;
            let position = tags
                .iter()
                .position(|tag_ref| tag_ref.tag_id == tag && tag_ref.value == value)
                .ok_or_else(|| ApiError::Permanent(format!("Tag {tag} not on monitor")))?;
            tags.remove(position);
            state.mutations.push(Mutation::RemoveMonitorTag(monitor, tag));
            Ok(())
        })
    }

    fn list_docker_hosts(&mut self) -> ApiFuture<'_, Vec<DockerHost>> {
        self.run(Op::ListDockerHosts, |state| Ok(state.docker_hosts.clone()))
    }
}
