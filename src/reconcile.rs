//! Converges Uptime Kuma monitors onto the discovered endpoints.
//!
//! A [`Reconciler`] owns the snapshot of existing monitors for one run. It
//! prunes ignored monitors once, then takes one source group at a time: ignored
//! identifiers are dropped, identifiers that already have a monitor get their
//! tags reconciled, and the rest get a new monitor.

use std::collections::BTreeSet;
use std::time::Duration;

use crate::discovery::{SourceGroup, SourceKind};
use crate::kuma::{
    DockerHostId, HttpCheck, Monitor, MonitorId, MonitorService, MonitorSpec, TagId, TagRef,
};
use crate::session::{self, Session};

mod ignore;
mod snapshot;
mod summary;
mod tags;

pub use ignore::{IgnorePatterns, InvalidPattern, host_component};
pub use snapshot::{NaturalKey, Snapshot};
pub use summary::Summary;
pub use tags::{TAG_COLOR, TagResolver};

/// How tags of already existing monitors are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TagPolicy {
    /// Add missing tags, never remove any.
    #[default]
    Additive,
    /// Replace the tags with exactly the group and source tags.
    Reset,
}

#[derive(Debug, Clone, Default)]
pub struct Options {
    pub ignore: IgnorePatterns,
    pub tag_policy: TagPolicy,
    /// Pause after every applied action.
    pub throttle: Duration,
    pub http_check: HttpCheck,
}

/// The part of the natural-key space a group's identifiers live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Url,
    Workload(DockerHostId),
}

impl Scope {
    fn key(self, identifier: &str) -> NaturalKey {
        match self {
            Scope::Url => NaturalKey::Url(identifier.to_owned()),
            Scope::Workload(host) => NaturalKey::Workload {
                name: identifier.to_owned(),
                host,
            },
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Plan {
    matched: Vec<MonitorId>,
    to_create: Vec<String>,
}

fn plan(snapshot: &Snapshot, scope: Scope, desired: &BTreeSet<String>) -> Plan {
    let mut plan = Plan::default();
    for identifier in desired {
        match snapshot.find(&scope.key(identifier)) {
            Some(monitor) => plan.matched.push(monitor.id),
            None => plan.to_create.push(identifier.clone()),
        }
    }
    plan
}

fn has_exact_tags(monitor: &Monitor, required: &[TagId]) -> bool {
    monitor.tags.len() == required.len() && required.iter().all(|&tag| monitor.has_tag(tag))
}

enum TagOutcome {
    Unchanged,
    Updated,
    Failed,
}

pub struct Reconciler {
    options: Options,
    snapshot: Snapshot,
    tags: TagResolver,
    summary: Summary,
}

impl Reconciler {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            snapshot: Snapshot::default(),
            tags: TagResolver::default(),
            summary: Summary::default(),
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn summary(&self) -> Summary {
        self.summary
    }

    /// Replaces the snapshot with the monitors currently on the server.
    ///
    /// # Errors
    ///
    /// Any failure is returned; without an inventory every identifier would
    /// look new.
    pub async fn load<S: MonitorService>(&mut self, session: &mut Session<S>) -> session::Result<()> {
        let monitors = session.list_monitors().await?;
        log::info!("Found {} existing monitors", monitors.len());
        self.snapshot = Snapshot::new(monitors);
        Ok(())
    }

    /// Deletes every existing monitor matching an ignore pattern, then
    /// refreshes the snapshot.
    pub async fn prune<S: MonitorService>(&mut self, session: &mut Session<S>) -> session::Result<()> {
        if self.options.ignore.is_empty() {
            return Ok(());
        }

        let doomed: Vec<(MonitorId, String)> = self
            .snapshot
            .monitors()
            .iter()
            .filter(|monitor| self.options.ignore.matches(monitor.ignore_subject()))
            .map(|monitor| (monitor.id, monitor.ignore_subject().to_owned()))
            .collect();
        if doomed.is_empty() {
            log::info!("No existing monitors match the ignore patterns");
            return Ok(());
        }

        log::info!("Removing {} monitors matching ignore patterns", doomed.len());
        let mut removed = Vec::with_capacity(doomed.len());
        for (id, subject) in &doomed {
            match session.delete_monitor(*id).await {
                Ok(()) => {
                    log::info!("Removed monitor for {subject} (ID: {id})");
                    removed.push(*id);
                }
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    log::warn!("Failed to remove monitor for {subject} (ID: {id}): {err}");
                    self.summary.failures += 1;
                }
            }
            self.throttle().await;
        }
        self.summary.removed += removed.len();
        log::info!("Removed {} of {} ignored monitors", removed.len(), doomed.len());

        match session.list_monitors().await {
            Ok(monitors) => self.snapshot = Snapshot::new(monitors),
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                log::warn!("Could not refresh monitors after pruning, continuing with local state: {err}");
                self.snapshot.remove_all(&removed);
            }
        }
        Ok(())
    }

    /// Brings the monitors of one source group in line with `desired`.
    ///
    /// # Errors
    ///
    /// Only fatal session errors are returned; everything else is logged,
    /// counted and skipped.
    pub async fn reconcile_group<S: MonitorService>(
        &mut self,
        session: &mut Session<S>,
        group: &SourceGroup,
        desired: BTreeSet<String>,
    ) -> session::Result<()> {
        let (ignored, desired): (BTreeSet<String>, BTreeSet<String>) = desired
            .into_iter()
            .partition(|identifier| self.options.ignore.matches(identifier));
        for identifier in &ignored {
            log::info!("Ignoring {identifier} (matches ignore pattern)");
        }
        self.summary.ignored += ignored.len();
        if desired.is_empty() {
            log::info!("Nothing to reconcile for group '{}'", group.label);
            return Ok(());
        }

        let scope = match group.kind {
            SourceKind::Proxy => Scope::Url,
            SourceKind::Workload => match self.docker_host(session, group).await? {
                Some(host) => Scope::Workload(host),
                None => {
                    self.summary.skipped_groups += 1;
                    return Ok(());
                }
            },
        };

        let required = self.required_tags(session, group).await?;
        let plan = plan(&self.snapshot, scope, &desired);
        log::info!(
            "{} already monitored, {} to create",
            plan.matched.len(),
            plan.to_create.len()
        );

        if required.is_empty() {
            log::warn!("No tags resolved for group '{}', leaving existing tags alone", group.label);
        } else {
            self.reconcile_tags(session, &plan.matched, &required).await?;
        }
        self.create_monitors(session, scope, &plan.to_create, &required)
            .await
    }

    async fn docker_host<S: MonitorService>(
        &mut self,
        session: &mut Session<S>,
        group: &SourceGroup,
    ) -> session::Result<Option<DockerHostId>> {
        let Some(name) = group.runtime_host.as_deref() else {
            log::warn!("No Docker host configured for group '{}', skipping it", group.label);
            return Ok(None);
        };
        let hosts = match session.list_docker_hosts().await {
            Ok(hosts) => hosts,
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                log::warn!("Could not list Docker hosts, skipping group '{}': {err}", group.label);
                return Ok(None);
            }
        };

        match hosts.into_iter().find(|host| host.name == name) {
            Some(host) => {
                log::info!("Using Docker host '{name}' (ID: {})", host.id);
                Ok(Some(host.id))
            }
            None => {
                log::warn!(
                    "Docker host '{name}' not found in Uptime Kuma, skipping group '{}'. \
                     Add it under Settings > Docker Hosts.",
                    group.label
                );
                Ok(None)
            }
        }
    }

    async fn required_tags<S: MonitorService>(
        &mut self,
        session: &mut Session<S>,
        group: &SourceGroup,
    ) -> session::Result<Vec<TagId>> {
        let mut required = Vec::with_capacity(2);
        for name in [group.label.as_str(), group.kind.tag_name()] {
            let Some(id) = self.tags.resolve(session, name).await? else {
                continue;
            };
            if !required.contains(&id) {
                required.push(id);
            }
        }
        Ok(required)
    }

    async fn reconcile_tags<S: MonitorService>(
        &mut self,
        session: &mut Session<S>,
        matched: &[MonitorId],
        required: &[TagId],
    ) -> session::Result<()> {
        let mut updated = 0;
        for &id in matched {
            let Some(monitor) = self.snapshot.get(id).cloned() else {
                continue;
            };
            let outcome = match self.options.tag_policy {
                TagPolicy::Additive => self.add_missing_tags(session, &monitor, required).await?,
                TagPolicy::Reset => self.reset_tags(session, &monitor, required).await?,
            };
            match outcome {
                TagOutcome::Unchanged => continue,
                TagOutcome::Updated => updated += 1,
                TagOutcome::Failed => {}
            }
            self.throttle().await;
        }

        self.summary.tags_updated += updated;
        if updated > 0 {
            log::info!("Updated tags on {updated} existing monitors");
        }
        Ok(())
    }

    async fn add_missing_tags<S: MonitorService>(
        &mut self,
        session: &mut Session<S>,
        monitor: &Monitor,
        required: &[TagId],
    ) -> session::Result<TagOutcome> {
        let missing: Vec<TagId> = required
            .iter()
            .copied()
            .filter(|&tag| !monitor.has_tag(tag))
            .collect();
        if missing.is_empty() {
            return Ok(TagOutcome::Unchanged);
        }

        log::info!("Adding tags to: {}", monitor.name);
        let added = self.attach_tags(session, monitor.id, &missing).await?;
        Ok(if added > 0 {
            TagOutcome::Updated
        } else {
            TagOutcome::Failed
        })
    }

    async fn reset_tags<S: MonitorService>(
        &mut self,
        session: &mut Session<S>,
        monitor: &Monitor,
        required: &[TagId],
    ) -> session::Result<TagOutcome> {
        if has_exact_tags(monitor, required) {
            return Ok(TagOutcome::Unchanged);
        }

        log::info!("Resetting tags for: {}", monitor.name);
        for tag in &monitor.tags {
            match session
                .remove_monitor_tag(monitor.id, tag.tag_id, &tag.value)
                .await
            {
                Ok(()) => self.snapshot.remove_tag(monitor.id, tag.tag_id, &tag.value),
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    log::warn!(
                        "Could not remove tag (ID: {}) from {}, not adding new tags: {err}",
                        tag.tag_id,
                        monitor.name
                    );
                    self.summary.failures += 1;
                    return Ok(TagOutcome::Failed);
                }
            }
        }

        let added = self.attach_tags(session, monitor.id, required).await?;
        if added == 0 && !required.is_empty() {
            log::warn!("Tags removed from {} but none could be added", monitor.name);
            return Ok(TagOutcome::Failed);
        }
        log::info!(
            "Tags reset for {} (removed {}, added {added})",
            monitor.name,
            monitor.tags.len()
        );
        Ok(TagOutcome::Updated)
    }

    /// Adds `tags` to the monitor one by one; returns how many stuck.
    async fn attach_tags<S: MonitorService>(
        &mut self,
        session: &mut Session<S>,
        id: MonitorId,
        tags: &[TagId],
    ) -> session::Result<usize> {
        let mut added = 0;
        for &tag in tags {
            match session.add_monitor_tag(id, tag).await {
                Ok(()) => {
                    self.snapshot.add_tag(id, TagRef::new(tag));
                    added += 1;
                }
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    log::warn!("Could not add tag (ID: {tag}) to monitor {id}: {err}");
                    self.summary.failures += 1;
                }
            }
        }
        Ok(added)
    }

    async fn create_monitors<S: MonitorService>(
        &mut self,
        session: &mut Session<S>,
        scope: Scope,
        identifiers: &[String],
        required: &[TagId],
    ) -> session::Result<()> {
        if identifiers.is_empty() {
            return Ok(());
        }

        log::info!("Need to create {} new monitors", identifiers.len());
        for identifier in identifiers {
            let spec = self.monitor_spec(scope, identifier);
            log::info!("Creating monitor {} for {identifier}...", spec.name());
            match session.create_monitor(spec.clone()).await {
                Ok(id) => {
                    self.snapshot.insert(spec.into_monitor(id, Vec::new()));
                    self.attach_tags(session, id, required).await?;
                    self.summary.created += 1;
                    log::info!("Created monitor (ID: {id})");
                }
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    log::warn!("Failed to create monitor for {identifier}: {err}");
                    self.summary.failures += 1;
                }
            }
            self.throttle().await;
        }
        Ok(())
    }

    fn monitor_spec(&self, scope: Scope, identifier: &str) -> MonitorSpec {
        match scope {
            Scope::Url => MonitorSpec::Http {
                name: host_component(identifier).to_owned(),
                url: identifier.to_owned(),
                check: self.options.http_check.clone(),
            },
            Scope::Workload(docker_host) => MonitorSpec::Docker {
                name: identifier.to_owned(),
                container: identifier.to_owned(),
                docker_host,
            },
        }
    }

    async fn throttle(&self) {
        if !self.options.throttle.is_zero() {
            tokio::time::sleep(self.options.throttle).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::Endpoint;
    use crate::kuma::{ApiError, MonitorType};
    use crate::testing::{FakeKuma, Mutation, Op, credentials};

    fn proxy(label: &str) -> SourceGroup {
        SourceGroup::proxy(Endpoint::parse("http://traefik:8080").unwrap(), label)
    }

    fn workload(label: &str) -> SourceGroup {
        SourceGroup::workload(Endpoint::parse("tcp://docker:2375").unwrap(), label, None)
    }

    fn set(identifiers: &[&str]) -> BTreeSet<String> {
        identifiers.iter().map(|id| (*id).to_owned()).collect()
    }

    fn options(tag_policy: TagPolicy) -> Options {
        Options {
            tag_policy,
            ..Options::default()
        }
    }

    fn ignoring(patterns: &[&str]) -> Options {
        Options {
            ignore: IgnorePatterns::new(patterns).unwrap(),
            ..Options::default()
        }
    }

    async fn run(fake: &FakeKuma, options: Options, groups: &[(SourceGroup, &[&str])]) -> Summary {
        let mut session = Session::open(fake.clone(), credentials(), Duration::ZERO)
            .await
            .unwrap();
        let mut reconciler = Reconciler::new(options);
        reconciler.load(&mut session).await.unwrap();
        reconciler.prune(&mut session).await.unwrap();
        for (group, desired) in groups {
            reconciler
                .reconcile_group(&mut session, group, set(desired))
                .await
                .unwrap();
        }
        reconciler.summary()
    }

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| (*name).to_owned()).collect()
    }

    #[test]
    fn plan_splits_matched_and_new() {
        let snapshot = Snapshot::new(vec![
            MonitorSpec::Http {
                name: "a.example.com".into(),
                url: "https://a.example.com".into(),
                check: HttpCheck::default(),
            }
            .into_monitor(MonitorId(1), Vec::new()),
        ]);

        let plan = plan(
            &snapshot,
            Scope::Url,
            &set(&["https://a.example.com", "https://b.example.com"]),
        );

        assert_eq!(plan.matched, vec![MonitorId(1)]);
        assert_eq!(plan.to_create, names(&["https://b.example.com"]));
    }

    #[tokio::test]
    async fn only_missing_monitors_are_created() {
        let fake = FakeKuma::default();
        let existing = fake.add_http_monitor("https://a.example.com", &[]);

        let summary = run(
            &fake,
            Options::default(),
            &[(proxy("Prod"), &["https://a.example.com", "https://b.example.com"])],
        )
        .await;

        assert_eq!(summary.created, 1);
        assert_eq!(fake.monitors().len(), 2);
        let created = fake.monitor_by_url("https://b.example.com").unwrap();
        assert_eq!(created.name, "b.example.com");
        assert_eq!(created.monitor_type, MonitorType::Http);
        assert_eq!(fake.tag_names(created.id), names(&["Prod", "traefik"]));
        assert_eq!(fake.tag_names(existing), names(&["Prod", "traefik"]));
    }

    #[tokio::test]
    async fn second_run_changes_nothing() {
        let fake = FakeKuma::default();
        let groups = [
            (proxy("Prod"), &["https://a.example.com", "https://b.example.com"][..]),
            (workload("Docker 1"), &["redis"][..]),
        ];
        fake.add_docker_host("Docker 1-docker");

        run(&fake, Options::default(), &groups).await;
        fake.clear_mutations();
        let summary = run(&fake, Options::default(), &groups).await;

        assert!(fake.mutations().is_empty());
        assert_eq!(summary, Summary::default());
    }

    #[tokio::test]
    async fn additive_policy_keeps_unrelated_tags() {
        let fake = FakeKuma::default();
        let legacy = fake.add_tag("legacy");
        let id = fake.add_http_monitor("https://a.example.com", &[legacy]);

        let summary = run(
            &fake,
            options(TagPolicy::Additive),
            &[(proxy("Prod"), &["https://a.example.com"])],
        )
        .await;

        assert_eq!(fake.tag_names(id), names(&["Prod", "legacy", "traefik"]));
        assert_eq!(summary.tags_updated, 1);
        assert!(
            !fake
                .mutations()
                .iter()
                .any(|mutation| matches!(mutation, Mutation::RemoveMonitorTag(..)))
        );
    }

    #[tokio::test]
    async fn reset_policy_leaves_exactly_required_tags() {
        let fake = FakeKuma::default();
        let legacy = fake.add_tag("legacy");
        let traefik = fake.add_tag("traefik");
        let id = fake.add_http_monitor("https://a.example.com", &[legacy, traefik]);

        run(
            &fake,
            options(TagPolicy::Reset),
            &[(proxy("Prod"), &["https://a.example.com"])],
        )
        .await;

        assert_eq!(fake.tag_names(id), names(&["Prod", "traefik"]));
    }

    #[tokio::test]
    async fn reset_skips_monitors_already_exact() {
        let fake = FakeKuma::default();
        let prod = fake.add_tag("Prod");
        let traefik = fake.add_tag("traefik");
        fake.add_http_monitor("https://a.example.com", &[traefik, prod]);

        let summary = run(
            &fake,
            options(TagPolicy::Reset),
            &[(proxy("Prod"), &["https://a.example.com"])],
        )
        .await;

        assert!(fake.mutations().is_empty());
        assert_eq!(summary.tags_updated, 0);
    }

    #[tokio::test]
    async fn reset_removal_failure_only_skips_that_monitor() {
        let fake = FakeKuma::default();
        let legacy = fake.add_tag("legacy");
        let a = fake.add_http_monitor("https://a.example.com", &[legacy]);
        let b = fake.add_http_monitor("https://b.example.com", &[legacy]);
        fake.fail_next(Op::RemoveMonitorTag, ApiError::Permanent("locked".into()));

        let summary = run(
            &fake,
            options(TagPolicy::Reset),
            &[(proxy("Prod"), &["https://a.example.com", "https://b.example.com"])],
        )
        .await;

        assert_eq!(fake.tag_names(a), names(&["legacy"]));
        assert_eq!(fake.tag_names(b), names(&["Prod", "traefik"]));
        assert_eq!(summary.failures, 1);
        assert_eq!(summary.tags_updated, 1);
    }

    #[tokio::test]
    async fn reset_that_adds_nothing_is_not_counted_as_updated() {
        let fake = FakeKuma::default();
        let legacy = fake.add_tag("legacy");
        let id = fake.add_http_monitor("https://a.example.com", &[legacy]);
        fake.fail_next(Op::AddMonitorTag, ApiError::Permanent("locked".into()));
        fake.fail_next(Op::AddMonitorTag, ApiError::Permanent("locked".into()));

        let summary = run(
            &fake,
            options(TagPolicy::Reset),
            &[(proxy("Prod"), &["https://a.example.com"])],
        )
        .await;

        assert!(fake.tag_names(id).is_empty());
        assert_eq!(summary.tags_updated, 0);
        assert_eq!(summary.failures, 2);
    }

    #[tokio::test]
    async fn reset_without_resolvable_group_tag_keeps_source_tag_only() {
        let fake = FakeKuma::default();
        let legacy = fake.add_tag("legacy");
        let id = fake.add_http_monitor("https://a.example.com", &[legacy]);
        fake.fail_next(Op::CreateTag, ApiError::Permanent("database locked".into()));

        run(
            &fake,
            options(TagPolicy::Reset),
            &[(proxy("Prod"), &["https://a.example.com"])],
        )
        .await;

        assert_eq!(fake.tag_names(id), names(&["traefik"]));
    }

    #[tokio::test]
    async fn ignored_monitors_are_pruned_before_creation() {
        let fake = FakeKuma::default();
        let staging = fake.add_http_monitor("https://staging.example.com", &[]);

        let summary = run(
            &fake,
            ignoring(&["staging.*"]),
            &[(
                proxy("Prod"),
                &["https://staging.example.com", "https://a.example.com"],
            )],
        )
        .await;

        assert!(fake.monitor(staging).is_none());
        assert!(fake.monitor_by_url("https://staging.example.com").is_none());
        assert!(fake.monitor_by_url("https://a.example.com").is_some());
        assert_eq!(fake.mutations()[0], Mutation::DeleteMonitor(staging));
        assert_eq!(summary.removed, 1);
        assert_eq!(summary.ignored, 1);
        assert_eq!(summary.created, 1);
    }

    #[tokio::test]
    async fn prune_failure_is_counted_and_run_continues() {
        let fake = FakeKuma::default();
        fake.add_http_monitor("https://staging.example.com", &[]);
        fake.fail_next(Op::DeleteMonitor, ApiError::Transient("timeout".into()));

        let summary = run(
            &fake,
            ignoring(&["staging.*"]),
            &[(proxy("Prod"), &["https://a.example.com"])],
        )
        .await;

        assert_eq!(summary.removed, 0);
        assert_eq!(summary.failures, 1);
        assert_eq!(summary.created, 1);
    }

    #[tokio::test]
    async fn workload_monitors_are_matched_per_docker_host() {
        let fake = FakeKuma::default();
        let host = fake.add_docker_host("Docker 1-docker");
        let other = fake.add_docker_host("elsewhere");
        fake.add_docker_monitor("redis", host, &[]);
        fake.add_docker_monitor("nginx", other, &[]);

        let summary = run(
            &fake,
            Options::default(),
            &[(workload("Docker 1"), &["redis", "nginx"])],
        )
        .await;

        assert_eq!(summary.created, 1);
        let created = fake
            .monitors()
            .into_iter()
            .find(|monitor| monitor.name == "nginx" && monitor.docker_host == Some(host))
            .unwrap();
        assert_eq!(created.docker_container, "nginx");
        assert_eq!(fake.tag_names(created.id), names(&["Docker 1", "docker"]));
    }

    #[tokio::test]
    async fn workload_group_without_docker_host_is_skipped() {
        let fake = FakeKuma::default();

        let summary = run(&fake, Options::default(), &[(workload("Docker 1"), &["redis"])]).await;

        assert_eq!(summary.skipped_groups, 1);
        assert!(fake.monitors().is_empty());
        assert_eq!(fake.tag_count(), 0);
    }

    #[tokio::test]
    async fn later_groups_see_monitors_created_earlier() {
        let fake = FakeKuma::default();

        let summary = run(
            &fake,
            Options::default(),
            &[
                (proxy("Edge"), &["https://a.example.com"]),
                (proxy("Core"), &["https://a.example.com"]),
            ],
        )
        .await;

        assert_eq!(summary.created, 1);
        let monitor = fake.monitor_by_url("https://a.example.com").unwrap();
        assert_eq!(fake.tag_names(monitor.id), names(&["Core", "Edge", "traefik"]));
    }

    #[tokio::test]
    async fn failed_creation_is_skipped() {
        let fake = FakeKuma::default();
        fake.fail_next(Op::CreateMonitor, ApiError::Permanent("invalid URL".into()));

        let summary = run(
            &fake,
            Options::default(),
            &[(proxy("Prod"), &["https://a.example.com", "https://b.example.com"])],
        )
        .await;

        assert_eq!(summary.created, 1);
        assert_eq!(summary.failures, 1);
        assert!(fake.monitor_by_url("https://a.example.com").is_none());
        assert!(fake.monitor_by_url("https://b.example.com").is_some());
    }

    #[tokio::test]
    async fn fatal_error_stops_the_group() {
        let fake = FakeKuma::default();
        let mut session = Session::open(fake.clone(), credentials(), Duration::ZERO)
            .await
            .unwrap();
        let mut reconciler = Reconciler::new(Options::default());
        reconciler.load(&mut session).await.unwrap();
        fake.fail_next(Op::CreateMonitor, ApiError::AuthExpired("expired".into()));
        fake.fail_next(Op::CreateMonitor, ApiError::AuthExpired("expired".into()));

        let err = reconciler
            .reconcile_group(
                &mut session,
                &proxy("Prod"),
                set(&["https://a.example.com", "https://b.example.com"]),
            )
            .await
            .unwrap_err();

        assert!(err.is_fatal());
        assert!(fake.monitors().is_empty());
        assert!(
            !fake
                .mutations()
                .iter()
                .any(|mutation| matches!(mutation, Mutation::CreateMonitor(_)))
        );
    }
}
