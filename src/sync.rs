use crate::discovery::{Discover, SourceGroup};
use crate::error::ResultOkLogExt;
use crate::kuma::MonitorService;
use crate::reconcile::{self, Reconciler, Summary};
use crate::session::{self, Session};

/// Runs one full sync: prune ignored monitors, then reconcile every group in
/// the given order.
///
/// A source that cannot be queried contributes nothing; only fatal session
/// errors abort the run.
pub async fn sync<S, D>(
    session: &mut Session<S>,
    discoverer: &D,
    groups: &[SourceGroup],
    options: reconcile::Options,
) -> session::Result<Summary>
where
    S: MonitorService,
    D: Discover,
{
    let mut reconciler = Reconciler::new(options);
    reconciler.load(session).await?;
    reconciler.prune(session).await?;

    for group in groups {
        log::info!("Processing {} source '{}' at {}", group.kind, group.label, group.endpoint);
        let desired = discoverer.discover(group).await.ok_log().unwrap_or_default();
        if desired.is_empty() {
            log::warn!("No endpoints found for group '{}'", group.label);
            continue;
        }
        log::info!("Found {} endpoints for group '{}'", desired.len(), group.label);
        reconciler.reconcile_group(session, group, desired).await?;
    }

    let summary = reconciler.summary();
    log::info!("Sync complete! Created {} new monitors.", summary.created);
    log::info!("Summary: {summary}");
    Ok(summary)
}
