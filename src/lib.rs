//! Kuma Sync: keeps Uptime Kuma monitors in line with Traefik routes and
//! Docker containers.
//!
//! Every `https` route of each configured Traefik instance becomes an HTTP
//! monitor and every running container of each configured Docker engine a
//! Docker monitor. Monitors are tagged with their group and source kind.
//! Existing monitors are matched by URL or by container and Docker host, so
//! running the sync repeatedly is safe.
pub mod config;
pub mod discovery;
pub mod error;
pub mod kuma;
pub mod reconcile;
pub mod session;
pub mod sync;

#[cfg(test)]
mod testing;

use discovery::HttpDiscoverer;
use kuma::KumaClient;
use reconcile::Summary;
use session::Session;

/// Runs one sync against the configured Uptime Kuma instance.
///
/// # Errors
///
/// Fails on configuration errors, when logging in fails and on fatal session
/// errors during the sync. Per-item failures are logged and counted in the
/// returned [`Summary`] instead.
pub async fn run(args: config::Args) -> error::Result<Summary> {
    let config = config::Config::load(&args)?;
    config.log_summary();
    let credentials = config.credentials()?;

    let discoverer = HttpDiscoverer::new()?;
    let client = KumaClient::new(config.uptime_url.clone(), config.ack_timeout)?;
    let mut session = Session::open(client, credentials, config.reauth_backoff).await?;

    let result = sync::sync(
        &mut session,
        &discoverer,
        &config.groups,
        config.reconcile_options(),
    )
    .await;
    session.close().await;

    Ok(result?)
}
