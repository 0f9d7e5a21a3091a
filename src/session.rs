//! Authenticated session handling on top of a [`MonitorService`].

use std::time::Duration;

use crate::kuma::{
    ApiFuture, Credentials, DockerHost, Monitor, MonitorId, MonitorService, MonitorSpec, Tag,
    TagId,
};

mod error;

pub use error::{Error, Result};

/// How often a single operation may be retried after re-authenticating.
pub const DEFAULT_AUTH_RETRIES: u32 = 1;

/// An authenticated connection to the monitoring service.
///
/// All operations go through [`Session::call_with_budget`], which
/// re-authenticates and retries when the server reports an expired session.
#[derive(Debug)]
pub struct Session<S> {
    service: S,
    credentials: Credentials,
    reauth_backoff: Duration,
    auth_retries: u32,
    reauthentications: u32,
}

impl<S: MonitorService> Session<S> {
    /// Connects and logs in.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Login`] if either step fails; the connection is torn
    /// down before returning.
    pub async fn open(
        mut service: S,
        credentials: Credentials,
        reauth_backoff: Duration,
    ) -> Result<Self> {
        if let Err(err) = service.connect().await {
            return Err(Error::Login(err));
        }
        if let Err(err) = service.login(credentials.clone()).await {
            if let Err(err) = service.disconnect().await {
                log::debug!("Disconnect after failed login had issues: {err}");
            }
            return Err(Error::Login(err));
        }
        log::info!("Authentication successful!");

        Ok(Self {
            service,
            credentials,
            reauth_backoff,
            auth_retries: DEFAULT_AUTH_RETRIES,
            reauthentications: 0,
        })
    }

    /// Number of successful re-authentications so far.
    pub fn reauthentications(&self) -> u32 {
        self.reauthentications
    }

    /// Best-effort disconnect. Errors are logged and swallowed.
    pub async fn close(mut self) {
        if let Err(err) = self.service.disconnect().await {
            log::debug!("Disconnect had issues: {err}");
        }
    }

    async fn reauthenticate(&mut self) -> Result<()> {
        log::warn!("Session expired, attempting to re-authenticate...");
        if let Err(err) = self.service.disconnect().await {
            log::info!("Disconnect had issues (may be expected): {err}");
        }
        tokio::time::sleep(self.reauth_backoff).await;

        if let Err(err) = self.service.connect().await {
            log::error!("Re-authentication failed while reconnecting: {err}");
            return Err(Error::Reauthentication(err));
        }
        if let Err(err) = self.service.login(self.credentials.clone()).await {
            log::error!(
                "Re-authentication failed while logging in as {}: {err}",
                self.credentials.username
            );
            return Err(Error::Reauthentication(err));
        }

        self.reauthentications += 1;
        log::info!("Re-authenticated successfully");
        Ok(())
    }

    /// Runs `op` against the service, re-authenticating up to `budget` times
    /// when it fails with an expired session.
    ///
    /// # Errors
    ///
    /// * [`Error::Call`] for any other failure of `op`; callers may skip the
    ///   affected item and continue.
    /// * [`Error::AuthRetriesExhausted`] when the session expires again after
    ///   the budget is used up.
    /// * [`Error::Reauthentication`] when logging in again fails.
    pub async fn call_with_budget<T, F>(
        &mut self,
        operation: &'static str,
        budget: u32,
        mut op: F,
    ) -> Result<T>
    where
        F: for<'c> FnMut(&'c mut S) -> ApiFuture<'c, T>,
    {
        let mut retries = 0;
        loop {
            let outcome = op(&mut self.service).await;
            match outcome {
                Ok(value) => return Ok(value),
                Err(err) if err.is_auth_expired() => {
                    if retries >= budget {
                        log::error!(
                            "`{operation}` failed after re-authentication: {err}. \
                             Wait 30-60 seconds and run the sync again; it skips monitors already processed."
                        );
                        return Err(Error::AuthRetriesExhausted {
                            operation,
                            attempts: retries,
                        });
                    }
                    retries += 1;
                    self.reauthenticate().await?;
                }
                Err(source) => return Err(Error::Call { operation, source }),
            }
        }
    }

    /// [`Session::call_with_budget`] with the session's default budget.
    pub async fn call<T, F>(&mut self, operation: &'static str, op: F) -> Result<T>
    where
        F: for<'c> FnMut(&'c mut S) -> ApiFuture<'c, T>,
    {
        let budget = self.auth_retries;
        self.call_with_budget(operation, budget, op).await
    }

    pub async fn list_monitors(&mut self) -> Result<Vec<Monitor>> {
        self.call("listMonitors", |service| service.list_monitors())
            .await
    }

    pub async fn create_monitor(&mut self, spec: MonitorSpec) -> Result<MonitorId> {
        self.call("createMonitor", move |service| {
            service.create_monitor(spec.clone())
        })
        .await
    }

    pub async fn delete_monitor(&mut self, id: MonitorId) -> Result<()> {
        self.call("deleteMonitor", move |service| service.delete_monitor(id))
            .await
    }

    pub async fn list_tags(&mut self) -> Result<Vec<Tag>> {
        self.call("listTags", |service| service.list_tags()).await
    }

    pub async fn create_tag(&mut self, name: &str, color: &str) -> Result<TagId> {
        let (name, color) = (name.to_owned(), color.to_owned());
        self.call("createTag", move |service| {
            service.create_tag(name.clone(), color.clone())
        })
        .await
    }

    pub async fn add_monitor_tag(&mut self, monitor: MonitorId, tag: TagId) -> Result<()> {
        self.call("addMonitorTag", move |service| {
            service.add_monitor_tag(monitor, tag, String::new())
        })
        .await
    }

    pub async fn remove_monitor_tag(
        &mut self,
        monitor: MonitorId,
        tag: TagId,
        value: &str,
    ) -> Result<()> {
        let value = value.to_owned();
        self.call("removeMonitorTag", move |service| {
            service.remove_monitor_tag(monitor, tag, value.clone())
        })
        .await
    }

    pub async fn list_docker_hosts(&mut self) -> Result<Vec<DockerHost>> {
        self.call("listDockerHosts", |service| service.list_docker_hosts())
            .await
    }
}
