use std::future::Future;
use std::pin::Pin;

use super::Result;
use super::models::{DockerHost, Monitor, MonitorId, MonitorSpec, Tag, TagId};

/// Boxed future returned by [`MonitorService`] operations.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Login credentials for the monitoring service.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A stateful connection to the monitoring service.
///
/// Every operation may fail with [`ApiError::AuthExpired`]; recovering from
/// that is the job of [`crate::session::Session`], not of implementors.
///
/// [`ApiError::AuthExpired`]: super::ApiError::AuthExpired
pub trait MonitorService: Send {
    fn connect(&mut self) -> ApiFuture<'_, ()>;

    fn login(&mut self, credentials: Credentials) -> ApiFuture<'_, ()>;

    fn disconnect(&mut self) -> ApiFuture<'_, ()>;

    fn list_monitors(&mut self) -> ApiFuture<'_, Vec<Monitor>>;

    fn create_monitor(&mut self, spec: MonitorSpec) -> ApiFuture<'_, MonitorId>;

    fn delete_monitor(&mut self, id: MonitorId) -> ApiFuture<'_, ()>;

    fn list_tags(&mut self) -> ApiFuture<'_, Vec<Tag>>;

    fn create_tag(&mut self, name: String, color: String) -> ApiFuture<'_, TagId>;

    fn add_monitor_tag(
        &mut self,
        monitor: MonitorId,
        tag: TagId,
        value: String,
    ) -> ApiFuture<'_, ()>;

    fn remove_monitor_tag(
        &mut self,
        monitor: MonitorId,
        tag: TagId,
        value: String,
    ) -> ApiFuture<'_, ()>;

    fn list_docker_hosts(&mut self) -> ApiFuture<'_, Vec<DockerHost>>;
}
