//! Access to the Uptime Kuma monitoring service.
//!
//! Uptime Kuma has no REST API for monitor management; everything goes
//! through its Socket.IO interface. [`KumaClient`] speaks that protocol over
//! Engine.IO long-polling and implements [`MonitorService`], the seam the rest
//! of the crate is written against.

mod client;
mod engineio;
mod error;
mod models;
mod service;
mod socketio;
mod transport;

pub use client::KumaClient;
pub use error::{ApiError, Result};
pub use models::{
    DockerHost, DockerHostId, HttpCheck, Monitor, MonitorId, MonitorSpec, MonitorType, Tag, TagId,
    TagRef,
};
pub use service::{ApiFuture, Credentials, MonitorService};
