use std::collections::HashMap;
use std::time::Duration;

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::engineio;
use super::error::{ApiError, Result};
use super::models::{DockerHost, Monitor, MonitorId, MonitorSpec, Tag, TagId};
use super::service::{ApiFuture, Credentials, MonitorService};
use super::socketio;
use super::transport::PollingTransport;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Uptime Kuma client speaking Socket.IO over HTTP long-polling.
#[derive(Debug)]
pub struct KumaClient {
    http: reqwest::Client,
    base: Url,
    ack_timeout: Duration,
    transport: Option<PollingTransport>,
    next_ack: u64,
    monitor_list: Option<Vec<Monitor>>,
    docker_hosts: Option<Vec<DockerHost>>,
}

impl KumaClient {
    /// Creates a disconnected client for the Uptime Kuma instance at `base`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Permanent`] if the HTTP client cannot be built.
    pub fn new(base: Url, ack_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|err| ApiError::Permanent(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            base,
            ack_timeout,
            transport: None,
            next_ack: 0,
            monitor_list: None,
            docker_hosts: None,
        })
    }

    fn transport(&self) -> Result<&PollingTransport> {
        self.transport
            .as_ref()
            .ok_or_else(|| ApiError::AuthExpired("not connected".to_owned()))
    }

    async fn send(&self, packet: socketio::Packet) -> Result<()> {
        self.transport()?
            .send(&[engineio::Packet::Message(packet.encode())])
            .await
    }

    /// Polls once, answering pings and caching pushed state.
    async fn next_packets(&mut self) -> Result<Vec<socketio::Packet>> {
        let packets = self.transport()?.poll().await?;
        let mut out = Vec::with_capacity(packets.len());
        for packet in packets {
            match packet {
                engineio::Packet::Ping => {
                    self.transport()?.send(&[engineio::Packet::Pong]).await?;
                }
                engineio::Packet::Close => {
                    self.transport = None;
                    return Err(ApiError::AuthExpired(
                        "server closed the session".to_owned(),
                    ));
                }
                engineio::Packet::Message(raw) => {
                    let packet = socketio::Packet::decode(&raw)
                        .map_err(|err| ApiError::Transient(err.to_string()))?;
                    match packet {
                        socketio::Packet::Disconnect => {
                            self.transport = None;
                            return Err(ApiError::AuthExpired(
                                "server disconnected the socket".to_owned(),
                            ));
                        }
                        socketio::Packet::Event { id: None, data } => self.cache_pushed(data),
                        other => out.push(other),
                    }
                }
                _ => {}
            }
        }
        Ok(out)
    }

    fn cache_pushed(&mut self, data: Vec<Value>) {
        let mut data = data.into_iter();
        let Some(Value::String(event)) = data.next() else {
            return;
        };
        let payload = data.next().unwrap_or(Value::Null);
        match event.as_str() {
            "monitorList" => match serde_json::from_value::<HashMap<String, Monitor>>(payload) {
                Ok(monitors) => {
                    let mut monitors: Vec<Monitor> = monitors.into_values().collect();
                    monitors.sort_by_key(|monitor| monitor.id);
                    log::debug!("Received monitor list with {} entries", monitors.len());
                    self.monitor_list = Some(monitors);
                }
                Err(err) => log::warn!("Ignoring malformed monitor list: {err}"),
            },
            "dockerHostList" => match serde_json::from_value::<Vec<DockerHost>>(payload) {
                Ok(hosts) => {
                    log::debug!("Received docker host list with {} entries", hosts.len());
                    self.docker_hosts = Some(hosts);
                }
                Err(err) => log::warn!("Ignoring malformed docker host list: {err}"),
            },
            other => log::trace!("Ignoring pushed event `{other}`"),
        }
    }

    async fn wait_for_ack(&mut self, id: u64) -> Result<Vec<Value>> {
        loop {
            for packet in self.next_packets().await? {
                if let socketio::Packet::Ack { id: got, data } = packet {
                    if got == id {
                        return Ok(data);
                    }
                    log::debug!("Dropping stale acknowledgement {got}");
                }
            }
        }
    }

    async fn wait_for_connect(&mut self) -> Result<()> {
        loop {
            for packet in self.next_packets().await? {
                match packet {
                    socketio::Packet::Connect(_) => return Ok(()),
                    socketio::Packet::ConnectError(data) => {
                        return Err(ApiError::Permanent(format!(
                            "socket.io connection refused: {data}"
                        )));
                    }
                    _ => {}
                }
            }
        }
    }

    async fn wait_for_docker_hosts(&mut self) -> Result<Vec<DockerHost>> {
        loop {
            if let Some(hosts) = &self.docker_hosts {
                return Ok(hosts.clone());
            }
            self.next_packets().await?;
        }
    }

    async fn wait_for_monitor_list(&mut self) -> Result<Vec<Monitor>> {
        loop {
            if let Some(monitors) = &self.monitor_list {
                return Ok(monitors.clone());
            }
            self.next_packets().await?;
        }
    }

    /// Emits `event` and returns the positive acknowledgement object.
    async fn emit(&mut self, event: &str, args: Vec<Value>) -> Result<Value> {
        let id = self.next_ack;
        self.next_ack += 1;
        log::debug!("Emitting `{event}` (ack {id})");
        self.send(socketio::Packet::event(id, event, args)).await?;

        let data = tokio::time::timeout(self.ack_timeout, self.wait_for_ack(id))
            .await
            .map_err(|_| {
                ApiError::Transient(format!("timed out waiting for `{event}` acknowledgement"))
            })??;
        into_response(data)
    }
}

fn into_response(data: Vec<Value>) -> Result<Value> {
    let response = data.into_iter().next().unwrap_or(Value::Null);
    if response.get("ok").and_then(Value::as_bool) == Some(true) {
        return Ok(response);
    }
    if response.get("tokenRequired").and_then(Value::as_bool) == Some(true) {
        return Err(ApiError::Permanent(
            "two-factor authentication token required".to_owned(),
        ));
    }
    let msg = response
        .get("msg")
        .and_then(Value::as_str)
        .unwrap_or("request rejected without message");
    Err(ApiError::from_rejection(msg))
}

fn field<T: DeserializeOwned>(response: &Value, name: &str) -> Result<T> {
    let value = response.get(name).cloned().unwrap_or(Value::Null);
    serde_json::from_value(value)
        .map_err(|err| ApiError::Transient(format!("malformed `{name}` in response: {err}")))
}

/// Builds the `add` payload for a monitor.
fn monitor_payload(spec: &MonitorSpec) -> Value {
    match spec {
        MonitorSpec::Http { name, url, check } => json!({
            "type": "http",
            "name": name,
            "url": url,
            "method": check.method,
            "interval": check.interval,
            "retryInterval": check.retry_interval,
            "resendInterval": 0,
            "maxretries": check.max_retries,
            "accepted_statuscodes": check.accepted_status_codes,
            "maxredirects": check.max_redirects,
            "timeout": check.timeout,
            "ignoreTls": false,
            "upsideDown": false,
            "expiryNotification": false,
            "notificationIDList": {},
            "kafkaProducerBrokers": [],
            "kafkaProducerSaslOptions": {},
            "conditions": [],
        }),
        MonitorSpec::Docker {
            name,
            container,
            docker_host,
        } => json!({
            "type": "docker",
            "name": name,
            "docker_container": container,
            "docker_host": docker_host,
            "interval": 60,
            "retryInterval": 60,
            "resendInterval": 0,
            "maxretries": 0,
            "accepted_statuscodes": ["200-299"],
            "upsideDown": false,
            "notificationIDList": {},
            "kafkaProducerBrokers": [],
            "kafkaProducerSaslOptions": {},
            "conditions": [],
        }),
    }
}

impl MonitorService for KumaClient {
    fn connect(&mut self) -> ApiFuture<'_, ()> {
        Box::pin(async move {
            log::info!("Connecting to Uptime Kuma at {}...", self.base);
            let transport = PollingTransport::open(self.http.clone(), &self.base).await?;
            self.transport = Some(transport);
            self.next_ack = 0;
            self.monitor_list = None;
            self.docker_hosts = None;

            self.send(socketio::Packet::Connect(None)).await?;
            tokio::time::timeout(self.ack_timeout, self.wait_for_connect())
                .await
                .map_err(|_| ApiError::Transient("timed out joining socket.io namespace".into()))?
        })
    }

    fn login(&mut self, credentials: Credentials) -> ApiFuture<'_, ()> {
        Box::pin(async move {
            log::info!("Authenticating as {}...", credentials.username);
            self.emit(
                "login",
                vec![json!({
                    "username": credentials.username,
                    "password": credentials.password,
                    "token": "",
                })],
            )
            .await?;
            Ok(())
        })
    }

    fn disconnect(&mut self) -> ApiFuture<'_, ()> {
        Box::pin(async move {
            self.monitor_list = None;
            self.docker_hosts = None;
            let Some(transport) = self.transport.take() else {
                return Ok(());
            };
            log::debug!("Closing engine.io session {}", transport.sid());
            transport
                .send(&[
                    engineio::Packet::Message(socketio::Packet::Disconnect.encode()),
                    engineio::Packet::Close,
                ])
                .await
        })
    }

    fn list_monitors(&mut self) -> ApiFuture<'_, Vec<Monitor>> {
        Box::pin(async move {
            self.monitor_list = None;
            self.emit("getMonitorList", Vec::new()).await?;
            tokio::time::timeout(self.ack_timeout, self.wait_for_monitor_list())
                .await
                .map_err(|_| ApiError::Transient("monitor list was not delivered".into()))?
        })
    }

    fn create_monitor(&mut self, spec: MonitorSpec) -> ApiFuture<'_, MonitorId> {
        Box::pin(async move {
            let response = self.emit("add", vec![monitor_payload(&spec)]).await?;
            field(&response, "monitorID")
        })
    }

    fn delete_monitor(&mut self, id: MonitorId) -> ApiFuture<'_, ()> {
        Box::pin(async move {
            self.emit("deleteMonitor", vec![json!(id)]).await?;
            Ok(())
        })
    }

    fn list_tags(&mut self) -> ApiFuture<'_, Vec<Tag>> {
        Box::pin(async move {
            let response = self.emit("getTags", Vec::new()).await?;
            field(&response, "tags")
        })
    }

    fn create_tag(&mut self, name: String, color: String) -> ApiFuture<'_, TagId> {
        Box::pin(async move {
            let response = self
                .emit(
                    "addTag",
                    vec![json!({"name": name, "color": color, "new": true})],
                )
                .await?;
            let tag: Tag = field(&response, "tag")?;
            Ok(tag.id)
        })
    }

    fn add_monitor_tag(
        &mut self,
        monitor: MonitorId,
        tag: TagId,
        value: String,
    ) -> ApiFuture<'_, ()> {
        Box::pin(async move {
            self.emit("addMonitorTag", vec![json!(tag), json!(monitor), json!(value)])
                .await?;
            Ok(())
        })
    }

    fn remove_monitor_tag(
        &mut self,
        monitor: MonitorId,
        tag: TagId,
        value: String,
    ) -> ApiFuture<'_, ()> {
        Box::pin(async move {
            self.emit(
                "deleteMonitorTag",
                vec![json!(tag), json!(monitor), json!(value)],
            )
            .await?;
            Ok(())
        })
    }

    fn list_docker_hosts(&mut self) -> ApiFuture<'_, Vec<DockerHost>> {
        Box::pin(async move {
            if let Some(hosts) = &self.docker_hosts {
                return Ok(hosts.clone());
            }
            tokio::time::timeout(self.ack_timeout, self.wait_for_docker_hosts())
                .await
                .map_err(|_| ApiError::Transient("docker host list was not delivered".into()))?
        })
    }
}
