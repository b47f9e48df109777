//! Shared mutable server state and the wire types derived from it.
//!
//! # Responsibilities
//! - Hold address, lifecycle, endpoints and the bounded request log
//! - Produce serializable snapshots for status queries and broadcasts
//! - Enforce the request log capacity (strict FIFO eviction)
//!
//! # Design Decisions
//! - One `RwLock<ServerState>` guards everything; readers share, writers are exclusive
//! - Snapshots are plain owned values so the lock is never held across a publish
//! - Request ids come from a monotonic counter, never from the log length

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use tokio::sync::oneshot;

use crate::lifecycle::shutdown::Shutdown;

/// Maximum number of request log entries retained in memory.
pub const REQUEST_LOG_CAPACITY: usize = 100;

/// A named mock endpoint definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Absolute route template (e.g. `/api/test1`, `/users/:id`).
    pub path: String,

    /// Response file name inside the project's `json_files/`; empty for the default acknowledgement.
    #[serde(default)]
    pub response_file: String,

    /// Inactive endpoints are never registered on the listener.
    #[serde(default = "default_active", rename = "is_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl EndpointConfig {
    /// Create an active endpoint with no response file.
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            response_file: String::new(),
            active: true,
        }
    }

    pub fn with_response_file(mut self, file: impl Into<String>) -> Self {
        self.response_file = file.into();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// A saved outbound request template shown by front ends.
///
/// The core never interprets these; they are persisted with the project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SendBlock {
    pub name: String,
    pub url: String,
    pub send_file: String,
    pub method: String,
    pub headers: String,
}

/// Host and port the embedded mock listener binds to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerAddress {
    pub ip: String,
    #[serde(deserialize_with = "port_from_number_or_string")]
    pub port: u16,
}

impl ServerAddress {
    pub fn new(ip: impl Into<String>, port: u16) -> Self {
        Self { ip: ip.into(), port }
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ip.contains(':') {
            write!(f, "[{}]:{}", self.ip, self.port)
        } else {
            write!(f, "{}:{}", self.ip, self.port)
        }
    }
}

/// Older config files store the port as a string.
pub(crate) fn port_from_number_or_string<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Port::deserialize(deserializer)? {
        Port::Number(n) => Ok(n),
        Port::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Listener lifecycle.
///
/// ```text
/// Stopped → Starting        (start accepted)
/// Starting → Running        (bind succeeded)
/// Starting|Running → Stopped (stop, or bind/serve failure rollback)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Stopped,
    Starting,
    Running,
}

impl Lifecycle {
    /// `Starting` counts as running so that concurrent starts fail fast.
    pub fn is_running(self) -> bool {
        !matches!(self, Lifecycle::Stopped)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Lifecycle::Stopped => "stopped",
            Lifecycle::Starting => "starting",
            Lifecycle::Running => "running",
        }
    }
}

/// One captured inbound request. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestLog {
    pub id: u64,
    pub path: String,
    pub method: String,
    pub headers: BTreeMap<String, Vec<String>>,
    pub body: String,
    pub timestamp: DateTime<Utc>,
}

/// Request data captured by a mock handler before an id is assigned.
#[derive(Debug, Clone, Default)]
pub struct CapturedRequest {
    pub path: String,
    pub method: String,
    pub headers: BTreeMap<String, Vec<String>>,
    pub body: String,
}

/// Read-only view of [`ServerState`] returned by status queries and broadcasts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub ip: String,
    pub port: u16,
    pub is_running: bool,
    pub lifecycle: Lifecycle,
    pub endpoints: Vec<EndpointConfig>,
    pub request_logs: Vec<RequestLog>,
    pub current_project: String,
    pub send_blocks: Vec<SendBlock>,
}

/// Handle to the listener task spawned by the most recent start.
#[derive(Debug)]
pub(crate) struct ListenerHandle {
    pub(crate) epoch: u64,
    pub(crate) shutdown: Shutdown,
    /// Resolves once the listener task has returned and its socket is closed.
    pub(crate) released: oneshot::Receiver<()>,
}

/// The single piece of mutable shared state owned by the control plane.
#[derive(Debug)]
pub struct ServerState {
    pub(crate) address: ServerAddress,
    pub(crate) lifecycle: Lifecycle,
    pub(crate) endpoints: Vec<EndpointConfig>,
    pub(crate) request_log: VecDeque<RequestLog>,
    pub(crate) current_project: String,
    pub(crate) send_blocks: Vec<SendBlock>,
    pub(crate) next_request_id: u64,
    pub(crate) epoch: u64,
    pub(crate) listener: Option<ListenerHandle>,
    /// Release signal of the last stopped listener; the next start binds after it.
    pub(crate) previous_release: Option<oneshot::Receiver<()>>,
}

impl ServerState {
    pub fn new(address: ServerAddress, endpoints: Vec<EndpointConfig>, project: impl Into<String>) -> Self {
        Self {
            address,
            lifecycle: Lifecycle::Stopped,
            endpoints,
            request_log: VecDeque::with_capacity(REQUEST_LOG_CAPACITY + 1),
            current_project: project.into(),
            send_blocks: Vec::new(),
            next_request_id: 1,
            epoch: 0,
            listener: None,
            previous_release: None,
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle.is_running()
    }

    pub fn current_project(&self) -> &str {
        &self.current_project
    }

    pub fn request_log(&self) -> impl ExactSizeIterator<Item = &RequestLog> {
        self.request_log.iter()
    }

    /// Append a captured request, evicting the oldest entry past capacity.
    ///
    /// Returns the stored entry and whether an eviction happened.
    pub(crate) fn push_request(&mut self, captured: CapturedRequest) -> (RequestLog, bool) {
        let entry = RequestLog {
            id: self.next_request_id,
            path: captured.path,
            method: captured.method,
            headers: captured.headers,
            body: captured.body,
            timestamp: Utc::now(),
        };
        self.next_request_id += 1;
        self.request_log.push_back(entry.clone());

        let evicted = if self.request_log.len() > REQUEST_LOG_CAPACITY {
            self.request_log.pop_front();
            true
        } else {
            false
        };

        (entry, evicted)
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            ip: self.address.ip.clone(),
            port: self.address.port,
            is_running: self.lifecycle.is_running(),
            lifecycle: self.lifecycle,
            endpoints: self.endpoints.clone(),
            request_logs: self.request_log.iter().cloned().collect(),
            current_project: self.current_project.clone(),
            send_blocks: self.send_blocks.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captured(n: usize) -> CapturedRequest {
        CapturedRequest {
            path: "/api/test".into(),
            method: "GET".into(),
            headers: BTreeMap::new(),
            body: format!("req-{n}"),
        }
    }

    fn fresh() -> ServerState {
        ServerState::new(ServerAddress::new("127.0.0.1", 0), Vec::new(), "default")
    }

    #[test]
    fn log_is_capped_and_keeps_most_recent() {
        let mut state = fresh();
        for n in 1..=105 {
            state.push_request(captured(n));
        }

        assert_eq!(state.request_log.len(), REQUEST_LOG_CAPACITY);
        let first = state.request_log.front().unwrap();
        assert_eq!(first.body, "req-6");
        assert_eq!(first.id, 6);
        assert_eq!(state.request_log.back().unwrap().id, 105);
    }

    #[test]
    fn oldest_id_increases_with_each_eviction() {
        let mut state = fresh();
        for n in 1..=REQUEST_LOG_CAPACITY {
            let (_, evicted) = state.push_request(captured(n));
            assert!(!evicted);
        }

        let mut last_oldest = state.request_log.front().unwrap().id;
        for n in 0..250 {
            let (_, evicted) = state.push_request(captured(n));
            assert!(evicted);
            let oldest = state.request_log.front().unwrap().id;
            assert!(oldest > last_oldest);
            last_oldest = oldest;
        }
    }

    #[test]
    fn lifecycle_running_flag() {
        assert!(!Lifecycle::Stopped.is_running());
        assert!(Lifecycle::Starting.is_running());
        assert!(Lifecycle::Running.is_running());
    }

    #[test]
    fn port_accepts_string_and_number() {
        let a: ServerAddress = serde_json::from_str(r#"{"ip":"127.0.0.1","port":"29800"}"#).unwrap();
        let b: ServerAddress = serde_json::from_str(r#"{"ip":"127.0.0.1","port":29800}"#).unwrap();
        assert_eq!(a, b);
        assert!(serde_json::from_str::<ServerAddress>(r#"{"ip":"x","port":"abc"}"#).is_err());
    }

    #[test]
    fn endpoint_wire_names() {
        let ep: EndpointConfig =
            serde_json::from_str(r#"{"path":"/a","response_file":"x.json","is_active":false}"#).unwrap();
        assert_eq!(ep.path, "/a");
        assert_eq!(ep.response_file, "x.json");
        assert!(!ep.active);
        assert!(ep.name.is_empty());

        let ep: EndpointConfig = serde_json::from_str(r#"{"path":"/b"}"#).unwrap();
        assert!(ep.active);
    }

    #[test]
    fn display_brackets_ipv6() {
        assert_eq!(ServerAddress::new("::1", 80).to_string(), "[::1]:80");
        assert_eq!(ServerAddress::new("0.0.0.0", 80).to_string(), "0.0.0.0:80");
    }
}
