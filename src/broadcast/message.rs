//! Broadcast event envelope.

use serde::{Deserialize, Serialize};

use crate::control::state::{RequestLog, StatusSnapshot};

/// An event pushed verbatim to every observer.
///
/// Wire form: `{"type":"status_update","data":{..}}`,
/// `{"type":"new_request","data":{..}}`, `{"type":"server_error","error":".."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BroadcastMessage {
    StatusUpdate { data: StatusSnapshot },
    NewRequest { data: RequestLog },
    ServerError { error: String },
}

impl BroadcastMessage {
    pub fn status(data: StatusSnapshot) -> Self {
        BroadcastMessage::StatusUpdate { data }
    }

    pub fn new_request(data: RequestLog) -> Self {
        BroadcastMessage::NewRequest { data }
    }

    pub fn server_error(error: impl Into<String>) -> Self {
        BroadcastMessage::ServerError { error: error.into() }
    }

    /// Short label used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            BroadcastMessage::StatusUpdate { .. } => "status_update",
            BroadcastMessage::NewRequest { .. } => "new_request",
            BroadcastMessage::ServerError { .. } => "server_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn server_error_envelope() {
        let json = serde_json::to_value(BroadcastMessage::server_error("bind failed")).unwrap();
        assert_eq!(json["type"], "server_error");
        assert_eq!(json["error"], "bind failed");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn new_request_envelope() {
        let entry = RequestLog {
            id: 7,
            path: "/api/echo".into(),
            method: "POST".into(),
            headers: Default::default(),
            body: "{\"a\":1}".into(),
            timestamp: chrono::Utc::now(),
        };
        let json: Value = serde_json::to_value(BroadcastMessage::new_request(entry)).unwrap();
        assert_eq!(json["type"], "new_request");
        assert_eq!(json["data"]["id"], 7);
        assert_eq!(json["data"]["body"], "{\"a\":1}");
    }
}
