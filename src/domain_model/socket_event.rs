use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const PING_EVENT: &str = "PING";
pub const PONG_EVENT: &str = "PONG";

fn empty_payload() -> Value {
    json!({})
}

/// A single JSON text frame exchanged over the push channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocketEvent {
    pub event: String,
    #[serde(default = "empty_payload")]
    pub payload: Value,
}

impl SocketEvent {
    pub fn new(event: impl Into<String>, payload: Value) -> Self {
        Self {
            event: event.into(),
            payload,
        }
    }

    pub fn pong() -> Self {
        Self::new(PONG_EVENT, empty_payload())
    }

    pub fn is_ping(&self) -> bool {
        self.event == PING_EVENT
    }
}
