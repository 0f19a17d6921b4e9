//! Messages posted to the worker by controlled pages.

use serde_json::Value;

const SKIP_WAITING: &[&str] = &["skipWaiting", "SKIP_WAITING"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerMessage {
    SkipWaiting,
    /// Anything else; ignored by the worker.
    Unknown(String),
}

impl WorkerMessage {
    /// Interpret a posted payload.
    ///
    /// Accepts the bare string `"skipWaiting"` or an object whose `type` or
    /// `action` field carries it.
    pub fn parse(payload: &Value) -> Self {
        let tag = match payload {
            Value::String(s) => Some(s.as_str()),
            Value::Object(map) => ["type", "action"]
                .iter()
                .find_map(|field| map.get(*field).and_then(Value::as_str)),
            _ => None,
        };

        match tag {
            Some(tag) if SKIP_WAITING.contains(&tag) => WorkerMessage::SkipWaiting,
            _ => WorkerMessage::Unknown(payload.to_string()),
        }
    }
}
