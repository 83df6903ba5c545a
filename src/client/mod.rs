//! The command client seam: every panel talks to the controller through
//! [`CommandClient::send`], one request and one reply at a time.

pub mod jsonrpc;
pub mod memory;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::model::{DeviceId, Inventory};

/// A command message: `{uuid, command, ...fields}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Request {
    content: Map<String, Value>,
}

impl Request {
    /// A command not addressed to a particular device (e.g. `inventory`).
    pub fn new(command: &str) -> Self {
        let mut content = Map::new();
        content.insert("command".into(), Value::String(command.to_string()));
        Self { content }
    }

    /// A command addressed to a device.
    pub fn to(target: &DeviceId, command: &str) -> Self {
        let mut content = Map::new();
        content.insert("uuid".into(), Value::String(target.0.clone()));
        content.insert("command".into(), Value::String(command.to_string()));
        Self { content }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.content.insert(key.to_string(), value.into());
        self
    }

    pub fn command(&self) -> &str {
        self.str_field("command").unwrap_or_default()
    }

    pub fn target(&self) -> Option<&str> {
        self.str_field("uuid")
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.content.get(key)
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.content.get(key).and_then(Value::as_str)
    }

    pub fn content(&self) -> &Map<String, Value> {
        &self.content
    }
}

/// A successful reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    pub data: Value,
    pub message: Option<String>,
}

impl Response {
    pub fn with_data(data: Value) -> Self {
        Self {
            data,
            message: None,
        }
    }

    /// A field of `data` the caller cannot proceed without.
    pub fn require(&self, key: &str) -> Result<&Value, AppError> {
        self.data.get(key).ok_or_else(|| AppError::ProtocolError {
            message: format!("reply is missing `{key}`"),
        })
    }
}

/// Sends one command and resolves with the controller's reply, or rejects
/// with a transport or remote error.
#[async_trait]
pub trait CommandClient: Send + Sync {
    async fn send(&self, request: Request) -> Result<Response, AppError>;
}

/// Fetch and parse the full inventory.
pub async fn fetch_inventory(client: &dyn CommandClient) -> Result<Inventory, AppError> {
    let reply = client.send(Request::new("inventory")).await?;
    Inventory::from_value(&reply.data)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn request_shape() {
        let req = Request::to(&DeviceId::from("ctl"), "getscenario").with("scenario", "s1");
        assert_eq!(req.command(), "getscenario");
        assert_eq!(req.target(), Some("ctl"));
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            serde_json::json!({ "uuid": "ctl", "command": "getscenario", "scenario": "s1" })
        );
        assert_eq!(Request::new("inventory").target(), None);
    }

    #[test]
    fn require_reports_missing_field() {
        let reply = Response::with_data(serde_json::json!({ "scenario": "s1" }));
        assert_eq!(reply.require("scenario").unwrap(), "s1");
        assert!(matches!(reply.require("scenariomap"), Err(AppError::ProtocolError { .. })));
    }
}
