//! JSON-RPC 2.0 client for the agorpc HTTP bridge.
//!
//! Every command is a `message` call whose `params.content` is the command
//! map; the bridge forwards it on the bus and copies the reply back.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{CommandClient, Request, Response};
use crate::error::AppError;
use crate::settings::DashboardSettings;

/// Extra time on top of the controller reply timeout before the HTTP request gives up.
const HTTP_MARGIN: Duration = Duration::from_secs(2);

pub struct JsonRpcClient {
    http: reqwest::Client,
    endpoint: String,
    reply_timeout: Duration,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(base_url: &str, reply_timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(reply_timeout + HTTP_MARGIN)
            .build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/jsonrpc", base_url.trim_end_matches('/')),
            reply_timeout,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn from_settings(settings: &DashboardSettings) -> Result<Self, AppError> {
        Self::new(&settings.rpc_url, settings.reply_timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn envelope(&self, request: &Request) -> Value {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "message",
            "params": {
                "content": request.content(),
                "subject": "",
                "replytimeout": self.reply_timeout.as_secs_f64(),
            }
        })
    }
}

#[async_trait]
impl CommandClient for JsonRpcClient {
    async fn send(&self, request: Request) -> Result<Response, AppError> {
        tracing::debug!(command = request.command(), target = ?request.target(), "jsonrpc request");
        let body = self.envelope(&request);
        let reply: Value = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let result = parse_reply(&reply);
        if let Err(e) = &result {
            tracing::debug!(command = request.command(), "jsonrpc error: {e}");
        }
        result
    }
}

/// Interpret a JSON-RPC reply: `{"result": {data, message}}` or `{"error": ...}`.
pub(crate) fn parse_reply(reply: &Value) -> Result<Response, AppError> {
    if let Some(error) = reply.get("error") {
        let message = match error {
            Value::String(s) => s.clone(),
            Value::Object(obj) => obj
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| obj.get("identifier").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| error.to_string()),
            other => other.to_string(),
        };
        return Err(AppError::RemoteError { message });
    }

    match reply.get("result") {
        Some(Value::Object(result)) => Ok(Response {
            data: result.get("data").cloned().unwrap_or(Value::Null),
            message: result.get("message").and_then(Value::as_str).map(str::to_string),
        }),
        Some(other) => Ok(Response::with_data(other.clone())),
        None => Err(AppError::ProtocolError {
            message: "reply has neither result nor error".into(),
        }),
    }
}
