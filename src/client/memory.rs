//! In-process stand-in for the controller side: the resolver's inventory,
//! name and variable commands plus the scenario controller's scenario store.
//! Backs the offline CLI and the panel tests, which use its request log,
//! one-shot failure injection and reply holds.

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::Notify;

use super::{CommandClient, Request, Response};
use crate::error::AppError;
use crate::model::{devicetype, Device, DeviceId, Inventory, ScenarioMap, Step};

/// What a scenario run sent out, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    Command(Step),
    Sleep(String),
}

#[derive(Default)]
struct ControllerData {
    inventory: Inventory,
    scenarios: IndexMap<String, ScenarioMap>,
    /// One-shot failures keyed by command name.
    failures: Vec<(String, String)>,
    /// One-shot reply holds keyed by command name.
    holds: Vec<(String, Arc<Notify>)>,
    requests: Vec<Request>,
    dispatched: Vec<Dispatched>,
}

pub struct MemoryController {
    data: Mutex<ControllerData>,
}

impl MemoryController {
    pub fn new(inventory: Inventory) -> Self {
        Self {
            data: Mutex::new(ControllerData {
                inventory,
                ..ControllerData::default()
            }),
        }
    }

    /// Seed a stored scenario and its inventory entry.
    pub fn with_scenario(self, id: &str, name: &str, map: ScenarioMap) -> Self {
        {
            let mut data = self.data.lock();
            data.scenarios.insert(id.to_string(), map);
            data.inventory
                .upsert_device(Device::new(id, name, devicetype::SCENARIO));
        }
        self
    }

    /// Make the next request with this command fail with a remote error.
    pub fn fail_next(&self, command: &str, message: &str) {
        self.data
            .lock()
            .failures
            .push((command.to_string(), message.to_string()));
    }

    /// Hold the reply to the next request with this command until the
    /// returned handle is notified.
    pub fn hold_next(&self, command: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.data
            .lock()
            .holds
            .push((command.to_string(), notify.clone()));
        notify
    }

    pub fn requests(&self) -> Vec<Request> {
        self.data.lock().requests.clone()
    }

    /// Commands received so far, in order.
    pub fn commands(&self) -> Vec<String> {
        self.data
            .lock()
            .requests
            .iter()
            .map(|r| r.command().to_string())
            .collect()
    }

    pub fn scenario(&self, id: &str) -> Option<ScenarioMap> {
        self.data.lock().scenarios.get(id).cloned()
    }

    pub fn inventory(&self) -> Inventory {
        self.data.lock().inventory.clone()
    }

    pub fn dispatched(&self) -> Vec<Dispatched> {
        self.data.lock().dispatched.clone()
    }
}

#[async_trait]
impl CommandClient for MemoryController {
    async fn send(&self, request: Request) -> Result<Response, AppError> {
        let (hold, failure) = {
            let mut data = self.data.lock();
            data.requests.push(request.clone());
            let command = request.command();
            let hold = take_first(&mut data.holds, command);
            let failure = take_first(&mut data.failures, command);
            (hold, failure)
        };

        if let Some(notify) = hold {
            notify.notified().await;
        }
        if let Some(message) = failure {
            return Err(AppError::RemoteError { message });
        }

        let mut data = self.data.lock();
        data.handle(&request)
    }
}

fn take_first<T>(list: &mut Vec<(String, T)>, command: &str) -> Option<T> {
    let pos = list.iter().position(|(c, _)| c == command)?;
    Some(list.remove(pos).1)
}

fn remote(message: impl Into<String>) -> AppError {
    AppError::RemoteError {
        message: message.into(),
    }
}

fn required<'a>(request: &'a Request, key: &str) -> Result<&'a str, AppError> {
    request
        .str_field(key)
        .ok_or_else(|| remote(format!("Missing parameter {key}")))
}

impl ControllerData {
    fn handle(&mut self, request: &Request) -> Result<Response, AppError> {
        let command = request.command();
        if command == "inventory" {
            return Ok(Response::with_data(self.inventory.to_value()));
        }

        let target = request.target().ok_or_else(|| remote("Missing uuid"))?;
        let device = self
            .inventory
            .device(&DeviceId::from(target))
            .cloned()
            .ok_or_else(|| remote(format!("Unknown device {target}")))?;

        match device.devicetype.as_str() {
            devicetype::SCENARIO_CONTROLLER => self.scenario_controller(command, request),
            devicetype::AGO_CONTROLLER => self.ago_controller(command, request),
            devicetype::SCENARIO if command == "on" => {
                self.run_scenario(target);
                Ok(Response::default())
            }
            _ => Ok(Response::default()),
        }
    }

    fn scenario_controller(&mut self, command: &str, request: &Request) -> Result<Response, AppError> {
        match command {
            "setscenario" => {
                let raw = request
                    .get("scenariomap")
                    .cloned()
                    .ok_or_else(|| remote("Missing parameter scenariomap"))?;
                let map: ScenarioMap = serde_json::from_value(raw)
                    .map_err(|e| remote(format!("Invalid scenariomap: {e}")))?;
                if map.is_empty() {
                    return Err(remote("Scenario has no commands"));
                }
                let id = match request.str_field("scenario") {
                    Some(id) if !id.is_empty() => id.to_string(),
                    _ => uuid::Uuid::new_v4().to_string(),
                };
                if !self.scenarios.contains_key(&id) {
                    self.inventory
                        .upsert_device(Device::new(id.as_str(), "", devicetype::SCENARIO));
                }
                self.scenarios.insert(id.clone(), map);
                Ok(Response::with_data(json!({ "scenario": id })))
            }
            "getscenario" => {
                let id = required(request, "scenario")?;
                let map = self
                    .scenarios
                    .get(id)
                    .ok_or_else(|| remote("No such scenario"))?;
                Ok(Response::with_data(json!({
                    "scenario": id,
                    "scenariomap": map.to_value(),
                })))
            }
            "delscenario" => {
                let id = required(request, "scenario")?.to_string();
                if self.scenarios.shift_remove(&id).is_some() {
                    self.inventory.remove_device(&DeviceId(id));
                }
                Ok(Response::default())
            }
            other => Err(remote(format!("Unknown command {other}"))),
        }
    }

    fn ago_controller(&mut self, command: &str, request: &Request) -> Result<Response, AppError> {
        match command {
            "setdevicename" => {
                let device = DeviceId::from(required(request, "device")?);
                let name = request.str_field("name").unwrap_or_default();
                if self.inventory.rename_device(&device, name) {
                    Ok(Response::default())
                } else {
                    Err(remote("Failed to store change"))
                }
            }
            "setdeviceroom" => {
                let device = DeviceId::from(required(request, "device")?);
                let room = request.str_field("room").unwrap_or_default();
                if self.inventory.set_device_room(&device, room) {
                    Ok(Response::default())
                } else {
                    Err(remote("Failed to store change"))
                }
            }
            "setvariable" => {
                let variable = required(request, "variable")?;
                let value = match request.get("value") {
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => return Err(remote("Missing parameter value")),
                };
                self.inventory.set_variable(variable, &value);
                Ok(Response::default())
            }
            "delvariable" => {
                let variable = required(request, "variable")?;
                self.inventory.remove_variable(variable);
                Ok(Response::default())
            }
            other => Err(remote(format!("Unknown command {other}"))),
        }
    }

    /// Replays the stored steps in index order. Pauses are logged, not slept.
    fn run_scenario(&mut self, id: &str) {
        let Some(map) = self.scenarios.get(id) else {
            tracing::warn!(scenario = id, "run requested for unknown scenario");
            return;
        };
        for record in map.records() {
            match record.to_step() {
                Some(Step::Pause { delay }) => self.dispatched.push(Dispatched::Sleep(delay)),
                Some(step) => self.dispatched.push(Dispatched::Command(step)),
                None => tracing::warn!(scenario = id, "skipping malformed step {record}"),
            }
        }
    }
}
