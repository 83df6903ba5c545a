use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use super::device::{Device, DeviceId, Room};
use super::schema::Schema;
use crate::error::AppError;

/// The dashboard's view of the controller inventory: devices, the schema
/// that describes their commands, rooms, and global variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    devices: Vec<Device>,
    pub schema: Schema,
    pub rooms: IndexMap<String, Room>,
    variables: IndexMap<String, String>,
}

#[derive(Deserialize)]
struct DeviceRaw {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    room: Option<String>,
    #[serde(default)]
    devicetype: Option<String>,
}

#[derive(Deserialize)]
struct InventoryRaw {
    #[serde(default)]
    devices: IndexMap<String, DeviceRaw>,
    #[serde(default)]
    schema: Schema,
    #[serde(default)]
    rooms: IndexMap<String, Room>,
    #[serde(default)]
    variables: IndexMap<String, Value>,
}

impl Inventory {
    pub fn new(devices: Vec<Device>, schema: Schema) -> Self {
        Self {
            devices,
            schema,
            rooms: IndexMap::new(),
            variables: IndexMap::new(),
        }
    }

    /// Parse the `data` of an `inventory` reply.
    pub fn from_value(data: &Value) -> Result<Self, AppError> {
        let raw = InventoryRaw::deserialize(data).map_err(|e| AppError::ProtocolError {
            message: format!("inventory: {e}"),
        })?;

        let devices = raw
            .devices
            .into_iter()
            .map(|(id, d)| {
                let room_id = d.room.filter(|r| !r.is_empty());
                let room = room_id
                    .as_ref()
                    .and_then(|r| raw.rooms.get(r))
                    .map(|r| r.name.clone())
                    .filter(|n| !n.is_empty());
                Device {
                    id: DeviceId(id),
                    name: d.name.unwrap_or_default(),
                    room,
                    room_id,
                    devicetype: d.devicetype.unwrap_or_default(),
                }
            })
            .collect();

        let variables = raw
            .variables
            .into_iter()
            .map(|(k, v)| {
                let text = match v {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, text)
            })
            .collect();

        Ok(Self {
            devices,
            schema: raw.schema,
            rooms: raw.rooms,
            variables,
        })
    }

    /// Wire form of the inventory, as the controller's `inventory` reply carries it.
    pub fn to_value(&self) -> Value {
        let devices: serde_json::Map<String, Value> = self
            .devices
            .iter()
            .map(|d| {
                (
                    d.id.0.clone(),
                    serde_json::json!({
                        "name": d.name,
                        "room": d.room_id.clone().unwrap_or_default(),
                        "devicetype": d.devicetype,
                    }),
                )
            })
            .collect();
        serde_json::json!({
            "devices": devices,
            "schema": self.schema,
            "rooms": self.rooms,
            "variables": self.variables,
        })
    }

    // ── Devices ─────────────────────────────────────────────────────

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn device(&self, id: &DeviceId) -> Option<&Device> {
        self.devices.iter().find(|d| &d.id == id)
    }

    /// Scenario devices, sorted by name.
    pub fn scenarios(&self) -> Vec<&Device> {
        let mut list: Vec<&Device> = self.devices.iter().filter(|d| d.is_scenario()).collect();
        list.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });
        list
    }

    /// Id of the first device of the given type, e.g. the scenario controller.
    pub fn controller(&self, devicetype: &str) -> Result<DeviceId, AppError> {
        self.devices
            .iter()
            .find(|d| d.devicetype == devicetype)
            .map(|d| d.id.clone())
            .ok_or_else(|| AppError::NoController {
                devicetype: devicetype.to_string(),
            })
    }

    /// Insert a device, replacing an existing entry with the same id.
    pub fn upsert_device(&mut self, device: Device) {
        match self.devices.iter_mut().find(|d| d.id == device.id) {
            Some(existing) => *existing = device,
            None => self.devices.push(device),
        }
    }

    /// Remove a device by id. Returns whether anything was removed.
    pub fn remove_device(&mut self, id: &DeviceId) -> bool {
        let before = self.devices.len();
        self.devices.retain(|d| &d.id != id);
        self.devices.len() != before
    }

    pub fn rename_device(&mut self, id: &DeviceId, name: &str) -> bool {
        match self.devices.iter_mut().find(|d| &d.id == id) {
            Some(device) => {
                device.name = name.to_string();
                true
            }
            None => false,
        }
    }

    /// Move a device to a room (by room id; empty clears the room).
    pub fn set_device_room(&mut self, id: &DeviceId, room_id: &str) -> bool {
        let room_name = self
            .rooms
            .get(room_id)
            .map(|r| r.name.clone())
            .filter(|n| !n.is_empty());
        match self.devices.iter_mut().find(|d| &d.id == id) {
            Some(device) => {
                device.room_id = Some(room_id.to_string()).filter(|r| !r.is_empty());
                device.room = room_name;
                true
            }
            None => false,
        }
    }

    // ── Variables ───────────────────────────────────────────────────

    pub fn variables(&self) -> &IndexMap<String, String> {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    /// Boolean reading of a variable: `Some` only for "true"/"false" (any case).
    pub fn variable_bool(&self, name: &str) -> Option<bool> {
        self.variable(name).and_then(parse_bool)
    }

    pub fn set_variable(&mut self, name: &str, value: &str) {
        self.variables.insert(name.to_string(), value.to_string());
    }

    pub fn remove_variable(&mut self, name: &str) -> bool {
        self.variables.shift_remove(name).is_some()
    }
}

pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Inventory {
        Inventory::from_value(&json!({
            "devices": {
                "c1": { "name": "agocontroller", "devicetype": "agocontroller", "room": null },
                "s1": { "name": "Morning", "devicetype": "scenario", "room": "" },
                "s2": { "name": "evening", "devicetype": "scenario" },
                "d1": { "name": "Lamp", "devicetype": "switch", "room": "r1", "internalid": "1" }
            },
            "rooms": { "r1": { "name": "Kitchen", "location": "" }, "r2": { "name": "Hall" } },
            "variables": { "away": "False", "count": 3 },
            "schema": { "devicetypes": {}, "commands": {} }
        }))
        .unwrap()
    }

    #[test]
    fn resolves_room_names() {
        let inv = sample();
        let lamp = inv.device(&DeviceId::from("d1")).unwrap();
        assert_eq!(lamp.room.as_deref(), Some("Kitchen"));
        assert_eq!(lamp.room_id.as_deref(), Some("r1"));
        let morning = inv.device(&DeviceId::from("s1")).unwrap();
        assert_eq!(morning.room, None);
    }

    #[test]
    fn scenarios_sorted_case_insensitively() {
        let inv = sample();
        let names: Vec<&str> = inv.scenarios().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["evening", "Morning"]);
    }

    #[test]
    fn controller_lookup() {
        let inv = sample();
        assert_eq!(inv.controller("agocontroller").unwrap(), DeviceId::from("c1"));
        assert!(matches!(
            inv.controller("scenariocontroller"),
            Err(AppError::NoController { .. })
        ));
    }

    #[test]
    fn variables_are_text() {
        let inv = sample();
        assert_eq!(inv.variable("count"), Some("3"));
        assert_eq!(inv.variable_bool("away"), Some(false));
        assert_eq!(inv.variable_bool("count"), None);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut inv = sample();
        assert!(inv.remove_device(&DeviceId::from("s1")));
        assert!(!inv.remove_device(&DeviceId::from("s1")));
        assert_eq!(inv.scenarios().len(), 1);
    }

    #[test]
    fn wire_form_parses_back() {
        let inv = sample();
        let again = Inventory::from_value(&inv.to_value()).unwrap();
        assert_eq!(again, inv);
    }

    #[test]
    fn set_room_resolves_name() {
        let mut inv = sample();
        assert!(inv.set_device_room(&DeviceId::from("s2"), "r2"));
        assert_eq!(inv.device(&DeviceId::from("s2")).unwrap().room.as_deref(), Some("Hall"));
        assert!(inv.set_device_room(&DeviceId::from("s2"), ""));
        assert_eq!(inv.device(&DeviceId::from("s2")).unwrap().room_id, None);
    }
}
