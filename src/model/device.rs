use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Newtype for device identity (the controller's uuid string). Prevents mixing
/// device ids up with names, rooms and command ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct DeviceId(pub String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Device type tags the dashboard treats specially.
pub mod devicetype {
    pub const SCENARIO: &str = "scenario";
    pub const SCENARIO_CONTROLLER: &str = "scenariocontroller";
    pub const AGO_CONTROLLER: &str = "agocontroller";
}

/// One entry of the inventory device list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    /// Display name. Empty until the user names the device.
    pub name: String,
    /// Room display name, already resolved from the room id.
    pub room: Option<String>,
    /// Room id as stored by the controller.
    pub room_id: Option<String>,
    pub devicetype: String,
}

impl Device {
    pub fn new(id: impl Into<String>, name: impl Into<String>, devicetype: impl Into<String>) -> Self {
        Self {
            id: DeviceId::new(id),
            name: name.into(),
            room: None,
            room_id: None,
            devicetype: devicetype.into(),
        }
    }

    /// Builder-style helper used by the demo data and tests.
    pub fn in_room(mut self, room_id: impl Into<String>, room: impl Into<String>) -> Self {
        self.room_id = Some(room_id.into());
        self.room = Some(room.into());
        self
    }

    /// Label shown in selectors: `"name (room)"`, or just the name without a room.
    pub fn display_name(&self) -> String {
        match self.room.as_deref() {
            Some(room) if !room.is_empty() => format!("{} ({room})", self.name),
            _ => self.name.clone(),
        }
    }

    pub fn is_scenario(&self) -> bool {
        self.devicetype == devicetype::SCENARIO
    }
}

/// A room as listed by the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
}
