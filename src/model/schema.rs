use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The controller's device schema: which commands each device type accepts
/// and what parameters each command takes. Key order is preserved from the
/// controller's reply so parameter fields render in schema order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub devicetypes: IndexMap<String, DeviceTypeSchema>,
    #[serde(default)]
    pub commands: IndexMap<String, CommandSchema>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceTypeSchema {
    #[serde(default)]
    pub name: Option<String>,
    /// Command ids supported by this device type, in display order.
    #[serde(default)]
    pub commands: Vec<String>,
}

/// One operation: its label and its ordered parameter descriptors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSchema {
    #[serde(rename = "name", default)]
    pub label: String,
    #[serde(default)]
    pub parameters: IndexMap<String, ParameterSchema>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSchema {
    #[serde(rename = "name", default)]
    pub label: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl CommandSchema {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            parameters: IndexMap::new(),
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, label: impl Into<String>) -> Self {
        self.parameters.insert(
            name.into(),
            ParameterSchema {
                label: label.into(),
                kind: None,
            },
        );
        self
    }
}

impl Schema {
    /// Register a device type with its command ids.
    pub fn add_devicetype<I, S>(&mut self, devicetype: impl Into<String>, commands: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.devicetypes.insert(
            devicetype.into(),
            DeviceTypeSchema {
                name: None,
                commands: commands.into_iter().map(Into::into).collect(),
            },
        );
    }

    pub fn add_command(&mut self, id: impl Into<String>, command: CommandSchema) {
        self.commands.insert(id.into(), command);
    }

    /// Command ids for a device type; empty when the type is unknown.
    pub fn command_ids(&self, devicetype: &str) -> &[String] {
        self.devicetypes
            .get(devicetype)
            .map_or(&[], |t| t.commands.as_slice())
    }

    /// Whether devices of this type can appear in a scenario.
    pub fn has_commands(&self, devicetype: &str) -> bool {
        !self.command_ids(devicetype).is_empty()
    }

    pub fn command(&self, id: &str) -> Option<&CommandSchema> {
        self.commands.get(id)
    }

    /// Label of a command, falling back to its id when the schema does not describe it.
    pub fn command_label<'a>(&'a self, id: &'a str) -> &'a str {
        match self.commands.get(id) {
            Some(c) if !c.label.is_empty() => &c.label,
            _ => id,
        }
    }
}
