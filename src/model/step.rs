use std::fmt;

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::device::DeviceId;

/// Command id the scenario controller interprets as "wait before the next step".
pub const SLEEP_COMMAND: &str = "scenariosleep";
/// Field carrying the pause length, in seconds, as text.
pub const DELAY_FIELD: &str = "delay";

const UUID_FIELD: &str = "uuid";
const COMMAND_FIELD: &str = "command";

// ── Typed step ──────────────────────────────────────────────────────

/// One entry of a scenario: either a command sent to a device or a pause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "StepRecord", try_from = "StepRecord")]
pub enum Step {
    DeviceAction {
        device: DeviceId,
        command: String,
        params: IndexMap<String, String>,
    },
    Pause {
        delay: String,
    },
}

impl Step {
    pub fn action(device: impl Into<String>, command: impl Into<String>) -> Self {
        Step::DeviceAction {
            device: DeviceId::new(device),
            command: command.into(),
            params: IndexMap::new(),
        }
    }

    pub fn pause(delay: impl Into<String>) -> Self {
        Step::Pause {
            delay: delay.into(),
        }
    }

    /// Adds a parameter to a device action. Pauses ignore it.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let Step::DeviceAction { params, .. } = &mut self {
            params.insert(name.into(), value.into());
        }
        self
    }

    pub fn device(&self) -> Option<&DeviceId> {
        match self {
            Step::DeviceAction { device, .. } => Some(device),
            Step::Pause { .. } => None,
        }
    }

    /// Pause length in whole seconds, if this is a pause with a parseable delay.
    pub fn delay_seconds(&self) -> Option<u64> {
        match self {
            Step::Pause { delay } => delay.trim().parse().ok(),
            Step::DeviceAction { .. } => None,
        }
    }

    pub fn to_record(&self) -> StepRecord {
        match self {
            Step::DeviceAction {
                device,
                command,
                params,
            } => StepRecord {
                uuid: Some(device.0.clone()),
                command: Some(command.clone()),
                fields: params.clone(),
            },
            Step::Pause { delay } => {
                let mut fields = IndexMap::new();
                fields.insert(DELAY_FIELD.to_string(), delay.clone());
                StepRecord {
                    uuid: None,
                    command: Some(SLEEP_COMMAND.to_string()),
                    fields,
                }
            }
        }
    }
}

impl From<Step> for StepRecord {
    fn from(step: Step) -> Self {
        step.to_record()
    }
}

impl TryFrom<StepRecord> for Step {
    type Error = String;

    fn try_from(record: StepRecord) -> Result<Self, String> {
        record
            .to_step()
            .ok_or_else(|| format!("step has neither a target device nor a pause: {record}"))
    }
}

// ── Wire record ─────────────────────────────────────────────────────

/// Persisted form of one step, read leniently. Steps written by other
/// clients may be malformed, which the builder reports as a match failure
/// rather than refusing the whole scenario.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepRecord {
    pub uuid: Option<String>,
    pub command: Option<String>,
    /// Every other scalar field, stringified, in wire order.
    pub fields: IndexMap<String, String>,
}

impl StepRecord {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn is_pause(&self) -> bool {
        self.uuid.is_none() && self.command.as_deref() == Some(SLEEP_COMMAND)
    }

    /// Typed view of the record, or None when it is neither a device action
    /// (uuid and command present) nor a pause.
    pub fn to_step(&self) -> Option<Step> {
        match (&self.uuid, &self.command) {
            (Some(uuid), Some(command)) => Some(Step::DeviceAction {
                device: DeviceId::new(uuid.clone()),
                command: command.clone(),
                params: self.fields.clone(),
            }),
            (None, Some(command)) if command == SLEEP_COMMAND => Some(Step::Pause {
                delay: self.field(DELAY_FIELD).unwrap_or_default().to_string(),
            }),
            _ => None,
        }
    }

    fn from_wire(mut map: IndexMap<String, Value>) -> Self {
        let uuid = map
            .shift_remove(UUID_FIELD)
            .and_then(|v| scalar_text(&v))
            .filter(|s| !s.is_empty());
        let command = map.shift_remove(COMMAND_FIELD).and_then(|v| scalar_text(&v));
        let fields = map
            .into_iter()
            .filter_map(|(k, v)| scalar_text(&v).map(|text| (k, text)))
            .collect();
        Self {
            uuid,
            command,
            fields,
        }
    }
}

/// Text form of a scalar JSON value; objects, arrays and null have none.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

impl fmt::Display for StepRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

impl Serialize for StepRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = usize::from(self.uuid.is_some()) + usize::from(self.command.is_some()) + self.fields.len();
        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(uuid) = &self.uuid {
            map.serialize_entry(UUID_FIELD, uuid)?;
        }
        if let Some(command) = &self.command {
            map.serialize_entry(COMMAND_FIELD, command)?;
        }
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for StepRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = IndexMap::<String, Value>::deserialize(deserializer)?;
        Ok(Self::from_wire(map))
    }
}

// ── Scenario map ────────────────────────────────────────────────────

/// A scenario's ordered step list. On the wire it is an object keyed by
/// the decimal step index (`"0"`, `"1"`, ...). Reading orders entries by
/// numeric index; writing always emits dense indices from 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioMap {
    records: Vec<StepRecord>,
}

impl ScenarioMap {
    pub fn new(records: Vec<StepRecord>) -> Self {
        Self { records }
    }

    pub fn from_steps(steps: &[Step]) -> Self {
        Self {
            records: steps.iter().map(Step::to_record).collect(),
        }
    }

    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Typed steps; `None` marks a record that is neither an action nor a pause.
    pub fn steps(&self) -> Vec<Option<Step>> {
        self.records.iter().map(StepRecord::to_step).collect()
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Serialize for ScenarioMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.records.len()))?;
        for (i, record) in self.records.iter().enumerate() {
            map.serialize_entry(&i.to_string(), record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ScenarioMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = IndexMap::<String, StepRecord>::deserialize(deserializer)?;
        let mut indexed = Vec::with_capacity(raw.len());
        for (key, record) in raw {
            let index: usize = key
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("scenario step key is not an index: {key:?}")))?;
            indexed.push((index, record));
        }
        indexed.sort_by_key(|(index, _)| *index);
        if indexed.windows(2).any(|w| matches!(w, [a, b] if a.0 == b.0)) {
            return Err(D::Error::custom("duplicate scenario step index"));
        }
        Ok(Self {
            records: indexed.into_iter().map(|(_, record)| record).collect(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn evening_scenario_wire_shape() {
        let map = ScenarioMap::from_steps(&[Step::action("D1", "on"), Step::pause("30")]);
        assert_eq!(
            map.to_value(),
            json!({
                "0": { "uuid": "D1", "command": "on" },
                "1": { "command": "scenariosleep", "delay": "30" }
            })
        );
    }

    #[test]
    fn keys_are_ordered_numerically() {
        let mut wire = serde_json::Map::new();
        for i in [10, 2, 0, 1] {
            wire.insert(i.to_string(), json!({ "uuid": format!("D{i}"), "command": "on" }));
        }
        let map: ScenarioMap = serde_json::from_value(Value::Object(wire)).unwrap();
        let uuids: Vec<&str> = map.records().iter().map(|r| r.uuid.as_deref().unwrap()).collect();
        assert_eq!(uuids, ["D0", "D1", "D2", "D10"]);
    }

    #[test]
    fn non_index_key_is_rejected() {
        let result: Result<ScenarioMap, _> =
            serde_json::from_value(json!({ "first": { "command": "scenariosleep" } }));
        assert!(result.is_err());
    }

    #[test]
    fn scalar_fields_are_stringified() {
        let record: StepRecord =
            serde_json::from_value(json!({ "command": "scenariosleep", "delay": 30 })).unwrap();
        assert_eq!(record.field("delay"), Some("30"));
        assert_eq!(record.to_step(), Some(Step::pause("30")));
        assert_eq!(record.to_step().unwrap().delay_seconds(), Some(30));
    }

    #[test]
    fn record_without_device_or_pause_has_no_step() {
        let record: StepRecord = serde_json::from_value(json!({ "command": "on" })).unwrap();
        assert!(record.to_step().is_none());
        assert!(serde_json::from_value::<Step>(json!({ "command": "on" })).is_err());
    }

    #[test]
    fn empty_uuid_counts_as_missing() {
        let record: StepRecord =
            serde_json::from_value(json!({ "uuid": "", "command": "scenariosleep", "delay": "5" }))
                .unwrap();
        assert!(record.is_pause());
    }

    #[test]
    fn pause_never_carries_uuid() {
        let value = serde_json::to_value(Step::pause("3")).unwrap();
        assert!(value.get("uuid").is_none());
    }

    #[test]
    fn action_params_follow_command() {
        let step = Step::action("D2", "setlevel").with_param("level", "40");
        let value = serde_json::to_value(&step).unwrap();
        assert_eq!(value, json!({ "uuid": "D2", "command": "setlevel", "level": "40" }));
        let back: Step = serde_json::from_value(value).unwrap();
        assert_eq!(back, step);
    }
}
