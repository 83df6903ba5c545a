use std::cmp::Ordering;

use serde::Serialize;
use ts_rs::TS;

use super::RowId;
use crate::error::AppError;
use crate::model::{CommandSchema, DeviceId, Inventory, Step, StepRecord, DELAY_FIELD, SLEEP_COMMAND};

pub const PAUSE_LABEL: &str = "Pause";
pub const DELAY_LABEL: &str = "Delay";
pub const DELAY_PLACEHOLDER: &str = "Delay in seconds";

// ── Options ─────────────────────────────────────────────────────────

/// What a device selector entry points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(tag = "kind", content = "id")]
#[ts(export)]
pub enum DeviceChoice {
    Device(DeviceId),
    Pause,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct DeviceOption {
    pub choice: DeviceChoice,
    pub label: String,
    #[serde(skip)]
    #[ts(skip)]
    devicetype: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct CommandOption {
    pub id: String,
    pub label: String,
}

/// One parameter input: the parameter name it writes and the label shown as
/// its placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct FieldDescriptor {
    pub name: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct ParamField {
    #[serde(flatten)]
    pub descriptor: FieldDescriptor,
    pub value: String,
}

/// Device selector entries: every named device whose type has at least one
/// command, ordered by room then name, followed by the pause entry.
pub fn device_options(inventory: &Inventory) -> Vec<DeviceOption> {
    let mut eligible: Vec<_> = inventory
        .devices()
        .iter()
        .filter(|d| !d.name.is_empty() && inventory.schema.has_commands(&d.devicetype))
        .collect();
    eligible.sort_by(|a, b| {
        let room_a = a.room.as_deref().unwrap_or_default();
        let room_b = b.room.as_deref().unwrap_or_default();
        caseless(room_a, room_b)
            .then_with(|| caseless(&a.name, &b.name))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut options: Vec<DeviceOption> = eligible
        .into_iter()
        .map(|d| DeviceOption {
            choice: DeviceChoice::Device(d.id.clone()),
            label: d.display_name(),
            devicetype: d.devicetype.clone(),
        })
        .collect();
    options.push(DeviceOption {
        choice: DeviceChoice::Pause,
        label: PAUSE_LABEL.to_string(),
        devicetype: String::new(),
    });
    options
}

/// Case-insensitive order, ties broken by the raw text.
fn caseless(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

fn command_options(inventory: &Inventory, option: &DeviceOption) -> Vec<CommandOption> {
    match option.choice {
        DeviceChoice::Pause => vec![CommandOption {
            id: SLEEP_COMMAND.to_string(),
            label: DELAY_LABEL.to_string(),
        }],
        DeviceChoice::Device(_) => inventory
            .schema
            .command_ids(&option.devicetype)
            .iter()
            .map(|id| CommandOption {
                id: id.clone(),
                label: inventory.schema.command_label(id).to_string(),
            })
            .collect(),
    }
}

/// Parameter inputs for an operation, in schema order.
pub fn fields_for(command: &CommandSchema) -> Vec<FieldDescriptor> {
    command
        .parameters
        .iter()
        .map(|(name, param)| FieldDescriptor {
            name: name.clone(),
            label: if param.label.is_empty() {
                name.clone()
            } else {
                param.label.clone()
            },
        })
        .collect()
}

fn pause_fields() -> Vec<FieldDescriptor> {
    vec![FieldDescriptor {
        name: DELAY_FIELD.to_string(),
        label: DELAY_PLACEHOLDER.to_string(),
    }]
}

// ── Row ─────────────────────────────────────────────────────────────

/// One step being edited. The device options are a snapshot taken when the
/// row was created; the command list and fields follow the selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct BuilderRow {
    pub id: RowId,
    devices: Vec<DeviceOption>,
    device_index: usize,
    commands: Vec<CommandOption>,
    command_index: usize,
    fields: Vec<ParamField>,
    invalid: bool,
}

impl BuilderRow {
    /// Create a row, optionally pre-populated from a stored step. The flag is
    /// false when the step's device or command is not in the inventory; the
    /// row then keeps whatever the selectors fell back to and is flagged.
    pub fn new(id: RowId, inventory: &Inventory, seed: Option<&StepRecord>) -> (Self, bool) {
        let mut row = Self {
            id,
            devices: device_options(inventory),
            device_index: 0,
            commands: Vec::new(),
            command_index: 0,
            fields: Vec::new(),
            invalid: false,
        };

        let Some(record) = seed else {
            row.apply_device(inventory, 0);
            return (row, true);
        };

        let wanted = match &record.uuid {
            Some(uuid) => DeviceChoice::Device(DeviceId::new(uuid.clone())),
            None => DeviceChoice::Pause,
        };
        let device_index = row.devices.iter().position(|o| o.choice == wanted);
        row.apply_device(inventory, device_index.unwrap_or(0));

        let command_index = device_index.and_then(|_| {
            let command = record.command.as_deref()?;
            row.commands.iter().position(|c| c.id == command)
        });
        if let Some(index) = command_index {
            row.apply_command(inventory, index);
        }
        for field in &mut row.fields {
            if let Some(value) = record.field(&field.descriptor.name) {
                field.value = value.to_string();
            }
        }

        let matched = command_index.is_some();
        row.invalid = !matched;
        (row, matched)
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn devices(&self) -> &[DeviceOption] {
        &self.devices
    }

    pub fn device_index(&self) -> usize {
        self.device_index
    }

    pub fn selected_device(&self) -> Option<&DeviceOption> {
        self.devices.get(self.device_index)
    }

    pub fn commands(&self) -> &[CommandOption] {
        &self.commands
    }

    pub fn command_index(&self) -> usize {
        self.command_index
    }

    pub fn selected_command(&self) -> Option<&CommandOption> {
        self.commands.get(self.command_index)
    }

    pub fn fields(&self) -> &[ParamField] {
        &self.fields
    }

    pub fn is_invalid(&self) -> bool {
        self.invalid
    }

    pub fn is_pause(&self) -> bool {
        matches!(self.selected_device().map(|o| &o.choice), Some(DeviceChoice::Pause))
    }

    // ── Transitions ─────────────────────────────────────────────────

    pub fn select_device(&mut self, inventory: &Inventory, index: usize) -> Result<(), AppError> {
        if index >= self.devices.len() {
            return Err(AppError::InvalidIndex {
                what: "device".into(),
                index,
            });
        }
        self.apply_device(inventory, index);
        Ok(())
    }

    pub fn select_command(&mut self, inventory: &Inventory, index: usize) -> Result<(), AppError> {
        if index >= self.commands.len() {
            return Err(AppError::InvalidIndex {
                what: "command".into(),
                index,
            });
        }
        self.apply_command(inventory, index);
        Ok(())
    }

    pub fn set_param(&mut self, name: &str, value: &str) -> Result<(), AppError> {
        let field = self
            .fields
            .iter_mut()
            .find(|f| f.descriptor.name == name)
            .ok_or_else(|| AppError::NotFound {
                what: format!("Parameter '{name}'"),
            })?;
        field.value = value.to_string();
        Ok(())
    }

    /// The step the current selection stands for. A pause row always
    /// encodes as a pause.
    pub fn to_record(&self) -> StepRecord {
        let Some(option) = self.selected_device() else {
            return StepRecord::default();
        };
        match &option.choice {
            DeviceChoice::Pause => {
                let delay = self
                    .fields
                    .iter()
                    .find(|f| f.descriptor.name == DELAY_FIELD)
                    .map(|f| f.value.clone())
                    .unwrap_or_default();
                Step::pause(delay).to_record()
            }
            DeviceChoice::Device(id) => StepRecord {
                uuid: Some(id.0.clone()),
                command: self.selected_command().map(|c| c.id.clone()),
                fields: self
                    .fields
                    .iter()
                    .map(|f| (f.descriptor.name.clone(), f.value.clone()))
                    .collect(),
            },
        }
    }

    fn apply_device(&mut self, inventory: &Inventory, index: usize) {
        self.device_index = index;
        self.commands = self
            .devices
            .get(index)
            .map(|o| command_options(inventory, o))
            .unwrap_or_default();
        self.command_index = 0;
        self.fields.clear();
        if !self.commands.is_empty() {
            self.apply_command(inventory, 0);
        }
    }

    fn apply_command(&mut self, inventory: &Inventory, index: usize) {
        self.command_index = index;
        let descriptors = if self.is_pause() {
            pause_fields()
        } else {
            self.selected_command()
                .and_then(|c| inventory.schema.command(&c.id))
                .map(fields_for)
                .unwrap_or_default()
        };
        self.fields = descriptors
            .into_iter()
            .map(|descriptor| ParamField {
                descriptor,
                value: String::new(),
            })
            .collect();
        self.invalid = false;
    }
}
