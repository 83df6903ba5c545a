pub mod device;
pub mod inventory;
pub mod schema;
pub mod step;

// Re-export commonly used types at the model level.
pub use device::{devicetype, Device, DeviceId, Room};
pub use inventory::Inventory;
pub use schema::{CommandSchema, DeviceTypeSchema, ParameterSchema, Schema};
pub use step::{ScenarioMap, Step, StepRecord, DELAY_FIELD, SLEEP_COMMAND};
