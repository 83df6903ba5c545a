use indexmap::IndexMap;

use crate::client::memory::MemoryController;
use crate::model::{devicetype, CommandSchema, Device, Inventory, Room, ScenarioMap, Schema, Step};

pub const AGO_CONTROLLER_ID: &str = "00000000-0000-0000-0000-00000000a901";
pub const SCENARIO_CONTROLLER_ID: &str = "00000000-0000-0000-0000-00000000a902";
pub const LIVING_LAMP_ID: &str = "5a7d1c2e-0001-4c1e-9f00-000000000001";
pub const KITCHEN_DIMMER_ID: &str = "5a7d1c2e-0002-4c1e-9f00-000000000002";
pub const HALL_SWITCH_ID: &str = "5a7d1c2e-0003-4c1e-9f00-000000000003";
pub const PORCH_LIGHT_ID: &str = "5a7d1c2e-0004-4c1e-9f00-000000000004";
pub const TEMP_SENSOR_ID: &str = "5a7d1c2e-0005-4c1e-9f00-000000000005";
pub const UNNAMED_SWITCH_ID: &str = "5a7d1c2e-0006-4c1e-9f00-000000000006";
pub const GOOD_NIGHT_ID: &str = "9e3b0f4a-0001-4d2a-8c00-00000000c001";

/// Creates a small house: two controllers, three rooms, a handful of
/// switches and dimmers, a sensor without commands, an unnamed switch, and
/// one stored scenario device.
pub fn demo_inventory() -> Inventory {
    let mut schema = Schema::default();
    schema.add_command("on", CommandSchema::new("Turn on"));
    schema.add_command("off", CommandSchema::new("Turn off"));
    schema.add_command(
        "setlevel",
        CommandSchema::new("Set level").with_parameter("level", "Level"),
    );
    schema.add_devicetype("switch", ["on", "off"]);
    schema.add_devicetype("dimmer", ["on", "off", "setlevel"]);
    schema.add_devicetype(devicetype::SCENARIO, ["on"]);
    schema.add_devicetype("temperaturesensor", std::iter::empty::<&str>());

    let devices = vec![
        Device::new(AGO_CONTROLLER_ID, "", devicetype::AGO_CONTROLLER),
        Device::new(SCENARIO_CONTROLLER_ID, "", devicetype::SCENARIO_CONTROLLER),
        Device::new(LIVING_LAMP_ID, "Floor lamp", "switch").in_room("living", "Living room"),
        Device::new(KITCHEN_DIMMER_ID, "Ceiling", "dimmer").in_room("kitchen", "Kitchen"),
        Device::new(HALL_SWITCH_ID, "Hall light", "switch").in_room("hall", "Hall"),
        Device::new(PORCH_LIGHT_ID, "Porch", "switch"),
        Device::new(TEMP_SENSOR_ID, "Thermometer", "temperaturesensor").in_room("living", "Living room"),
        Device::new(UNNAMED_SWITCH_ID, "", "switch"),
        Device::new(GOOD_NIGHT_ID, "Good night", devicetype::SCENARIO),
    ];

    let mut inventory = Inventory::new(devices, schema);
    inventory.rooms = IndexMap::from([
        room("living", "Living room"),
        room("kitchen", "Kitchen"),
        room("hall", "Hall"),
    ]);
    inventory.set_variable("away", "False");
    inventory.set_variable("mode", "day");
    inventory
}

fn room(id: &str, name: &str) -> (String, Room) {
    (
        id.to_string(),
        Room {
            name: name.to_string(),
            location: None,
        },
    )
}

/// The stored steps of the demo "Good night" scenario.
pub fn good_night_steps() -> ScenarioMap {
    ScenarioMap::from_steps(&[
        Step::action(KITCHEN_DIMMER_ID, "setlevel").with_param("level", "20"),
        Step::pause("10"),
        Step::action(KITCHEN_DIMMER_ID, "off"),
        Step::action(LIVING_LAMP_ID, "off"),
    ])
}

/// An in-memory controller serving the demo inventory.
pub fn demo_controller() -> MemoryController {
    MemoryController::new(demo_inventory()).with_scenario(
        GOOD_NIGHT_ID,
        "Good night",
        good_night_steps(),
    )
}
