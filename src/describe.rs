use crate::model::{Device, DeviceId, Inventory, ScenarioMap, Step};

/// Human-readable summary of the inventory: controllers, rooms, devices,
/// scenarios and variables.
pub fn describe_inventory(inventory: &Inventory) -> String {
    let mut lines = Vec::new();

    // Rooms
    lines.push(format!("Rooms ({})", inventory.rooms.len()));
    for (id, room) in &inventory.rooms {
        lines.push(format!("  - {} (id: {id})", room.name));
    }

    // Devices, scenarios listed separately
    let devices: Vec<&Device> = inventory.devices().iter().filter(|d| !d.is_scenario()).collect();
    lines.push(format!("\nDevices ({})", devices.len()));
    for d in devices {
        let commands = inventory.schema.command_ids(&d.devicetype).len();
        lines.push(format!(
            "  - {} [{}] (id: {}, {commands} commands)",
            label(d),
            d.devicetype,
            d.id
        ));
    }

    let scenarios = inventory.scenarios();
    lines.push(format!("\nScenarios ({})", scenarios.len()));
    for s in scenarios {
        lines.push(format!("  - {} (id: {})", label(s), s.id));
    }

    if !inventory.variables().is_empty() {
        lines.push(format!("\nVariables ({})", inventory.variables().len()));
        for (name, value) in inventory.variables() {
            lines.push(format!("  - {name} = {value}"));
        }
    }

    lines.join("\n")
}

/// Step-by-step description of a scenario, with device names and command
/// labels resolved through the inventory.
pub fn describe_scenario(inventory: &Inventory, id: &DeviceId, map: &ScenarioMap) -> String {
    let name = inventory
        .device(id)
        .map(|d| d.name.as_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("(unnamed)");
    let mut lines = vec![format!("Scenario: {name} (id: {id}, {} steps)", map.len())];

    for (i, (record, step)) in map.records().iter().zip(map.steps()).enumerate() {
        let text = match &step {
            Some(pause @ Step::Pause { delay }) => match pause.delay_seconds() {
                Some(secs) => format!("pause {secs}s"),
                None => format!("pause {delay:?} (not a number of seconds)"),
            },
            Some(action @ Step::DeviceAction { command, params, .. }) => {
                let target = action
                    .device()
                    .map(|id| {
                        inventory
                            .device(id)
                            .map_or_else(|| format!("{id} (missing)"), Device::display_name)
                    })
                    .unwrap_or_default();
                let mut text = format!("{target}: {}", inventory.schema.command_label(command));
                if !params.is_empty() {
                    let args: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
                    text.push_str(&format!(" ({})", args.join(", ")));
                }
                text
            }
            None => format!("unreadable step {record}"),
        };
        lines.push(format!("  {i}. {text}"));
    }

    lines.join("\n")
}

fn label(device: &Device) -> String {
    if device.name.is_empty() {
        format!("(unnamed {})", device.devicetype)
    } else {
        device.display_name()
    }
}
