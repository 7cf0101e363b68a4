use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::{
    api::ecoflow::{Device, ParameterMap},
    station::DeviceStatus,
};

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.enforce_styling();
    table
}

fn flag(value: bool, good: bool) -> Cell {
    Cell::new(if value { "yes" } else { "no" })
        .fg(if value == good { Color::Green } else { Color::Red })
}

pub fn build_devices_table(devices: &[Device]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Serial number", "Product", "Name", "Online"]);
    for device in devices {
        table.add_row(vec![
            Cell::new(&device.serial_number),
            Cell::new(device.product_name.as_deref().unwrap_or_default()),
            Cell::new(device.device_name.as_deref().unwrap_or_default())
                .add_attribute(Attribute::Dim),
            flag(device.online, true),
        ]);
    }
    table
}

pub fn build_status_table(status: &DeviceStatus) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Parameter", "Value"]);
    table.add_row(vec![Cell::new("Online"), flag(status.is_online, true)]);
    table.add_row(vec![Cell::new("AC output"), flag(status.is_ac_enabled, false)]);
    table.add_row(vec![Cell::new("Charging line"), flag(status.is_charging_line_plugged, true)]);
    table.add_row(vec![Cell::new("Charging"), flag(status.battery.is_charging, true)]);
    table.add_row(vec![
        Cell::new("State of charge"),
        Cell::new(format!("{}%", status.battery.state_of_charge_percent))
            .set_alignment(CellAlignment::Right),
    ]);
    table.add_row(vec![
        Cell::new("Remaining time"),
        Cell::new(format!("{} min", status.battery.remaining_time_minutes))
            .set_alignment(CellAlignment::Right),
    ]);
    table
}

pub fn build_parameters_table(parameters: &ParameterMap) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Parameter", "Value"]);
    let mut names: Vec<&String> = parameters.keys().collect();
    names.sort_unstable();
    for name in names {
        table.add_row(vec![
            Cell::new(name).add_attribute(Attribute::Dim),
            Cell::new(&parameters[name]).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}
