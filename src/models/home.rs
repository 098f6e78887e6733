//! In-memory device model: the single modeled home with its rooms and water heaters.
//!
//! Entities are created by topology loading and mutated in place by status
//! refreshes (and by callers staging optimistic changes).

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::models::intuis::{
    ContactorMode, HomeId, ModuleData, ModuleId, ModuleStatus, ModuleType, RoomId, RoomStatus, SetpointMode,
};

/// A module bound to a room, as listed by the topology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    pub id: ModuleId,
    pub name: Option<String>,
    pub module_type: ModuleType,
}

impl From<&ModuleData> for ModuleDescriptor {
    fn from(value: &ModuleData) -> Self {
        ModuleDescriptor {
            id: value.id.clone(),
            name: value.name.clone(),
            module_type: value.module_type.clone(),
        }
    }
}

/// A heated room: at least one heating module is bound to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub room_type: Option<String>,
    pub current_temperature: Option<f64>,
    pub target_temperature: Option<f64>,
    pub mode: Option<SetpointMode>,
    pub heating_power_request: Option<i64>,
    pub energy_consumption: Option<f64>,
    pub modules: Vec<ModuleDescriptor>,
}

impl Room {
    pub fn new(id: RoomId, name: impl Into<String>, room_type: Option<String>) -> Self {
        Room {
            id,
            name: name.into(),
            room_type,
            current_temperature: None,
            target_temperature: None,
            mode: None,
            heating_power_request: None,
            energy_consumption: None,
            modules: Vec::new(),
        }
    }

    pub fn add_module(&mut self, module: ModuleDescriptor) {
        self.modules.push(module);
    }

    /// Overwrite the fields present in `status`; absent fields keep their last known value.
    pub fn apply_status(&mut self, status: &RoomStatus) {
        if let Some(t) = status.therm_measured_temperature {
            self.current_temperature = Some(t);
        }
        if let Some(t) = status.therm_setpoint_temperature {
            self.target_temperature = Some(t);
        }
        if let Some(m) = status.therm_setpoint_mode {
            self.mode = Some(m);
        }
        if let Some(p) = status.heating_power_request {
            self.heating_power_request = Some(p);
        }
        if let Some(e) = status.energy {
            self.energy_consumption = Some(e);
        }
    }
}

fn or_dash<T: fmt::Display>(v: &Option<T>) -> String {
    v.as_ref().map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Room: {} ({})", self.name, self.room_type.as_deref().unwrap_or("-"))?;
        writeln!(f, "- ID: {}", self.id)?;
        writeln!(f, "- Current Temperature: {}°C", or_dash(&self.current_temperature))?;
        writeln!(f, "- Target Temperature: {}°C", or_dash(&self.target_temperature))?;
        writeln!(f, "- Mode: {}", or_dash(&self.mode))?;
        writeln!(f, "- Heating Power: {}", or_dash(&self.heating_power_request))?;
        writeln!(f, "- Energy Consumption: {} kWh", or_dash(&self.energy_consumption))?;
        if !self.modules.is_empty() {
            writeln!(f, "- Associated Modules:")?;
            for m in &self.modules {
                writeln!(f, "    - {} ({})", m.name.as_deref().unwrap_or("-"), m.module_type)?;
            }
        }
        Ok(())
    }
}

/// The water-heater contactor of a room.
///
/// Stored in [`Home::water_heaters`] under the owning room's id; `id` is the
/// module id the status payload and contactor commands refer to.
#[derive(Debug, Clone, PartialEq)]
pub struct WaterHeater {
    pub id: ModuleId,
    pub room_id: RoomId,
    pub name: String,
    pub boiler_on: Option<bool>,
    pub connection_status: Option<Value>,
    pub contactor_mode: Option<ContactorMode>,
    pub firmware_revision: Option<u64>,
    pub last_seen: Option<DateTime<Utc>>,
    pub bridge: Option<ModuleId>,
}

impl WaterHeater {
    pub fn new(id: ModuleId, room_id: RoomId, name: impl Into<String>) -> Self {
        WaterHeater {
            id,
            room_id,
            name: name.into(),
            boiler_on: None,
            connection_status: None,
            contactor_mode: None,
            firmware_revision: None,
            last_seen: None,
            bridge: None,
        }
    }

    pub fn apply_status(&mut self, status: &ModuleStatus) {
        if let Some(b) = status.boiler_status {
            self.boiler_on = Some(b);
        }
        if let Some(c) = &status.connection_status {
            self.connection_status = Some(c.clone());
        }
        if let Some(m) = status.contactor_mode {
            self.contactor_mode = Some(m);
        }
        if let Some(r) = status.firmware_revision {
            self.firmware_revision = Some(r);
        }
        if let Some(t) = status.last_seen {
            self.last_seen = Some(t);
        }
        if let Some(b) = &status.bridge {
            self.bridge = Some(b.clone());
        }
    }
}

impl fmt::Display for WaterHeater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Water Heater: {} in room {}", self.id, self.room_id)?;
        let boiler = match self.boiler_on {
            Some(true) => "On",
            Some(false) => "Off",
            None => "-",
        };
        writeln!(f, "- Boiler Status: {}", boiler)?;
        writeln!(f, "- Connection Status: {}", or_dash(&self.connection_status))?;
        writeln!(f, "- Contactor Mode: {}", or_dash(&self.contactor_mode))?;
        writeln!(f, "- Firmware Revision: {}", or_dash(&self.firmware_revision))?;
        writeln!(f, "- Last Seen: {}", or_dash(&self.last_seen))?;
        writeln!(f, "- Bridge: {}", or_dash(&self.bridge))
    }
}

/// The account's first home.
#[derive(Debug, Clone, PartialEq)]
pub struct Home {
    pub id: HomeId,
    pub name: String,
    pub router_id: Option<ModuleId>,
    pub rooms: BTreeMap<RoomId, Room>,
    /// Keyed by the owning room's id, not the module id.
    pub water_heaters: BTreeMap<RoomId, WaterHeater>,
}

impl fmt::Display for Home {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Home Name: {}", self.name)?;
        writeln!(f, "Home ID: {}", self.id)?;
        writeln!(f)?;
        writeln!(f, "Rooms:")?;
        for room in self.rooms.values() {
            write!(f, "{}", room)?;
        }
        writeln!(f)?;
        writeln!(f, "Water Heaters:")?;
        for heater in self.water_heaters.values() {
            write!(f, "{}", heater)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(id: &str) -> RoomStatus {
        RoomStatus {
            id: RoomId::from(id),
            therm_measured_temperature: None,
            therm_setpoint_temperature: None,
            therm_setpoint_mode: None,
            therm_setpoint_end_time: None,
            heating_power_request: None,
            energy: None,
        }
    }

    #[test]
    fn absent_fields_keep_previous_values() {
        let mut room = Room::new(RoomId::from("r1"), "Salon", Some("livingroom".into()));
        room.energy_consumption = Some(12.5);
        room.target_temperature = Some(19.0);

        let mut s = status("r1");
        s.therm_measured_temperature = Some(20.4);
        s.therm_setpoint_mode = Some(SetpointMode::Program);
        room.apply_status(&s);

        assert_eq!(room.current_temperature, Some(20.4));
        assert_eq!(room.mode, Some(SetpointMode::Program));
        assert_eq!(room.target_temperature, Some(19.0));
        assert_eq!(room.energy_consumption, Some(12.5));

        s.energy = Some(13.0);
        room.apply_status(&s);
        assert_eq!(room.energy_consumption, Some(13.0));
    }

    #[test]
    fn room_summary_lists_modules() {
        let mut room = Room::new(RoomId::from("r1"), "Salon", None);
        room.add_module(ModuleDescriptor {
            id: ModuleId::from("m1"),
            name: Some("Radiateur".into()),
            module_type: ModuleType::Heating,
        });
        let text = room.to_string();
        assert!(text.starts_with("Room: Salon (-)\n"));
        assert!(text.contains("    - Radiateur (NMH)\n"));
    }
}
