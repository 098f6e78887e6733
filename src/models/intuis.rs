//! Wire models for the Muller Intuitiv (Netatmo white-label) cloud API.
//!
//! Notes
//! - Only the fields the client reads are modeled; unknown fields are ignored.
//! - Anything the server may omit is an `Option` or defaults to empty.
//! - Module and mode tags are closed enums; unknown module tags are kept as
//!   [`ModuleType::Other`] so topology loading can skip them.
//! - Unknown mode tags in status payloads are logged and read as absent, so a
//!   single odd room does not fail the whole refresh.

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::str::FromStr;

// =====================
// Scalar ID newtype wrappers
// =====================

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HomeId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(pub String);

impl From<&str> for RoomId {
    fn from(value: &str) -> Self {
        RoomId(value.to_string())
    }
}

impl From<&str> for ModuleId {
    fn from(value: &str) -> Self {
        ModuleId(value.to_string())
    }
}

impl core::fmt::Display for HomeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl core::fmt::Display for RoomId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl core::fmt::Display for ModuleId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

// =====================
// Tag enums
// =====================

/// Hardware family of a module, from its `type` tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ModuleType {
    /// `NMG`: the gateway ("router") bridging the cloud and in-home devices.
    Gateway,
    /// `NMH`: a heating module (radiator thermostat).
    Heating,
    /// `NMW`: the water-heater contactor.
    WaterHeater,
    Other(String),
}

impl ModuleType {
    pub fn as_str(&self) -> &str {
        match self {
            ModuleType::Gateway => "NMG",
            ModuleType::Heating => "NMH",
            ModuleType::WaterHeater => "NMW",
            ModuleType::Other(s) => s,
        }
    }
}

impl From<String> for ModuleType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "NMG" => ModuleType::Gateway,
            "NMH" => ModuleType::Heating,
            "NMW" => ModuleType::WaterHeater,
            _ => ModuleType::Other(value),
        }
    }
}

impl From<ModuleType> for String {
    fn from(value: ModuleType) -> Self {
        match value {
            ModuleType::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl core::fmt::Display for ModuleType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thermostat setpoint mode (`therm_setpoint_mode`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetpointMode {
    Program,
    Manual,
    Off,
    /// Hors-gel: frost protection at a fixed 7°C.
    Hg,
    Away,
}

impl SetpointMode {
    /// Modes accepted by the set-room-thermpoint endpoint.
    pub const SETTABLE: [SetpointMode; 4] = [
        SetpointMode::Program,
        SetpointMode::Away,
        SetpointMode::Hg,
        SetpointMode::Manual,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SetpointMode::Program => "program",
            SetpointMode::Manual => "manual",
            SetpointMode::Off => "off",
            SetpointMode::Hg => "hg",
            SetpointMode::Away => "away",
        }
    }

    pub fn is_settable(self) -> bool {
        Self::SETTABLE.contains(&self)
    }
}

impl FromStr for SetpointMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "program" => Ok(SetpointMode::Program),
            "manual" => Ok(SetpointMode::Manual),
            "off" => Ok(SetpointMode::Off),
            "hg" => Ok(SetpointMode::Hg),
            "away" => Ok(SetpointMode::Away),
            other => Err(format!("unknown setpoint mode {:?}", other)),
        }
    }
}

impl core::fmt::Display for SetpointMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Water-heater contactor mode.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactorMode {
    Auto,
    Manual,
}

impl ContactorMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ContactorMode::Auto => "auto",
            ContactorMode::Manual => "manual",
        }
    }
}

impl FromStr for ContactorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(ContactorMode::Auto),
            "manual" => Ok(ContactorMode::Manual),
            other => Err(format!("contactor mode must be 'auto' or 'manual', got {:?}", other)),
        }
    }
}

impl core::fmt::Display for ContactorMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =====================
// Auth
// =====================

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

// =====================
// Topology (homesdata)
// =====================

/// Every API response wraps its payload in `{"body": ..., "status": ...}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub body: T,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HomesData {
    #[serde(default)]
    pub homes: Vec<HomeData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HomeData {
    pub id: HomeId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub modules: Vec<ModuleData>,
    #[serde(default)]
    pub rooms: Vec<RoomData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModuleData {
    pub id: ModuleId,
    #[serde(rename = "type")]
    pub module_type: ModuleType,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoomData {
    pub id: RoomId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub room_type: Option<String>,
    #[serde(default)]
    pub module_ids: Vec<ModuleId>,
}

// =====================
// Status (homestatus)
// =====================

#[derive(Debug, Clone, Deserialize)]
pub struct HomeStatusBody {
    pub home: HomeStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HomeStatus {
    #[serde(default)]
    pub id: Option<HomeId>,
    #[serde(default)]
    pub rooms: Vec<RoomStatus>,
    #[serde(default)]
    pub modules: Vec<ModuleStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoomStatus {
    pub id: RoomId,
    #[serde(default)]
    pub therm_measured_temperature: Option<f64>,
    #[serde(default)]
    pub therm_setpoint_temperature: Option<f64>,
    #[serde(default, deserialize_with = "lenient_tag")]
    pub therm_setpoint_mode: Option<SetpointMode>,
    /// Unix seconds.
    #[serde(default)]
    pub therm_setpoint_end_time: Option<i64>,
    #[serde(default)]
    pub heating_power_request: Option<i64>,
    #[serde(default)]
    pub energy: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModuleStatus {
    pub id: ModuleId,
    #[serde(rename = "type")]
    pub module_type: ModuleType,
    #[serde(default)]
    pub boiler_status: Option<bool>,
    /// Shape varies by firmware; kept as-is.
    #[serde(default)]
    pub connection_status: Option<Value>,
    #[serde(default, deserialize_with = "lenient_tag")]
    pub contactor_mode: Option<ContactorMode>,
    #[serde(default)]
    pub firmware_revision: Option<u64>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub bridge: Option<ModuleId>,
}

fn lenient_tag<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr<Err = String>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|tag| match tag.parse() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!("Ignoring status field: {}", e);
            None
        }
    }))
}

// =====================
// Write commands
// =====================

/// Body shared by setstate, setroomthermpoint and setcontactormode.
#[derive(Debug, Clone, Serialize)]
pub struct CommandRequest {
    pub home: CommandHome,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandHome {
    pub id: HomeId,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rooms: Vec<RoomCommand>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<ModuleCommand>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomCommand {
    pub id: RoomId,
    pub therm_setpoint_mode: SetpointMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub therm_setpoint_temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub therm_setpoint_end_time: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleCommand {
    pub id: ModuleId,
    pub contactor_mode: ContactorMode,
}

// =====================
// Measurements (gethomemeasure)
// =====================

#[derive(Debug, Clone, Serialize)]
pub struct MeasureRequest {
    pub date_begin: i64,
    pub date_end: i64,
    pub app_identifier: &'static str,
    pub scale: String,
    pub real_time: bool,
    pub home: MeasureHome,
}

#[derive(Debug, Clone, Serialize)]
pub struct MeasureHome {
    pub id: HomeId,
    pub rooms: Vec<MeasureRoom>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MeasureRoom {
    pub id: RoomId,
    pub bridge: Option<ModuleId>,
    #[serde(rename = "type")]
    pub measure_types: Vec<&'static str>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn module_type_tags() {
        let parsed: Vec<ModuleType> = serde_json::from_value(json!(["NMG", "NMH", "NMW", "NMR"])).unwrap();
        assert_eq!(
            parsed,
            vec![
                ModuleType::Gateway,
                ModuleType::Heating,
                ModuleType::WaterHeater,
                ModuleType::Other("NMR".into())
            ]
        );
        assert_eq!(serde_json::to_value(ModuleType::Other("NMR".into())).unwrap(), json!("NMR"));
    }

    #[test]
    fn setpoint_mode_parsing() {
        assert_eq!("hg".parse::<SetpointMode>(), Ok(SetpointMode::Hg));
        assert!("bogus".parse::<SetpointMode>().is_err());
        assert!(!SetpointMode::Off.is_settable());
        assert!(SetpointMode::Away.is_settable());
    }

    #[test]
    fn unknown_status_modes_read_as_absent() {
        let room: RoomStatus =
            serde_json::from_value(json!({ "id": "r1", "therm_setpoint_mode": "turbo", "therm_measured_temperature": 19.5 }))
                .unwrap();
        assert_eq!(room.therm_setpoint_mode, None);
        assert_eq!(room.therm_measured_temperature, Some(19.5));

        let module: ModuleStatus =
            serde_json::from_value(json!({ "id": "w1", "type": "NMW", "contactor_mode": "eco" })).unwrap();
        assert_eq!(module.contactor_mode, None);

        let wrong_type = json!({ "id": "r1", "therm_setpoint_mode": 3 });
        assert!(serde_json::from_value::<RoomStatus>(wrong_type).is_err());
    }

    #[test]
    fn module_status_decodes_last_seen() {
        let raw = json!({
            "id": "00:11",
            "type": "NMW",
            "boiler_status": true,
            "contactor_mode": "auto",
            "firmware_revision": 42,
            "last_seen": 1_700_000_000,
            "bridge": "70:ee"
        });
        let status: ModuleStatus = serde_json::from_value(raw).unwrap();
        assert_eq!(status.last_seen.map(|t| t.timestamp()), Some(1_700_000_000));
        assert_eq!(status.contactor_mode, Some(ContactorMode::Auto));
        assert_eq!(status.bridge, Some(ModuleId::from("70:ee")));
    }

    #[test]
    fn command_omits_unset_fields() {
        let req = CommandRequest {
            home: CommandHome {
                id: HomeId("h1".into()),
                rooms: vec![RoomCommand {
                    id: RoomId::from("r1"),
                    therm_setpoint_mode: SetpointMode::Program,
                    therm_setpoint_temperature: None,
                    therm_setpoint_end_time: None,
                }],
                modules: vec![],
            },
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({ "home": { "id": "h1", "rooms": [{ "id": "r1", "therm_setpoint_mode": "program" }] } })
        );
    }
}
