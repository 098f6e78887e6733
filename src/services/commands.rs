//! Write commands. Each is a single JSON POST returning the server's raw ack.
//!
//! The entity model is not touched here; see `services::optimistic` for the
//! stage/dispatch/rollback helpers and call `refresh_status()` to reconcile.

use log::info;
use serde_json::Value;

use crate::client::IntuisClient;
use crate::error::ClientError;
use crate::models::intuis::{
    CommandHome, CommandRequest, ContactorMode, HomeId, ModuleCommand, ModuleId, RoomCommand, RoomId, SetpointMode,
};

pub const SET_STATE_PATH: &str = "/syncapi/v1/setstate";
pub const SET_ROOM_THERMPOINT_PATH: &str = "/api/setroomthermpoint";
pub const SET_CONTACTOR_MODE_PATH: &str = "/api/setcontactormode";

/// Setpoint used by off and frost-protection modes, whatever the caller asked for.
pub const FROST_TEMPERATURE: f64 = 7.0;

impl IntuisClient {
    /// Manual setpoint, held until `end_time` (unix seconds) or the next schedule change.
    pub fn set_setpoint(&self, room_id: &RoomId, temperature: f64, end_time: Option<i64>) -> Result<Value, ClientError> {
        let body = setpoint_request(self.home_id()?, room_id, temperature, end_time);
        info!("Room {}: manual setpoint {}°C", room_id, temperature);
        self.post_json_value(SET_STATE_PATH, &body)
    }

    pub fn set_off(&self, room_id: &RoomId) -> Result<Value, ClientError> {
        let body = room_request(self.home_id()?, room_id, SetpointMode::Off, Some(FROST_TEMPERATURE));
        info!("Room {}: off", room_id);
        self.post_json_value(SET_STATE_PATH, &body)
    }

    /// Frost protection goes through set-room-thermpoint, unlike `set_off`.
    pub fn set_frost_protection(&self, room_id: &RoomId) -> Result<Value, ClientError> {
        let body = room_request(self.home_id()?, room_id, SetpointMode::Hg, Some(FROST_TEMPERATURE));
        info!("Room {}: frost protection", room_id);
        self.post_json_value(SET_ROOM_THERMPOINT_PATH, &body)
    }

    /// Switch a room to `program`, `away`, `hg` or `manual` (which needs a temperature).
    pub fn set_mode(&self, room_id: &RoomId, mode: &str, temperature: Option<f64>) -> Result<Value, ClientError> {
        let mode = validate_room_mode(mode, temperature)?;
        let body = mode_request(self.home_id()?, room_id, mode, temperature);
        info!("Room {}: mode {}", room_id, mode);
        self.post_json_value(SET_ROOM_THERMPOINT_PATH, &body)
    }

    pub fn set_water_heater_mode(&self, heater_id: &ModuleId, mode: &str) -> Result<Value, ClientError> {
        let mode = validate_contactor_mode(mode)?;
        let body = contactor_request(self.home_id()?, heater_id, mode);
        info!("Water heater {}: contactor mode {}", heater_id, mode);
        self.post_json_value(SET_CONTACTOR_MODE_PATH, &body)
    }
}

pub fn validate_room_mode(mode: &str, temperature: Option<f64>) -> Result<SetpointMode, ClientError> {
    let parsed = mode
        .parse::<SetpointMode>()
        .ok()
        .filter(|m| m.is_settable())
        .ok_or_else(|| {
            let valid: Vec<&str> = SetpointMode::SETTABLE.iter().map(|m| m.as_str()).collect();
            ClientError::Validation(format!("mode must be one of: {}", valid.join(", ")))
        })?;
    if parsed == SetpointMode::Manual && temperature.is_none() {
        return Err(ClientError::Validation(
            "temperature must be specified when using manual mode".to_string(),
        ));
    }
    Ok(parsed)
}

pub fn validate_contactor_mode(mode: &str) -> Result<ContactorMode, ClientError> {
    mode.parse::<ContactorMode>().map_err(ClientError::Validation)
}

fn room_request(home_id: HomeId, room_id: &RoomId, mode: SetpointMode, temperature: Option<f64>) -> CommandRequest {
    CommandRequest {
        home: CommandHome {
            id: home_id,
            rooms: vec![RoomCommand {
                id: room_id.clone(),
                therm_setpoint_mode: mode,
                therm_setpoint_temperature: temperature,
                therm_setpoint_end_time: None,
            }],
            modules: Vec::new(),
        },
    }
}

pub fn setpoint_request(home_id: HomeId, room_id: &RoomId, temperature: f64, end_time: Option<i64>) -> CommandRequest {
    let mut req = room_request(home_id, room_id, SetpointMode::Manual, Some(temperature));
    req.home.rooms[0].therm_setpoint_end_time = end_time;
    req
}

/// Temperature is only sent for manual mode.
pub fn mode_request(home_id: HomeId, room_id: &RoomId, mode: SetpointMode, temperature: Option<f64>) -> CommandRequest {
    let temperature = if mode == SetpointMode::Manual { temperature } else { None };
    room_request(home_id, room_id, mode, temperature)
}

pub fn contactor_request(home_id: HomeId, heater_id: &ModuleId, mode: ContactorMode) -> CommandRequest {
    CommandRequest {
        home: CommandHome {
            id: home_id,
            rooms: Vec::new(),
            modules: vec![ModuleCommand {
                id: heater_id.clone(),
                contactor_mode: mode,
            }],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn home() -> HomeId {
        HomeId("h1".into())
    }

    fn to_json(req: &CommandRequest) -> Value {
        serde_json::to_value(req).unwrap()
    }

    #[test]
    fn setpoint_without_end_time_omits_the_field() {
        let body = to_json(&setpoint_request(home(), &RoomId::from("r1"), 19.5, None));
        assert_eq!(
            body,
            json!({ "home": { "id": "h1", "rooms": [
                { "id": "r1", "therm_setpoint_mode": "manual", "therm_setpoint_temperature": 19.5 }
            ] } })
        );
    }

    #[test]
    fn setpoint_end_time_is_sent_verbatim() {
        let body = to_json(&setpoint_request(home(), &RoomId::from("r1"), 19.5, Some(1_700_000_000)));
        assert_eq!(body["home"]["rooms"][0]["therm_setpoint_end_time"], json!(1_700_000_000));
    }

    #[test]
    fn mode_validation() {
        assert!(matches!(validate_room_mode("bogus", None), Err(ClientError::Validation(_))));
        assert!(matches!(validate_room_mode("off", None), Err(ClientError::Validation(_))));
        assert!(matches!(validate_room_mode("manual", None), Err(ClientError::Validation(_))));
        assert_eq!(validate_room_mode("manual", Some(21.0)).unwrap(), SetpointMode::Manual);
        assert_eq!(validate_room_mode("away", None).unwrap(), SetpointMode::Away);
        assert!(matches!(validate_contactor_mode("boost"), Err(ClientError::Validation(_))));
        assert_eq!(validate_contactor_mode("auto").unwrap(), ContactorMode::Auto);
    }

    #[test]
    fn temperature_only_sent_for_manual_mode() {
        let manual = to_json(&mode_request(home(), &RoomId::from("r1"), SetpointMode::Manual, Some(21.0)));
        assert_eq!(manual["home"]["rooms"][0]["therm_setpoint_temperature"], json!(21.0));

        let program = to_json(&mode_request(home(), &RoomId::from("r1"), SetpointMode::Program, Some(21.0)));
        assert!(program["home"]["rooms"][0].get("therm_setpoint_temperature").is_none());
    }

    #[test]
    fn contactor_payload() {
        let body = to_json(&contactor_request(home(), &ModuleId::from("w1"), ContactorMode::Manual));
        assert_eq!(
            body,
            json!({ "home": { "id": "h1", "modules": [{ "id": "w1", "contactor_mode": "manual" }] } })
        );
    }
}
