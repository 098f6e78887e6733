//! Two-phase local updates for UI consistency.
//!
//! Commands do not touch the entity model. A front end that wants to show a
//! change immediately stages it locally, dispatches the command, rolls back if
//! the command fails, and treats the next `refresh_status()` as authoritative.

use log::warn;
use serde_json::Value;

use crate::client::IntuisClient;
use crate::error::ClientError;
use crate::models::intuis::{ContactorMode, RoomId, SetpointMode};
use crate::services::commands::{validate_contactor_mode, validate_room_mode};

/// Room fields as they were before a staged change.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomSnapshot {
    pub room_id: RoomId,
    pub mode: Option<SetpointMode>,
    pub target_temperature: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaterHeaterSnapshot {
    /// Key of the water heater in the home model (its owning room).
    pub room_id: RoomId,
    pub contactor_mode: Option<ContactorMode>,
}

impl IntuisClient {
    /// Apply `mode` and/or `target_temperature` to the modeled room.
    pub fn stage_room_change(
        &mut self,
        room_id: &RoomId,
        mode: Option<SetpointMode>,
        target_temperature: Option<f64>,
    ) -> Result<RoomSnapshot, ClientError> {
        let home = self.home.as_mut().ok_or(ClientError::TopologyNotLoaded)?;
        let room = home.rooms.get_mut(room_id).ok_or_else(|| ClientError::Lookup {
            kind: "room",
            id: room_id.0.clone(),
        })?;
        let snapshot = RoomSnapshot {
            room_id: room_id.clone(),
            mode: room.mode,
            target_temperature: room.target_temperature,
        };
        if let Some(m) = mode {
            room.mode = Some(m);
        }
        if let Some(t) = target_temperature {
            room.target_temperature = Some(t);
        }
        Ok(snapshot)
    }

    /// Restore the fields captured by `stage_room_change`.
    ///
    /// A room that disappeared in a topology reload is ignored.
    pub fn rollback_room_change(&mut self, snapshot: RoomSnapshot) {
        if let Some(room) = self.home.as_mut().and_then(|h| h.rooms.get_mut(&snapshot.room_id)) {
            room.mode = snapshot.mode;
            room.target_temperature = snapshot.target_temperature;
        }
    }

    pub fn stage_water_heater_mode(
        &mut self,
        room_id: &RoomId,
        mode: ContactorMode,
    ) -> Result<WaterHeaterSnapshot, ClientError> {
        let home = self.home.as_mut().ok_or(ClientError::TopologyNotLoaded)?;
        let heater = home.water_heaters.get_mut(room_id).ok_or_else(|| ClientError::Lookup {
            kind: "water heater",
            id: room_id.0.clone(),
        })?;
        let snapshot = WaterHeaterSnapshot {
            room_id: room_id.clone(),
            contactor_mode: heater.contactor_mode,
        };
        heater.contactor_mode = Some(mode);
        Ok(snapshot)
    }

    pub fn rollback_water_heater_mode(&mut self, snapshot: WaterHeaterSnapshot) {
        if let Some(heater) = self.home.as_mut().and_then(|h| h.water_heaters.get_mut(&snapshot.room_id)) {
            heater.contactor_mode = snapshot.contactor_mode;
        }
    }

    /// `set_setpoint` with the room shown in manual mode at `temperature` meanwhile.
    pub fn set_setpoint_optimistic(
        &mut self,
        room_id: &RoomId,
        temperature: f64,
        end_time: Option<i64>,
    ) -> Result<Value, ClientError> {
        let snapshot = self.stage_room_change(room_id, Some(SetpointMode::Manual), Some(temperature))?;
        match self.set_setpoint(room_id, temperature, end_time) {
            Ok(ack) => Ok(ack),
            Err(e) => {
                warn!("Setpoint for room {} failed, rolling back: {}", room_id, e);
                self.rollback_room_change(snapshot);
                Err(e)
            }
        }
    }

    pub fn set_mode_optimistic(
        &mut self,
        room_id: &RoomId,
        mode: &str,
        temperature: Option<f64>,
    ) -> Result<Value, ClientError> {
        let parsed = validate_room_mode(mode, temperature)?;
        let target = if parsed == SetpointMode::Manual { temperature } else { None };
        let snapshot = self.stage_room_change(room_id, Some(parsed), target)?;
        match self.set_mode(room_id, mode, temperature) {
            Ok(ack) => Ok(ack),
            Err(e) => {
                warn!("Mode change for room {} failed, rolling back: {}", room_id, e);
                self.rollback_room_change(snapshot);
                Err(e)
            }
        }
    }

    /// Contactor command for the water heater modeled under `room_id`.
    pub fn set_water_heater_mode_optimistic(&mut self, room_id: &RoomId, mode: &str) -> Result<Value, ClientError> {
        let parsed = validate_contactor_mode(mode)?;
        let heater_id = self
            .home
            .as_ref()
            .and_then(|h| h.water_heaters.get(room_id))
            .map(|w| w.id.clone())
            .ok_or_else(|| ClientError::Lookup {
                kind: "water heater",
                id: room_id.0.clone(),
            })?;
        let snapshot = self.stage_water_heater_mode(room_id, parsed)?;
        match self.set_water_heater_mode(&heater_id, mode) {
            Ok(ack) => Ok(ack),
            Err(e) => {
                warn!("Contactor mode for {} failed, rolling back: {}", heater_id, e);
                self.rollback_water_heater_mode(snapshot);
                Err(e)
            }
        }
    }
}
