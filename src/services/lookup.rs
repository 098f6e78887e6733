//! Reads against the last status snapshot.
//!
//! When no snapshot has been taken yet, one is fetched first.

use crate::client::IntuisClient;
use crate::error::ClientError;
use crate::models::intuis::{ContactorMode, HomeStatus, ModuleId, ModuleType, RoomId, RoomStatus, SetpointMode};

#[derive(Debug, Clone, PartialEq)]
pub struct RoomModeInfo {
    pub mode: Option<SetpointMode>,
    pub current_temperature: Option<f64>,
    pub target_temperature: Option<f64>,
    pub end_time: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoomSetpointInfo {
    pub target_temperature: Option<f64>,
    pub end_time: Option<i64>,
}

impl IntuisClient {
    fn snapshot(&mut self) -> Result<&HomeStatus, ClientError> {
        if self.home_status.is_none() {
            self.refresh_status()?;
        }
        self.home_status.as_ref().ok_or(ClientError::TopologyNotLoaded)
    }

    fn room_status(&mut self, room_id: &RoomId) -> Result<&RoomStatus, ClientError> {
        self.snapshot()?
            .rooms
            .iter()
            .find(|r| &r.id == room_id)
            .ok_or_else(|| ClientError::Lookup {
                kind: "room",
                id: room_id.0.clone(),
            })
    }

    pub fn room_mode(&mut self, room_id: &RoomId) -> Result<RoomModeInfo, ClientError> {
        let s = self.room_status(room_id)?;
        Ok(RoomModeInfo {
            mode: s.therm_setpoint_mode,
            current_temperature: s.therm_measured_temperature,
            target_temperature: s.therm_setpoint_temperature,
            end_time: s.therm_setpoint_end_time,
        })
    }

    pub fn room_setpoint(&mut self, room_id: &RoomId) -> Result<RoomSetpointInfo, ClientError> {
        let s = self.room_status(room_id)?;
        Ok(RoomSetpointInfo {
            target_temperature: s.therm_setpoint_temperature,
            end_time: s.therm_setpoint_end_time,
        })
    }

    pub fn room_temperature(&mut self, room_id: &RoomId) -> Result<Option<f64>, ClientError> {
        Ok(self.room_status(room_id)?.therm_measured_temperature)
    }

    /// Contactor mode of a water-heater module; `None` if the snapshot omits it.
    pub fn water_heater_mode(&mut self, heater_id: &ModuleId) -> Result<Option<ContactorMode>, ClientError> {
        self.snapshot()?
            .modules
            .iter()
            .find(|m| &m.id == heater_id && m.module_type == ModuleType::WaterHeater)
            .map(|m| m.contactor_mode)
            .ok_or_else(|| ClientError::Lookup {
                kind: "water heater",
                id: heater_id.0.clone(),
            })
    }
}
