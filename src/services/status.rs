use log::{debug, warn};
use serde_json::Value;

use crate::client::{IntuisClient, parse_payload};
use crate::error::ClientError;
use crate::models::home::Home;
use crate::models::intuis::{Envelope, HomeStatus, HomeStatusBody, ModuleId, ModuleType, RoomId};

pub const GET_CONFIGS_PATH: &str = "/syncapi/v1/getconfigs";
pub const HOME_STATUS_PATH: &str = "/syncapi/v1/homestatus";

/// What a status merge touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub updated_rooms: Vec<RoomId>,
    pub updated_water_heaters: Vec<ModuleId>,
    /// Modeled rooms with no entry in the snapshot; left unchanged.
    pub unmatched_rooms: Vec<RoomId>,
    /// Modeled water heaters with no water-heater module in the snapshot.
    pub unmatched_water_heaters: Vec<ModuleId>,
}

impl SyncReport {
    pub fn has_warnings(&self) -> bool {
        !self.unmatched_rooms.is_empty() || !self.unmatched_water_heaters.is_empty()
    }
}

impl IntuisClient {
    /// Pull live status and merge it into the modeled rooms and water heaters.
    ///
    /// A config pull is issued first (its body is discarded). Returns the raw
    /// status payload.
    pub fn refresh_status(&mut self) -> Result<Value, ClientError> {
        let home_id = self.home_id()?;
        let form = [("home_id", home_id.0.as_str())];

        self.post_form_value(GET_CONFIGS_PATH, &form)?;
        let raw = self.post_form_value(HOME_STATUS_PATH, &form)?;
        let status: Envelope<HomeStatusBody> = parse_payload(&raw)?;

        if let Some(home) = self.home.as_mut() {
            let report = merge_status(home, &status.body.home);
            debug!(
                "Status merged: {} room(s), {} water heater(s) updated",
                report.updated_rooms.len(),
                report.updated_water_heaters.len()
            );
            self.last_sync = Some(report);
        }
        self.home_status = Some(status.body.home);
        Ok(raw)
    }
}

/// Merge a status snapshot into `home` by id.
///
/// Entities without a matching entry keep their previous state.
pub fn merge_status(home: &mut Home, status: &HomeStatus) -> SyncReport {
    let mut report = SyncReport::default();

    for room in home.rooms.values_mut() {
        match status.rooms.iter().find(|r| r.id == room.id) {
            Some(s) => {
                room.apply_status(s);
                report.updated_rooms.push(room.id.clone());
            }
            None => {
                warn!("No status found for room {}", room.id);
                report.unmatched_rooms.push(room.id.clone());
            }
        }
    }

    for heater in home.water_heaters.values_mut() {
        let found = status
            .modules
            .iter()
            .find(|m| m.id == heater.id && m.module_type == ModuleType::WaterHeater);
        match found {
            Some(s) => {
                heater.apply_status(s);
                report.updated_water_heaters.push(heater.id.clone());
            }
            None => {
                warn!("No status found for water heater {}", heater.id);
                report.unmatched_water_heaters.push(heater.id.clone());
            }
        }
    }

    report
}
