use log::{debug, info, warn};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::client::{IntuisClient, parse_payload};
use crate::error::ClientError;
use crate::models::home::{Home, ModuleDescriptor, Room, WaterHeater};
use crate::models::intuis::{Envelope, HomeData, HomesData, ModuleData, ModuleId, ModuleType, RoomId};

pub const HOMES_DATA_PATH: &str = "/api/homesdata";

impl IntuisClient {
    /// Fetch the home/room/module graph and rebuild the entity model from it.
    ///
    /// Any previously modeled rooms and water heaters are replaced. Returns the
    /// raw payload.
    pub fn load_topology(&mut self) -> Result<Value, ClientError> {
        let raw = self.get_value(HOMES_DATA_PATH)?;
        let data: Envelope<HomesData> = parse_payload(&raw)?;
        let home = build_home(&data.body)?;
        info!(
            "Loaded home \"{}\" ({}): {} room(s), {} water heater(s)",
            home.name,
            home.id,
            home.rooms.len(),
            home.water_heaters.len()
        );
        self.home = Some(home);
        self.topology_rooms = data.body.homes.into_iter().next().map(|h| h.rooms);
        self.home_status = None;
        self.last_sync = None;
        Ok(raw)
    }

    /// Case-insensitive match on the topology's room names.
    pub fn room_id_by_name(&self, name: &str) -> Result<Option<RoomId>, ClientError> {
        let rooms = self.topology_rooms.as_ref().ok_or(ClientError::TopologyNotLoaded)?;
        let wanted = name.to_lowercase();
        Ok(rooms
            .iter()
            .find(|r| r.name.as_deref().map(str::to_lowercase).as_deref() == Some(wanted.as_str()))
            .map(|r| r.id.clone()))
    }
}

/// Build the entity model for the first home of the account.
pub fn build_home(data: &HomesData) -> Result<Home, ClientError> {
    let home = data
        .homes
        .first()
        .ok_or_else(|| ClientError::Config("account has no homes".to_string()))?;

    let router_id = home
        .modules
        .iter()
        .find(|m| m.module_type == ModuleType::Gateway)
        .map(|m| m.id.clone());

    let mut rooms = BTreeMap::new();
    let mut water_heaters = BTreeMap::new();
    for room in &home.rooms {
        if room.module_ids.is_empty() {
            continue;
        }
        let room_name = room.name.clone().unwrap_or_default();
        let mut heated: Option<Room> = None;
        let mut heater: Option<WaterHeater> = None;

        for module_id in &room.module_ids {
            let Some(module) = find_module(home, module_id) else {
                debug!("Room {}: bound module {} not listed in topology", room.id, module_id);
                continue;
            };
            match &module.module_type {
                ModuleType::Heating => {
                    heated
                        .get_or_insert_with(|| Room::new(room.id.clone(), room_name.clone(), room.room_type.clone()))
                        .add_module(ModuleDescriptor::from(module));
                }
                ModuleType::WaterHeater => {
                    if heater.is_none() {
                        heater = Some(WaterHeater::new(module.id.clone(), room.id.clone(), room_name.clone()));
                    } else {
                        debug!("Room {}: ignoring additional water heater {}", room.id, module.id);
                    }
                }
                other => {
                    warn!("Unknown module type {} for room {}", other, room_name);
                }
            }
        }

        if let Some(r) = heated {
            info!("Added room {} ({})", r.name, r.id);
            rooms.insert(room.id.clone(), r);
        }
        if let Some(w) = heater {
            info!("Added water heater {} in room {}", w.id, w.room_id);
            water_heaters.insert(room.id.clone(), w);
        }
    }

    Ok(Home {
        id: home.id.clone(),
        name: home.name.clone().unwrap_or_default(),
        router_id,
        rooms,
        water_heaters,
    })
}

fn find_module<'a>(home: &'a HomeData, id: &ModuleId) -> Option<&'a ModuleData> {
    home.modules.iter().find(|m| &m.id == id)
}
