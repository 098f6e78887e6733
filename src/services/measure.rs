use chrono::{Duration, Utc};
use serde_json::Value;

use crate::client::IntuisClient;
use crate::error::ClientError;
use crate::models::home::Home;
use crate::models::intuis::{MeasureHome, MeasureRequest, MeasureRoom};

pub const HOME_MEASURE_PATH: &str = "/api/gethomemeasure";
pub const DEFAULT_SCALE: &str = "30min";
const APP_IDENTIFIER: &str = "app_muller";
const MEASURE_TYPES: [&str; 6] = [
    "sum_energy_elec_hot_water",
    "sum_energy_elec_heating",
    "sum_energy_elec",
    "sum_energy_elec$0",
    "sum_energy_elec$1",
    "sum_energy_elec$2",
];

impl IntuisClient {
    /// Energy measurements for the last 24 hours at `scale` (e.g. "30min", "1hour", "1day").
    ///
    /// The response is returned as-is.
    pub fn home_measure(&self, scale: &str) -> Result<Value, ClientError> {
        let home = self.home.as_ref().ok_or(ClientError::TopologyNotLoaded)?;
        let end = Utc::now().timestamp();
        let body = measure_request(home, scale, end);
        self.post_json_value(HOME_MEASURE_PATH, &body)
    }
}

/// One entry per heated room, then one per water heater (by owning room).
pub fn measure_request(home: &Home, scale: &str, date_end: i64) -> MeasureRequest {
    let entry = |id| MeasureRoom {
        id,
        bridge: home.router_id.clone(),
        measure_types: MEASURE_TYPES.to_vec(),
    };
    let rooms = home
        .rooms
        .keys()
        .cloned()
        .chain(home.water_heaters.values().map(|w| w.room_id.clone()))
        .map(entry)
        .collect();

    MeasureRequest {
        date_begin: date_end - Duration::hours(24).num_seconds(),
        date_end,
        app_identifier: APP_IDENTIFIER,
        scale: scale.to_string(),
        real_time: true,
        home: MeasureHome {
            id: home.id.clone(),
            rooms,
        },
    }
}
