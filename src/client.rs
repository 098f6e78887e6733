//! Stateful blocking client for the Muller Intuitiv cloud API.
//!
//! - Blocking client using `ureq` (no async), one request at a time.
//! - Holds the token cache and the entity model; every operation takes the
//!   client by reference, so callers serialize access themselves.
//! - Operations live next to their concern: topology loading in
//!   `services::topology`, status sync in `services::status`, writes in
//!   `services::commands`.

use http::Response;
use log::debug;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::auth::{AuthManager, Credentials};
use crate::error::ClientError;
use crate::models::home::Home;
use crate::models::intuis::{HomeId, HomeStatus, RoomData};
use crate::services::status::SyncReport;

pub const DEFAULT_BASE_URL: &str = "https://app.muller-intuitiv.net";

pub(crate) fn new_agent() -> ureq::Agent {
    let config = ureq::Agent::config_builder().http_status_as_error(false).build();
    ureq::Agent::new_with_config(config)
}

fn read_body(resp: Result<Response<ureq::Body>, ureq::Error>) -> Result<String, ClientError> {
    let mut resp = resp.map_err(|e| ClientError::Transport(e.to_string()))?;
    let status = resp.status();
    let body = resp
        .body_mut()
        .read_to_string()
        .map_err(|e| ClientError::Transport(e.to_string()))?;
    if !status.is_success() {
        return Err(ClientError::Http {
            status: status.as_u16(),
            message: body,
        });
    }
    Ok(body)
}

/// Read a 2xx response into `T`, or fail with the status and body.
pub(crate) fn read_json<T: DeserializeOwned>(resp: Result<Response<ureq::Body>, ureq::Error>) -> Result<T, ClientError> {
    let body = read_body(resp)?;
    let de = &mut serde_json::Deserializer::from_str(&body);
    Ok(serde_path_to_error::deserialize(de)?)
}

/// Read a 2xx response as raw JSON. An empty body reads as `null`.
pub(crate) fn read_value(resp: Result<Response<ureq::Body>, ureq::Error>) -> Result<Value, ClientError> {
    let body = read_body(resp)?;
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&body)?)
}

/// Validate an already-received raw payload against a schema type.
pub(crate) fn parse_payload<T: DeserializeOwned>(raw: &Value) -> Result<T, ClientError> {
    Ok(serde_path_to_error::deserialize(raw)?)
}

pub struct IntuisClient {
    agent: ureq::Agent,
    base_url: String,
    auth: AuthManager,
    pub(crate) home: Option<Home>,
    /// Rooms of the modeled home as listed by topology, for name lookups.
    pub(crate) topology_rooms: Option<Vec<RoomData>>,
    /// Last status snapshot, kept for lookups.
    pub(crate) home_status: Option<HomeStatus>,
    pub(crate) last_sync: Option<SyncReport>,
}

impl IntuisClient {
    pub fn new(credentials: Credentials) -> Result<Self, ClientError> {
        Self::with_base_url(credentials, DEFAULT_BASE_URL)
    }

    /// No request is made here; the first token is fetched lazily.
    pub fn with_base_url(credentials: Credentials, base_url: impl Into<String>) -> Result<Self, ClientError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let auth = AuthManager::new(credentials, &base_url)?;
        Ok(IntuisClient {
            agent: new_agent(),
            base_url,
            auth,
            home: None,
            topology_rooms: None,
            home_status: None,
            last_sync: None,
        })
    }

    /// Current bearer token; reuses the cached one while it is valid.
    pub fn get_token(&self) -> Result<String, ClientError> {
        self.auth.get_token(&self.agent)
    }

    /// The modeled home, once topology has been loaded.
    pub fn home(&self) -> Option<&Home> {
        self.home.as_ref()
    }

    pub fn home_mut(&mut self) -> Option<&mut Home> {
        self.home.as_mut()
    }

    /// Outcome of the most recent status merge.
    pub fn last_sync_report(&self) -> Option<&SyncReport> {
        self.last_sync.as_ref()
    }

    pub(crate) fn home_id(&self) -> Result<HomeId, ClientError> {
        self.home.as_ref().map(|h| h.id.clone()).ok_or(ClientError::TopologyNotLoaded)
    }

    /// Load topology and then status.
    pub fn pull_data(&mut self) -> Result<(), ClientError> {
        self.load_topology()?;
        self.refresh_status()?;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn bearer(&self) -> Result<String, ClientError> {
        Ok(format!("Bearer {}", self.get_token()?))
    }

    pub(crate) fn get_value(&self, path: &str) -> Result<Value, ClientError> {
        let url = self.url(path);
        debug!("GET {}", url);
        let resp = self
            .agent
            .get(&url)
            .header("Accept", "application/json")
            .header("Authorization", &self.bearer()?)
            .call();
        read_value(resp)
    }

    pub(crate) fn post_form_value(&self, path: &str, form: &[(&str, &str)]) -> Result<Value, ClientError> {
        let url = self.url(path);
        debug!("POST (form) {}", url);
        let resp = self
            .agent
            .post(&url)
            .header("Accept", "application/json")
            .header("Authorization", &self.bearer()?)
            .send_form(form.iter().copied());
        read_value(resp)
    }

    pub(crate) fn post_json_value<B: Serialize>(&self, path: &str, body: &B) -> Result<Value, ClientError> {
        let url = self.url(path);
        debug!("POST (json) {}", url);
        let resp = self
            .agent
            .post(&url)
            .header("Accept", "application/json")
            .header("Authorization", &self.bearer()?)
            .send_json(body);
        read_value(resp)
    }
}
