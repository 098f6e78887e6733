//! Bearer-token lifecycle.
//!
//! Performs an OAuth2 password grant against the Intuis token endpoint and
//! caches the result for a fixed hour. The server's `expires_in` is not read,
//! and the refresh token is stored but never used for a refresh grant: once
//! the hour is up a fresh password grant is made. A 401 caused by early
//! server-side expiry is not retried.

use log::debug;
use std::cell::RefCell;
use std::time::{Duration, Instant};

use crate::client::read_json;
use crate::error::ClientError;
use crate::models::intuis::TokenResponse;

pub const TOKEN_PATH: &str = "/oauth2/token";
/// Assumed lifetime of every issued token.
pub const TOKEN_LIFETIME: Duration = Duration::from_secs(3600);
const OAUTH_SCOPE: &str = "read_muller write_muller";
/// White-label brand the account belongs to.
const USER_PREFIX: &str = "muller";

/// Account credentials plus the app's OAuth client registration.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Credentials {
            username: username.into(),
            password: password.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        let missing: Vec<&str> = [
            ("username", &self.username),
            ("password", &self.password),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ClientError::Config(format!("missing credentials: {}", missing.join(", "))))
        }
    }
}

// Keep secrets out of debug output.
impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct AuthToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Instant,
}

impl AuthToken {
    pub fn is_valid_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

pub struct AuthManager {
    credentials: Credentials,
    token_url: String,
    token: RefCell<Option<AuthToken>>,
}

impl AuthManager {
    pub fn new(credentials: Credentials, base_url: &str) -> Result<Self, ClientError> {
        credentials.validate()?;
        Ok(AuthManager {
            credentials,
            token_url: format!("{}{}", base_url.trim_end_matches('/'), TOKEN_PATH),
            token: RefCell::new(None),
        })
    }

    /// Cached access token, or a freshly granted one if the cache is empty or expired.
    pub fn get_token(&self, agent: &ureq::Agent) -> Result<String, ClientError> {
        self.get_token_at(agent, Instant::now())
    }

    pub(crate) fn get_token_at(&self, agent: &ureq::Agent, now: Instant) -> Result<String, ClientError> {
        if let Some(t) = self.token.borrow().as_ref() {
            if t.is_valid_at(now) {
                return Ok(t.access_token.clone());
            }
        }

        let granted = self.password_grant(agent)?;
        let token = AuthToken {
            access_token: granted.access_token,
            refresh_token: granted.refresh_token,
            expires_at: now + TOKEN_LIFETIME,
        };
        let access = token.access_token.clone();
        *self.token.borrow_mut() = Some(token);
        Ok(access)
    }

    pub fn token_expiry(&self) -> Option<Instant> {
        self.token.borrow().as_ref().map(|t| t.expires_at)
    }

    /// Stored for reference only; see the module docs.
    pub fn refresh_token(&self) -> Option<String> {
        self.token.borrow().as_ref().and_then(|t| t.refresh_token.clone())
    }

    fn password_grant(&self, agent: &ureq::Agent) -> Result<TokenResponse, ClientError> {
        debug!("Requesting access token for {}", self.credentials.username);
        let c = &self.credentials;
        let resp = agent
            .post(&self.token_url)
            .header("Accept", "application/json")
            .send_form([
                ("client_id", c.client_id.as_str()),
                ("client_secret", c.client_secret.as_str()),
                ("grant_type", "password"),
                ("user_prefix", USER_PREFIX),
                ("scope", OAUTH_SCOPE),
                ("username", c.username.as_str()),
                ("password", c.password.as_str()),
            ]);
        read_json(resp)
    }
}
