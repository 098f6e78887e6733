//! Runtime configuration for the binary.
//! Credentials come from the environment, falling back to a `secrets.json` file.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::auth::Credentials;
use crate::client::DEFAULT_BASE_URL;
use crate::services::measure::DEFAULT_SCALE;

pub const DEFAULT_SECRETS_FILE: &str = "secrets.json";
pub const DEFAULT_POLL_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub base_url: String,
    /// Status polling cadence.
    pub poll_interval: Duration,
    pub poll_enabled: bool,
    /// Scale used for the start-up measurement pull (e.g. "30min").
    pub measure_scale: String,
}

/// Layout of `secrets.json`.
#[derive(Debug, Default, Deserialize)]
struct Secrets {
    username: Option<String>,
    password: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
}

impl Config {
    pub fn from_env(secrets_override: Option<&Path>) -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok(), secrets_override)
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(get: F, secrets_override: Option<&Path>) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let from_env = Secrets {
            username: var("INTUIS_USERNAME"),
            password: var("INTUIS_PASSWORD"),
            client_id: var("INTUIS_CLIENT_ID"),
            client_secret: var("INTUIS_CLIENT_SECRET"),
        };
        let secrets = if from_env.is_complete() {
            from_env
        } else {
            let path = secrets_override
                .map(Path::to_path_buf)
                .or_else(|| var("INTUIS_SECRETS_FILE").map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SECRETS_FILE));
            let text = fs::read_to_string(&path).map_err(|e| {
                format!(
                    "Missing credentials: set INTUIS_USERNAME, INTUIS_PASSWORD, INTUIS_CLIENT_ID and INTUIS_CLIENT_SECRET, or provide {} ({})",
                    path.display(),
                    e
                )
            })?;
            from_env.or(parse_secrets(&text)?)
        };
        let credentials = secrets.into_credentials()?;

        let base_url = var("INTUIS_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let poll_secs = match var("POLL_INTERVAL_SECS") {
            Some(s) => s
                .parse::<u64>()
                .map_err(|_| "POLL_INTERVAL_SECS must be a whole number of seconds".to_string())?,
            None => DEFAULT_POLL_SECS,
        };

        let poll_enabled = var("POLL_ENABLED")
            .map(|s| matches!(s.as_str(), "1" | "true" | "TRUE"))
            .unwrap_or(true);

        let measure_scale = var("MEASURE_SCALE").unwrap_or_else(|| DEFAULT_SCALE.to_string());

        Ok(Config {
            credentials,
            base_url,
            poll_interval: Duration::from_secs(poll_secs),
            poll_enabled,
            measure_scale,
        })
    }
}

impl Secrets {
    fn is_complete(&self) -> bool {
        self.username.is_some() && self.password.is_some() && self.client_id.is_some() && self.client_secret.is_some()
    }

    /// Environment values win; the file fills the gaps.
    fn or(self, file: Secrets) -> Secrets {
        Secrets {
            username: self.username.or(file.username),
            password: self.password.or(file.password),
            client_id: self.client_id.or(file.client_id),
            client_secret: self.client_secret.or(file.client_secret),
        }
    }

    fn into_credentials(self) -> Result<Credentials, String> {
        let credentials = Credentials::new(
            self.username.unwrap_or_default(),
            self.password.unwrap_or_default(),
            self.client_id.unwrap_or_default(),
            self.client_secret.unwrap_or_default(),
        );
        credentials.validate().map_err(|e| e.to_string())?;
        Ok(credentials)
    }
}

fn parse_secrets(text: &str) -> Result<Secrets, String> {
    serde_json::from_str(text).map_err(|e| format!("secrets file is not valid JSON: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    const FULL: [(&str, &str); 4] = [
        ("INTUIS_USERNAME", "me@example.com"),
        ("INTUIS_PASSWORD", "pw"),
        ("INTUIS_CLIENT_ID", "id"),
        ("INTUIS_CLIENT_SECRET", "secret"),
    ];

    #[test]
    fn credentials_from_environment_with_defaults() {
        let cfg = Config::from_lookup(lookup(&FULL), None).unwrap();
        assert_eq!(cfg.credentials.username, "me@example.com");
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.poll_interval, Duration::from_secs(DEFAULT_POLL_SECS));
        assert!(cfg.poll_enabled);
        assert_eq!(cfg.measure_scale, "30min");
    }

    #[test]
    fn overrides() {
        let mut pairs = FULL.to_vec();
        pairs.extend([
            ("INTUIS_BASE_URL", "http://127.0.0.1:8080"),
            ("POLL_INTERVAL_SECS", "15"),
            ("POLL_ENABLED", "false"),
        ]);
        let cfg = Config::from_lookup(lookup(&pairs), None).unwrap();
        assert_eq!(cfg.base_url, "http://127.0.0.1:8080");
        assert_eq!(cfg.poll_interval, Duration::from_secs(15));
        assert!(!cfg.poll_enabled);
    }

    #[test]
    fn bad_interval_is_rejected() {
        let mut pairs = FULL.to_vec();
        pairs.push(("POLL_INTERVAL_SECS", "soon"));
        assert!(Config::from_lookup(lookup(&pairs), None).is_err());
    }

    #[test]
    fn missing_secrets_file_is_an_error() {
        let err = Config::from_lookup(lookup(&[]), Some(Path::new("/nonexistent/secrets.json"))).unwrap_err();
        assert!(err.starts_with("Missing credentials"));
    }

    #[test]
    fn secrets_file_fills_gaps() {
        let file = parse_secrets(r#"{"username":"file-user","password":"file-pw","client_id":"cid","client_secret":"cs"}"#)
            .unwrap();
        let env = Secrets {
            username: Some("env-user".into()),
            ..Secrets::default()
        };
        let creds = env.or(file).into_credentials().unwrap();
        assert_eq!(creds.username, "env-user");
        assert_eq!(creds.password, "file-pw");
    }

    #[test]
    fn incomplete_secrets_are_rejected() {
        let file = parse_secrets(r#"{"username":"u","password":"p"}"#).unwrap();
        let err = file.into_credentials().unwrap_err();
        assert!(err.contains("client_id"));
    }
}
