//! Blocking client for the Muller Intuitiv (Netatmo) heating cloud API.
//!
//! Load the topology once, then refresh status as often as needed:
//!
//! ```no_run
//! use intuis_netatmo::auth::Credentials;
//! use intuis_netatmo::client::IntuisClient;
//!
//! let creds = Credentials::new("me@example.com", "password", "client-id", "client-secret");
//! let mut client = IntuisClient::new(creds)?;
//! client.load_topology()?;
//! client.refresh_status()?;
//! if let Some(home) = client.home() {
//!     println!("{home}");
//! }
//! # Ok::<(), intuis_netatmo::error::ClientError>(())
//! ```

pub mod models {
    pub mod home;
    pub mod intuis;
}

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod services {
    pub mod commands;
    pub mod lookup;
    pub mod measure;
    pub mod optimistic;
    pub mod poll;
    pub mod status;
    pub mod topology;
}

pub use auth::Credentials;
pub use client::IntuisClient;
pub use error::{ClientError, ErrorKind};
