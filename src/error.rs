use core::fmt;
use std::error::Error;

/// Broad failure categories a caller can branch on.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Transport,
    Validation,
    Lookup,
}

/// Errors raised by [`crate::client::IntuisClient`] and its services.
#[derive(Debug)]
pub enum ClientError {
    /// Missing/incomplete credentials or an account without homes.
    Config(String),
    /// Connection-level failure (DNS, refused, TLS, reading the body).
    Transport(String),
    /// Non-2xx response; carries the original status and body.
    Http { status: u16, message: String },
    /// Body was not JSON at all.
    Json(serde_json::Error),
    /// Body was JSON but did not match the expected schema.
    Parse { path: String, source: serde_json::Error },
    /// Rejected before any request was sent.
    Validation(String),
    /// Id not present in the current status snapshot or entity maps.
    Lookup { kind: &'static str, id: String },
    /// An operation needing the home id ran before `load_topology`.
    TopologyNotLoaded,
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Config(_) | ClientError::TopologyNotLoaded => ErrorKind::Configuration,
            ClientError::Transport(_) | ClientError::Http { .. } | ClientError::Json(_) | ClientError::Parse { .. } => {
                ErrorKind::Transport
            }
            ClientError::Validation(_) => ErrorKind::Validation,
            ClientError::Lookup { .. } => ErrorKind::Lookup,
        }
    }

    /// HTTP status of a rejected request, if that is what this error is.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Config(s) => write!(f, "configuration error: {}", s),
            ClientError::Transport(s) => write!(f, "transport error: {}", s),
            ClientError::Http { status, message } => write!(f, "http {}: {}", status, message),
            ClientError::Json(e) => write!(f, "json error: {}", e),
            ClientError::Parse { path, source } => write!(f, "unexpected payload at {}: {}", path, source),
            ClientError::Validation(s) => write!(f, "invalid request: {}", s),
            ClientError::Lookup { kind, id } => write!(f, "{} {} not found", kind, id),
            ClientError::TopologyNotLoaded => write!(f, "topology not loaded; call load_topology() first"),
        }
    }
}

impl Error for ClientError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ClientError::Json(e) => Some(e),
            ClientError::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(value: serde_json::Error) -> Self {
        ClientError::Json(value)
    }
}

impl From<serde_path_to_error::Error<serde_json::Error>> for ClientError {
    fn from(value: serde_path_to_error::Error<serde_json::Error>) -> Self {
        let path = value.path().to_string();
        ClientError::Parse {
            path,
            source: value.into_inner(),
        }
    }
}
