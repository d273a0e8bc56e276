//! Connection descriptors decoded from the desktop's pairing code.

use std::{fmt, str::FromStr};

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, SessionError};

/// The payload encoded in the pairing code shown by the desktop.
#[derive(Deserialize)]
struct PairingPayload {
    ip: Option<String>,
    port: Option<PortField>,
    token: Option<String>,
}

/// Desktop builds disagree on whether the port is a number or a string.
#[derive(Deserialize)]
#[serde(untagged)]
enum PortField {
    Number(u64),
    Text(String),
}

/// Where and how to reach one desktop training host.
///
/// Created once per pairing and never mutated; a new pairing replaces it.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    host: String,
    port: u16,
    token: String,
}

impl ConnectionDescriptor {
    /// Creates a new `ConnectionDescriptor`.
    ///
    /// # Errors
    /// Returns `InvalidPairingPayload` if the host or token are empty or the port is zero.
    pub fn new(host: impl Into<String>, port: u16, token: impl Into<String>) -> Result<Self> {
        let host = host.into();
        let token = token.into();

        if host.trim().is_empty() {
            return Err(invalid("missing ip"));
        }
        if port == 0 {
            return Err(invalid("port must be between 1 and 65535"));
        }
        if token.is_empty() {
            return Err(invalid("missing token"));
        }

        Ok(Self { host, port, token })
    }

    /// Parses the JSON pairing payload `{ip, port, token}`.
    ///
    /// The port may be sent either as a number or as a string.
    ///
    /// # Errors
    /// Returns `InvalidPairingPayload` for anything that isn't a complete payload.
    pub fn from_payload(payload: &str) -> Result<Self> {
        let val: Value = serde_json::from_str(payload.trim())
            .map_err(|e| invalid(&format!("not a pairing code: {e}")))?;
        if !val.is_object() {
            return Err(invalid("not a pairing code"));
        }

        let PairingPayload { ip, port, token } = serde_json::from_value(val)
            .map_err(|e| invalid(&format!("not a pairing code: {e}")))?;

        let host = ip.ok_or_else(|| invalid("missing ip"))?;
        let token = token.ok_or_else(|| invalid("missing token"))?;
        let port = match port.ok_or_else(|| invalid("missing port"))? {
            PortField::Number(n) => Some(n),
            PortField::Text(s) => s.trim().parse::<u64>().ok(),
        }
        .and_then(|p| u16::try_from(p).ok())
        .ok_or_else(|| invalid("port must be between 1 and 65535"))?;

        Self::new(host, port, token)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the WebSocket endpoint served by the desktop app.
    pub fn url(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("ws://[{}]:{}", self.host, self.port)
        } else {
            format!("ws://{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for ConnectionDescriptor {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_payload(s)
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("token", &"<redacted>")
            .finish()
    }
}

fn invalid(msg: &str) -> SessionError {
    SessionError::InvalidPairingPayload(msg.to_string())
}
