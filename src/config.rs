use std::{env, time::Duration};

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Env var overriding the connect timeout, in whole seconds.
pub const CONNECT_TIMEOUT_VAR: &str = "EPOQ_CONNECT_TIMEOUT_SECS";

/// Tunables of the client side of a session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    connect_timeout: Duration,
}

impl ClientConfig {
    /// Creates a new client configuration.
    ///
    /// # Args
    /// * `connect_timeout` - How long to wait for the socket to open before giving up.
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    /// Reads the configuration from the environment, falling back to defaults
    /// for unset or unparsable values.
    pub fn from_env() -> Self {
        let connect_timeout = env::var(CONNECT_TIMEOUT_VAR)
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT);

        Self { connect_timeout }
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}
