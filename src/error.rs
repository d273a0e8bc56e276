use std::{error::Error, fmt};

/// The crate's result type.
pub type Result<T> = std::result::Result<T, SessionError>;

/// All errors that can be reported to a caller of the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// The pairing payload is malformed, the user must rescan.
    InvalidPairingPayload(String),
    /// The desktop rejected the token. Terminal for the connection attempt.
    AuthFailed,
    /// A command was attempted while the session is not live.
    NotConnected,
    /// A start was attempted while training is already running.
    AlreadyRunning,
    /// A training parameter could not be accepted.
    InvalidParameters { field: &'static str, value: String },
    /// The connection went away.
    TransportClosed(String),
    /// The session runtime is no longer running.
    Unavailable,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPairingPayload(msg) => write!(f, "invalid code: {msg}"),
            Self::AuthFailed => write!(f, "authentication failed, rescan the pairing code"),
            Self::NotConnected => write!(f, "not connected to the desktop"),
            Self::AlreadyRunning => write!(f, "a training session is already running"),
            Self::InvalidParameters { field, value } => {
                write!(f, "invalid value for {field}: {value:?}")
            }
            Self::TransportClosed(reason) => write!(f, "connection closed: {reason}"),
            Self::Unavailable => write!(f, "session runtime is not running"),
        }
    }
}

impl Error for SessionError {}

impl From<actix::MailboxError> for SessionError {
    fn from(_: actix::MailboxError) -> Self {
        Self::Unavailable
    }
}
