//! Client side of the EPOQ remote training session.
//!
//! A client pairs with a desktop training host from a scanned code, keeps one
//! WebSocket connection to it, mirrors its training progress in a
//! [`SessionState`] and sends it control commands through a [`CommandChannel`].

pub mod config;
pub mod error;
pub mod pairing;
pub mod protocol;
pub mod remote;
pub mod state;
pub mod transport;

pub use config::ClientConfig;
pub use error::{Result, SessionError};
pub use pairing::ConnectionDescriptor;
pub use remote::{CommandChannel, SessionHandle};
pub use state::{ConnectionPhase, Notice, SessionState, TrainingPhase};
