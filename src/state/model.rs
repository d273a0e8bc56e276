use chrono::{DateTime, Local};

use crate::protocol::Severity;

/// Lifecycle of the connection to the desktop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionPhase {
    #[default]
    Disconnected,
    Connecting,
    Authenticating,
    Live,
    Reconnecting,
}

/// Whether the desktop is currently training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrainingPhase {
    #[default]
    Idle,
    Running,
}

/// One point of the accuracy/loss trend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricPoint {
    pub epoch: u32,
    pub accuracy: f64,
    pub loss: f64,
}

/// A single entry of the session console.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub severity: Severity,
    pub text: String,
}

/// A message that needs the user's acknowledgment, kept apart from the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The desktop refused a start because it is already training.
    TrainingBusy(String),
}

/// What the session runtime must do after the state absorbed an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Mark the transport as authenticated.
    GoLive,
    /// Drop the current connection.
    CloseConnection,
    /// Hand a notice to the presentation layer.
    Notify(Notice),
}
