use std::collections::VecDeque;

use chrono::Local;
use log::debug;

use super::model::{
    ConnectionPhase, Effect, LogEntry, MetricPoint, Notice, TrainingPhase,
};
use crate::{
    error::SessionError,
    protocol::{Artifact, ClassifiedEvent, Metrics, Severity},
};

/// Maximum amount of points kept for the trend chart.
pub const MAX_HISTORY: usize = 60;
/// Maximum amount of console lines kept.
pub const MAX_LOGS: usize = 300;

const DEFAULT_FINISHED: &str = "Training finished.";
const DEFAULT_BUSY: &str = "Training is already in progress on the desktop.";

/// Everything the client knows about the remote training session.
///
/// Mutated only through the reducer methods below; readers get clones.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    connection_phase: ConnectionPhase,
    training_phase: TrainingPhase,
    metrics: Metrics,
    metric_history: VecDeque<MetricPoint>,
    log: VecDeque<LogEntry>,
    dataset_path: Option<String>,
    latest_artifact: Option<Artifact>,
    last_error: Option<SessionError>,
    been_live: bool,
}

impl SessionState {
    /// Creates an empty state with no pairing.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_phase(&self) -> ConnectionPhase {
        self.connection_phase
    }

    pub fn training_phase(&self) -> TrainingPhase {
        self.training_phase
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn metric_history(&self) -> &VecDeque<MetricPoint> {
        &self.metric_history
    }

    pub fn log(&self) -> &VecDeque<LogEntry> {
        &self.log
    }

    pub fn dataset_path(&self) -> Option<&str> {
        self.dataset_path.as_deref()
    }

    pub fn latest_artifact(&self) -> Option<&Artifact> {
        self.latest_artifact.as_ref()
    }

    /// The most recent connection-level failure, cleared on authentication.
    pub fn last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }

    pub fn is_live(&self) -> bool {
        self.connection_phase == ConnectionPhase::Live
    }

    pub fn is_training(&self) -> bool {
        self.training_phase == TrainingPhase::Running
    }

    /// Fraction of the run completed, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        let Metrics {
            epoch,
            total_epochs,
            ..
        } = self.metrics;

        if total_epochs == 0 {
            return 0.0;
        }

        (epoch as f64 / total_epochs as f64).min(1.0)
    }

    /// Wipes everything and enters `Connecting` for a fresh pairing.
    pub fn begin_pairing(&mut self) {
        *self = Self {
            connection_phase: ConnectionPhase::Connecting,
            ..Self::default()
        };
    }

    /// The socket opened, the auth frame is on its way.
    pub fn transport_ready(&mut self) {
        self.connection_phase = ConnectionPhase::Authenticating;
    }

    /// The socket went away without the user asking for it.
    ///
    /// Keeps the last known metrics and training phase on display.
    pub fn transport_closed(&mut self, reason: Option<&str>) {
        self.connection_phase = ConnectionPhase::Reconnecting;

        let text = match reason {
            Some(reason) => format!("Connection error: {reason}"),
            None => "Connection closed".to_string(),
        };

        // A rejected token stays the reason shown to the user.
        if self.last_error != Some(SessionError::AuthFailed) {
            self.last_error = Some(SessionError::TransportClosed(
                reason.unwrap_or("closed by peer").to_string(),
            ));
        }
        self.push_log(Severity::Error, text);
    }

    /// The user ended the session.
    pub fn disconnect(&mut self) {
        *self = Self::default();
    }

    /// Removes the artifact from display and nothing else.
    pub fn dismiss_artifact(&mut self) {
        self.latest_artifact = None;
    }

    /// Appends a line produced by the client itself.
    pub fn record_local(&mut self, severity: Severity, text: impl Into<String>) {
        self.push_log(severity, text.into());
    }

    /// Applies one classified event coming from the desktop.
    ///
    /// # Returns
    /// The side effect the runtime has to carry out, if any.
    pub fn apply(&mut self, event: ClassifiedEvent) -> Option<Effect> {
        match event {
            ClassifiedEvent::AuthSucceeded => {
                self.connection_phase = ConnectionPhase::Live;
                self.been_live = true;
                self.last_error = None;
                self.push_log(Severity::Success, "Authenticated with desktop app".into());
                return Some(Effect::GoLive);
            }

            ClassifiedEvent::AuthFailed => {
                self.last_error = Some(SessionError::AuthFailed);
                self.push_log(
                    Severity::Error,
                    "Authentication failed, rescan the pairing code".into(),
                );
                return Some(Effect::CloseConnection);
            }

            ClassifiedEvent::TrainingProgress(metrics) => {
                if !self.been_live {
                    debug!("ignoring training progress before authentication");
                    return None;
                }

                self.training_phase = TrainingPhase::Running;
                self.metrics = metrics;
                push_bounded(
                    &mut self.metric_history,
                    MAX_HISTORY,
                    MetricPoint {
                        epoch: metrics.epoch,
                        accuracy: metrics.train_accuracy,
                        loss: metrics.train_loss,
                    },
                );
            }

            ClassifiedEvent::TrainingFinished { message } => {
                self.training_phase = TrainingPhase::Idle;
                let text = message.unwrap_or_else(|| DEFAULT_FINISHED.to_string());
                self.push_log(Severity::Success, text);
            }

            ClassifiedEvent::DatasetUpdate { path } => {
                match &path {
                    Some(path) => self.push_log(Severity::Success, format!("Dataset: {path}")),
                    None => self.push_log(Severity::Info, "No folder selected".into()),
                }
                self.dataset_path = path;
            }

            ClassifiedEvent::ArtifactReceived { data } => {
                self.latest_artifact = data;
                self.push_log(Severity::Success, "Confusion matrix received".into());
            }

            ClassifiedEvent::RejectedBusy { message } => {
                let message = message.unwrap_or_else(|| DEFAULT_BUSY.to_string());
                return Some(Effect::Notify(Notice::TrainingBusy(message)));
            }

            ClassifiedEvent::LogEvent { text, severity } => self.push_log(severity, text),

            ClassifiedEvent::UnclassifiedStructured => {}
        }

        None
    }

    fn push_log(&mut self, severity: Severity, text: String) {
        let entry = LogEntry {
            timestamp: Local::now(),
            severity,
            text,
        };
        push_bounded(&mut self.log, MAX_LOGS, entry);
    }
}

/// Evicts from the front first so the deque never exceeds `cap`.
fn push_bounded<T>(buf: &mut VecDeque<T>, cap: usize, item: T) {
    while buf.len() >= cap {
        buf.pop_front();
    }
    buf.push_back(item);
}
