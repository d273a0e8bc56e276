use actix::Addr;

use super::actor::{Intent, RawParams, SessionActor};
use crate::{error::Result, protocol::TrainingParams};

/// Turns user intents into commands for the desktop.
///
/// Every call is validated against the session before anything is sent, and
/// every rejection comes back to the caller; nothing is queued or retried.
#[derive(Clone)]
pub struct CommandChannel {
    addr: Addr<SessionActor>,
}

impl CommandChannel {
    pub(super) fn new(addr: Addr<SessionActor>) -> Self {
        Self { addr }
    }

    /// Asks the desktop to start training.
    ///
    /// # Errors
    /// * `AlreadyRunning` - The desktop is training already.
    /// * `InvalidParameters` - Any of the values is not acceptable.
    /// * `NotConnected` - The session is not live.
    pub async fn start_training(
        &self,
        epochs: &str,
        batch_size: &str,
        learning_rate: &str,
        model: &str,
    ) -> Result<()> {
        let raw = raw_params(epochs, batch_size, learning_rate, model);
        self.addr.send(Intent::Start(raw)).await?
    }

    /// Applies new parameters to the current run without restarting it.
    ///
    /// # Errors
    /// * `InvalidParameters` - Any of the values is not acceptable.
    /// * `NotConnected` - The session is not live.
    pub async fn adjust_params(
        &self,
        epochs: &str,
        batch_size: &str,
        learning_rate: &str,
        model: &str,
    ) -> Result<()> {
        let raw = raw_params(epochs, batch_size, learning_rate, model);
        self.addr.send(Intent::Adjust(raw)).await?
    }

    /// Same as [`start_training`](Self::start_training) for parameters that
    /// were already built, e.g. from a [`Preset`](crate::protocol::Preset).
    pub async fn start_with(&self, params: &TrainingParams) -> Result<()> {
        self.addr.send(Intent::Start(params.into())).await?
    }

    /// Same as [`adjust_params`](Self::adjust_params) for parameters that
    /// were already built.
    pub async fn adjust_with(&self, params: &TrainingParams) -> Result<()> {
        self.addr.send(Intent::Adjust(params.into())).await?
    }

    /// Asks the desktop to halt the current run.
    pub async fn stop_training(&self) -> Result<()> {
        self.addr.send(Intent::Stop).await?
    }

    /// Asks the desktop to open its own folder picker.
    pub async fn select_dataset(&self) -> Result<()> {
        self.addr.send(Intent::SelectDataset).await?
    }
}

fn raw_params(epochs: &str, batch_size: &str, learning_rate: &str, model: &str) -> RawParams {
    RawParams {
        epochs: epochs.to_string(),
        batch_size: batch_size.to_string(),
        learning_rate: learning_rate.to_string(),
        model: model.to_string(),
    }
}
