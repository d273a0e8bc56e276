use actix::prelude::*;
use log::{debug, info, warn};
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    config::ClientConfig,
    error::{Result, SessionError},
    pairing::ConnectionDescriptor,
    protocol::{decode_frame, Command, Severity, TrainingParams},
    state::{Effect, Notice, SessionState},
    transport::{LinkSignal, SessionTransport},
};

/* -------------------------------------------------------------------------- */
/*                               Actix messages                               */
/* -------------------------------------------------------------------------- */

/// Start a new session, discarding whatever came before.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Pair(pub ConnectionDescriptor);

/// User-initiated end of the session.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect;

#[derive(Message)]
#[rtype(result = "()")]
pub struct DismissArtifact;

/// Read access for the presentation layer.
#[derive(Message)]
#[rtype(result = "SessionState")]
pub struct Snapshot;

/// A user intent, checked against the current phases before anything is sent.
#[derive(Debug, Message)]
#[rtype(result = "crate::error::Result<()>")]
pub enum Intent {
    Start(RawParams),
    Adjust(RawParams),
    Stop,
    SelectDataset,
}

/// Training parameters exactly as the user typed them.
#[derive(Debug)]
pub struct RawParams {
    pub epochs: String,
    pub batch_size: String,
    pub learning_rate: String,
    pub model: String,
}

impl From<&TrainingParams> for RawParams {
    fn from(params: &TrainingParams) -> Self {
        Self {
            epochs: params.epochs.to_string(),
            batch_size: params.batch_size.to_string(),
            learning_rate: params.learning_rate.to_string(),
            model: params.model.as_str().to_string(),
        }
    }
}

impl RawParams {
    fn parse(&self) -> Result<TrainingParams> {
        TrainingParams::parse(
            &self.epochs,
            &self.batch_size,
            &self.learning_rate,
            &self.model,
        )
    }
}

/* -------------------------------------------------------------------------- */
/*                                Session actor                               */
/* -------------------------------------------------------------------------- */

/// The single writer of a [`SessionState`].
///
/// Transport signals and user intents all go through this actor's mailbox,
/// so frames are applied strictly in arrival order.
pub struct SessionActor {
    state: SessionState,
    transport: SessionTransport,
    notices: UnboundedSender<Notice>,
}

impl SessionActor {
    pub fn new(config: &ClientConfig, notices: UnboundedSender<Notice>) -> Self {
        Self {
            state: SessionState::new(),
            transport: SessionTransport::new(config.connect_timeout()),
            notices,
        }
    }

    fn on_frame(&mut self, text: &str) {
        for event in decode_frame(text) {
            match self.state.apply(event) {
                Some(Effect::GoLive) => {
                    info!("session is live");
                    self.transport.mark_live();
                }
                Some(Effect::CloseConnection) => {
                    warn!("desktop rejected the token");
                    self.transport.abort();
                }
                Some(Effect::Notify(notice)) => {
                    if self.notices.send(notice).is_err() {
                        debug!("no one is listening for notices");
                    }
                }
                None => {}
            }
        }
    }

    fn issue(&mut self, intent: Intent) -> Result<()> {
        let command = match intent {
            Intent::Start(_) if self.state.is_training() => {
                return Err(SessionError::AlreadyRunning);
            }
            Intent::Start(raw) => Command::StartTraining(raw.parse()?),
            Intent::Adjust(raw) => Command::AdjustParams(raw.parse()?),
            Intent::Stop => Command::StopTraining,
            Intent::SelectDataset => Command::SelectDataset,
        };

        self.transport.send(command.encode())?;

        match command {
            Command::StopTraining => self
                .state
                .record_local(Severity::Info, "Stop command sent to desktop"),
            Command::StartTraining(params) => self.state.record_local(
                Severity::Info,
                format!(
                    "Start requested: {} for {} epochs (batch {}, lr {})",
                    params.model, params.epochs, params.batch_size, params.learning_rate
                ),
            ),
            _ => {}
        }

        Ok(())
    }
}

impl Actor for SessionActor {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        debug!("session actor started");
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        self.transport.close();
        debug!("session actor stopped");
    }
}

impl Handler<Pair> for SessionActor {
    type Result = ();

    fn handle(&mut self, msg: Pair, ctx: &mut Self::Context) {
        let descriptor = msg.0;
        info!("pairing with {}:{}", descriptor.host(), descriptor.port());

        self.state.begin_pairing();
        self.transport
            .open(descriptor, ctx.address().recipient::<LinkSignal>());
    }
}

impl Handler<LinkSignal> for SessionActor {
    type Result = ();

    fn handle(&mut self, msg: LinkSignal, _ctx: &mut Self::Context) {
        if !self.transport.is_current(msg.generation()) {
            debug!(generation = msg.generation(); "dropping signal from stale connection");
            return;
        }

        match msg {
            LinkSignal::Ready { .. } => {
                self.state.transport_ready();
                if let Err(e) = self.transport.authenticate() {
                    warn!("failed to send auth frame: {e}");
                }
            }
            LinkSignal::Frame { text, .. } => self.on_frame(&text),
            LinkSignal::Closed { reason, .. } => {
                self.transport.on_closed();
                self.state.transport_closed(reason.as_deref());
            }
        }
    }
}

impl Handler<Intent> for SessionActor {
    type Result = Result<()>;

    fn handle(&mut self, msg: Intent, _ctx: &mut Self::Context) -> Self::Result {
        debug!("issuing {msg:?}");
        self.issue(msg)
    }
}

impl Handler<Disconnect> for SessionActor {
    type Result = ();

    fn handle(&mut self, _msg: Disconnect, _ctx: &mut Self::Context) {
        info!("disconnect requested");
        self.transport.close();
        self.state.disconnect();
    }
}

impl Handler<DismissArtifact> for SessionActor {
    type Result = ();

    fn handle(&mut self, _msg: DismissArtifact, _ctx: &mut Self::Context) {
        self.state.dismiss_artifact();
    }
}

impl Handler<Snapshot> for SessionActor {
    type Result = MessageResult<Snapshot>;

    fn handle(&mut self, _msg: Snapshot, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.state.clone())
    }
}
