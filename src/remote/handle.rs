use actix::{Actor, Addr};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use super::{
    actor::{Disconnect, DismissArtifact, Pair, SessionActor, Snapshot},
    channel::CommandChannel,
};
use crate::{
    config::ClientConfig,
    error::Result,
    pairing::ConnectionDescriptor,
    state::{Notice, SessionState},
};

/// Cloneable access to the one session of this client.
///
/// Pass it to every surface that needs to read the session or issue commands.
#[derive(Clone)]
pub struct SessionHandle {
    addr: Addr<SessionActor>,
}

impl SessionHandle {
    /// Starts an idle session on the current arbiter.
    ///
    /// # Returns
    /// The handle and the receiving end of the notice channel.
    pub fn start(config: ClientConfig) -> (Self, UnboundedReceiver<Notice>) {
        let (notices, notices_rx) = mpsc::unbounded_channel();
        let addr = SessionActor::new(&config, notices).start();
        (Self { addr }, notices_rx)
    }

    /// Pairs with a new desktop, resetting the session and opening a new connection.
    pub async fn pair(&self, descriptor: ConnectionDescriptor) -> Result<()> {
        self.addr.send(Pair(descriptor)).await?;
        Ok(())
    }

    /// Decodes a scanned pairing payload and pairs with it.
    ///
    /// # Errors
    /// `InvalidPairingPayload` if the payload is not a valid code, in which case
    /// the current session is left untouched.
    pub async fn pair_payload(&self, payload: &str) -> Result<()> {
        let descriptor = ConnectionDescriptor::from_payload(payload)?;
        self.pair(descriptor).await
    }

    /// Ends the session and wipes its state.
    pub async fn disconnect(&self) -> Result<()> {
        self.addr.send(Disconnect).await?;
        Ok(())
    }

    /// Hides the latest artifact.
    pub async fn dismiss_artifact(&self) -> Result<()> {
        self.addr.send(DismissArtifact).await?;
        Ok(())
    }

    /// Returns a copy of the current session state.
    pub async fn snapshot(&self) -> Result<SessionState> {
        Ok(self.addr.send(Snapshot).await?)
    }

    pub fn commands(&self) -> CommandChannel {
        CommandChannel::new(self.addr.clone())
    }
}
