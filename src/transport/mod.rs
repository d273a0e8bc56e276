//! Ownership of the single connection to the desktop.

mod link;

use std::time::Duration;

use actix::Recipient;
use log::{debug, info};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_util::sync::CancellationToken;

pub use link::LinkSignal;
use link::LinkTask;

use crate::{
    error::{Result, SessionError},
    pairing::ConnectionDescriptor,
    protocol::Command,
};

struct Link {
    descriptor: ConnectionDescriptor,
    outbound: UnboundedSender<String>,
    cancel: CancellationToken,
}

/// Holds at most one connection at a time.
///
/// The socket itself lives in a task spawned on the current arbiter; this
/// type keeps the handles to feed it frames and to tear it down.
pub struct SessionTransport {
    connect_timeout: Duration,
    generation: u64,
    link: Option<Link>,
    live: bool,
}

impl SessionTransport {
    /// Creates a new `SessionTransport` without any connection.
    ///
    /// # Args
    /// * `connect_timeout` - Upper bound for each connection attempt.
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            generation: 0,
            link: None,
            live: false,
        }
    }

    /// Closes any existing connection and starts connecting to `descriptor`.
    ///
    /// Must be called from within an actix arbiter.
    ///
    /// # Args
    /// * `descriptor` - Where to connect.
    /// * `signals` - Receives every [`LinkSignal`] of the new connection.
    ///
    /// # Returns
    /// The generation tagging the new connection's signals.
    pub fn open(&mut self, descriptor: ConnectionDescriptor, signals: Recipient<LinkSignal>) -> u64 {
        self.close();
        self.generation += 1;

        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let url = descriptor.url();

        info!(generation = self.generation; "connecting to {url}");

        let task = LinkTask {
            url,
            generation: self.generation,
            connect_timeout: self.connect_timeout,
            outbound: outbound_rx,
            cancel: cancel.clone(),
            signals,
        };
        actix_rt::spawn(task.run());

        self.link = Some(Link {
            descriptor,
            outbound,
            cancel,
        });

        self.generation
    }

    /// Whether `generation` belongs to the connection currently held.
    pub fn is_current(&self, generation: u64) -> bool {
        self.link.is_some() && generation == self.generation
    }

    /// Whether the socket is open and authenticated.
    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Sends the auth frame for the current connection.
    ///
    /// This is the only frame allowed out before the session is live.
    pub fn authenticate(&self) -> Result<()> {
        let link = self.link.as_ref().ok_or(SessionError::NotConnected)?;
        let frame = Command::Auth {
            token: link.descriptor.token().to_string(),
        }
        .encode();

        Self::push(link, frame)
    }

    /// The desktop accepted our token.
    pub fn mark_live(&mut self) {
        if self.link.is_some() {
            self.live = true;
        }
    }

    /// Hands an encoded frame to the connection.
    ///
    /// # Errors
    /// `NotConnected` unless the connection is open and authenticated. A
    /// connection whose task already ended counts as closed even if its
    /// `Closed` signal hasn't been processed yet.
    pub fn send(&mut self, frame: String) -> Result<()> {
        let res = match &self.link {
            Some(link) if self.live => Self::push(link, frame),
            _ => Err(SessionError::NotConnected),
        };

        if res.is_err() {
            self.live = false;
        }
        res
    }

    /// Tears the socket down but still expects its `Closed` signal.
    pub fn abort(&mut self) {
        self.live = false;
        if let Some(link) = &self.link {
            debug!(generation = self.generation; "aborting connection");
            link.cancel.cancel();
        }
    }

    /// Forgets the connection once its `Closed` signal arrived.
    pub fn on_closed(&mut self) {
        self.live = false;
        self.link = None;
    }

    /// Closes the connection and ignores anything it may still report.
    ///
    /// Idempotent.
    pub fn close(&mut self) {
        self.live = false;
        if let Some(link) = self.link.take() {
            debug!(generation = self.generation; "closing connection");
            link.cancel.cancel();
        }
    }

    fn push(link: &Link, frame: String) -> Result<()> {
        link.outbound
            .send(frame)
            .map_err(|_| SessionError::NotConnected)
    }
}

impl Drop for SessionTransport {
    fn drop(&mut self) {
        self.close();
    }
}
