//! The I/O task behind one WebSocket connection.

use std::time::Duration;

use actix::{Message, Recipient};
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use tokio::{sync::mpsc::UnboundedReceiver, time};
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use tokio_util::sync::CancellationToken;

/// Signals a connection reports back to its owner, tagged with the
/// generation of the connection that produced them.
#[derive(Debug, Message)]
#[rtype(result = "()")]
pub enum LinkSignal {
    /// The socket is open.
    Ready { generation: u64 },
    /// A text frame arrived.
    Frame { generation: u64, text: String },
    /// The socket is gone. `reason` is `None` for orderly closes.
    Closed {
        generation: u64,
        reason: Option<String>,
    },
}

impl LinkSignal {
    pub fn generation(&self) -> u64 {
        match self {
            LinkSignal::Ready { generation }
            | LinkSignal::Frame { generation, .. }
            | LinkSignal::Closed { generation, .. } => *generation,
        }
    }
}

/// Owns the socket for the lifetime of one connection attempt.
pub(super) struct LinkTask {
    pub(super) url: String,
    pub(super) generation: u64,
    pub(super) connect_timeout: Duration,
    pub(super) outbound: UnboundedReceiver<String>,
    pub(super) cancel: CancellationToken,
    pub(super) signals: Recipient<LinkSignal>,
}

impl LinkTask {
    /// Connects, pumps frames both ways and always finishes with a `Closed` signal.
    pub(super) async fn run(mut self) {
        let reason = self.drive().await;

        match &reason {
            Some(reason) => warn!(generation = self.generation; "connection to {} failed: {reason}", self.url),
            None => info!(generation = self.generation; "connection to {} closed", self.url),
        }

        self.signals.do_send(LinkSignal::Closed {
            generation: self.generation,
            reason,
        });
    }

    async fn drive(&mut self) -> Option<String> {
        let generation = self.generation;
        let connect = time::timeout(self.connect_timeout, connect_async(self.url.as_str()));

        let stream = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return None,
            res = connect => match res {
                Ok(Ok((stream, _))) => stream,
                Ok(Err(e)) => return Some(e.to_string()),
                Err(_) => return Some(format!("timed out after {:?}", self.connect_timeout)),
            },
        };

        debug!(generation = generation; "socket open");
        self.signals.do_send(LinkSignal::Ready { generation });

        let (mut tx, mut rx) = stream.split();
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    let _ = tx.close().await;
                    return None;
                }
                out = self.outbound.recv() => match out {
                    Some(frame) => {
                        if let Err(e) = tx.send(WsMessage::Text(frame)).await {
                            return Some(e.to_string());
                        }
                    }
                    None => {
                        let _ = tx.close().await;
                        return None;
                    }
                },
                msg = rx.next() => match msg {
                    Some(Ok(WsMessage::Text(text))) => {
                        self.signals.do_send(LinkSignal::Frame { generation, text });
                    }
                    Some(Ok(WsMessage::Binary(bytes))) => {
                        let text = String::from_utf8_lossy(&bytes).into_owned();
                        self.signals.do_send(LinkSignal::Frame { generation, text });
                    }
                    Some(Ok(WsMessage::Close(_))) | None => return None,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Some(e.to_string()),
                },
            }
        }
    }
}
