#![allow(dead_code)]

use std::time::{Duration, Instant};

use epoq_remote::{
    ClientConfig, ConnectionDescriptor, Notice, SessionHandle, SessionState,
};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::{
    net::{TcpListener, TcpStream},
    sync::mpsc::UnboundedReceiver,
};
use tokio_tungstenite::{accept_async, tungstenite::Message, WebSocketStream};

pub const TOKEN: &str = "s3cr3t-token";

/// The desktop end of a test connection.
pub type Desktop = WebSocketStream<TcpStream>;

pub async fn listen() -> (TcpListener, ConnectionDescriptor) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let descriptor = ConnectionDescriptor::new("127.0.0.1", port, TOKEN).unwrap();
    (listener, descriptor)
}

pub async fn accept(listener: &TcpListener) -> Desktop {
    let (stream, _) = listener.accept().await.unwrap();
    accept_async(stream).await.unwrap()
}

/// Waits for the next text frame from the client and parses it.
pub async fn recv_json(desktop: &mut Desktop) -> Value {
    loop {
        match tokio::time::timeout(Duration::from_secs(5), desktop.next()).await {
            Ok(Some(Ok(Message::Text(text)))) => return serde_json::from_str(&text).unwrap(),
            Ok(Some(Ok(_))) => continue,
            other => panic!("expected a text frame, got {other:?}"),
        }
    }
}

pub async fn send(desktop: &mut Desktop, frame: &str) {
    desktop.send(Message::Text(frame.into())).await.unwrap();
}

/// Asserts the client went away from this connection.
pub async fn expect_closed(desktop: &mut Desktop) {
    loop {
        match tokio::time::timeout(Duration::from_secs(5), desktop.next()).await {
            Ok(Some(Ok(Message::Close(_)))) | Ok(None) | Ok(Some(Err(_))) => return,
            Ok(Some(Ok(Message::Text(text)))) => panic!("unexpected frame {text}"),
            Ok(Some(Ok(_))) => continue,
            Err(_) => panic!("connection still open"),
        }
    }
}

/// Polls the session until `cond` holds.
pub async fn wait_for<F>(session: &SessionHandle, cond: F) -> SessionState
where
    F: Fn(&SessionState) -> bool,
{
    let deadline = Instant::now() + Duration::from_secs(5);

    loop {
        let state = session.snapshot().await.unwrap();
        if cond(&state) {
            return state;
        }

        assert!(Instant::now() < deadline, "timed out, last state: {state:?}");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// A session that went through pairing and authentication.
pub struct LiveSession {
    pub session: SessionHandle,
    pub notices: UnboundedReceiver<Notice>,
    pub desktop: Desktop,
    pub listener: TcpListener,
}

pub async fn live_session() -> LiveSession {
    let (listener, descriptor) = listen().await;
    let (session, notices) = SessionHandle::start(ClientConfig::default());

    session.pair(descriptor).await.unwrap();
    let mut desktop = accept(&listener).await;

    let auth = recv_json(&mut desktop).await;
    assert_eq!(auth, json!({ "action": "auth", "token": TOKEN }));

    send(&mut desktop, r#"{"status":"authenticated"}"#).await;
    wait_for(&session, |s| s.is_live()).await;

    LiveSession {
        session,
        notices,
        desktop,
        listener,
    }
}

pub fn training_frame(epoch: u32) -> String {
    format!(
        r#"{{"status":"training","epoch":{epoch},"total_epochs":10,"train_accuracy":"0.82","train_loss":"0.41","val_accuracy":"0.77"}}"#
    )
}
