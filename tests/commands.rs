mod common;

use common::*;
use epoq_remote::{
    protocol::{Model, Preset, TrainingParams},
    ClientConfig, SessionError, SessionHandle,
};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};

#[actix_rt::test]
async fn commands_travel_as_documented_json() {
    let LiveSession {
        session,
        mut desktop,
        ..
    } = live_session().await;
    let commands = session.commands();

    assert_ok!(commands.start_training("10", "32", "0.001", "resnet18").await);
    assert_eq!(
        recv_json(&mut desktop).await,
        json!({
            "action": "start_training",
            "epochs": 10,
            "batch_size": 32,
            "learning_rate": 0.001,
            "model": "resnet18",
        })
    );

    assert_ok!(commands.adjust_params("20", "64", "0.0005", "eva02").await);
    assert_eq!(
        recv_json(&mut desktop).await,
        json!({
            "action": "adjust_params",
            "epochs": 20,
            "batch_size": 64,
            "learning_rate": 0.0005,
            "model": "eva02",
        })
    );

    assert_ok!(commands.select_dataset().await);
    assert_eq!(
        recv_json(&mut desktop).await,
        json!({ "action": "select_dataset" })
    );

    assert_ok!(commands.stop_training().await);
    assert_eq!(
        recv_json(&mut desktop).await,
        json!({ "action": "stop_training" })
    );
}

#[actix_rt::test]
async fn invalid_parameters_send_nothing() {
    let LiveSession {
        session,
        mut desktop,
        ..
    } = live_session().await;
    let commands = session.commands();

    let err = assert_err!(commands.start_training("abc", "32", "0.001", "resnet18").await);
    assert!(matches!(
        err,
        SessionError::InvalidParameters {
            field: "epochs",
            ..
        }
    ));

    let err = assert_err!(commands.start_training("10", "0", "0.001", "resnet18").await);
    assert!(matches!(
        err,
        SessionError::InvalidParameters {
            field: "batch_size",
            ..
        }
    ));

    let err = assert_err!(commands.adjust_params("10", "32", "fast", "resnet18").await);
    assert!(matches!(
        err,
        SessionError::InvalidParameters {
            field: "learning_rate",
            ..
        }
    ));

    let err = assert_err!(commands.start_training("10", "32", "0.001", "alexnet").await);
    assert!(matches!(
        err,
        SessionError::InvalidParameters { field: "model", .. }
    ));

    // The next frame the desktop sees is the stop, nothing before it.
    assert_ok!(commands.stop_training().await);
    assert_eq!(
        recv_json(&mut desktop).await,
        json!({ "action": "stop_training" })
    );

    let state = session.snapshot().await.unwrap();
    assert_eq!(state.log().len(), 2);
}

#[actix_rt::test]
async fn start_is_refused_while_running() {
    let LiveSession {
        session,
        mut desktop,
        ..
    } = live_session().await;

    send(&mut desktop, &training_frame(1)).await;
    wait_for(&session, |s| s.is_training()).await;

    assert_eq!(
        session
            .commands()
            .start_training("10", "32", "0.001", "resnet18")
            .await,
        Err(SessionError::AlreadyRunning)
    );

    // Adjusting a running job is fine.
    assert_ok!(
        session
            .commands()
            .adjust_params("12", "32", "0.001", "resnet18")
            .await
    );
    assert_eq!(recv_json(&mut desktop).await["action"], "adjust_params");
}

#[actix_rt::test]
async fn start_is_allowed_again_after_finish() {
    let LiveSession {
        session,
        mut desktop,
        ..
    } = live_session().await;

    send(&mut desktop, &training_frame(10)).await;
    send(&mut desktop, r#"{"status":"evaluation_complete","message":"Done."}"#).await;
    wait_for(&session, |s| {
        s.log().back().map(|e| e.text.as_str()) == Some("Done.")
    })
    .await;

    assert_ok!(
        session
            .commands()
            .start_training("5", "16", "0.01", "vit_b_16")
            .await
    );
    assert_eq!(recv_json(&mut desktop).await["model"], "vit_b_16");
}

#[actix_rt::test]
async fn commands_need_a_live_session() {
    let (session, _notices) = SessionHandle::start(ClientConfig::default());
    let commands = session.commands();

    assert_eq!(commands.stop_training().await, Err(SessionError::NotConnected));
    assert_eq!(commands.select_dataset().await, Err(SessionError::NotConnected));
    assert_eq!(
        commands.start_training("10", "32", "0.001", "resnet18").await,
        Err(SessionError::NotConnected)
    );

    // Still refused while the auth frame is outstanding.
    let (listener, descriptor) = listen().await;
    session.pair(descriptor).await.unwrap();
    let mut desktop = accept(&listener).await;
    recv_json(&mut desktop).await;

    assert_eq!(commands.stop_training().await, Err(SessionError::NotConnected));
}

#[actix_rt::test]
async fn commands_after_remote_close_are_not_connected() {
    let LiveSession {
        session, desktop, ..
    } = live_session().await;
    let commands = session.commands();

    drop(desktop);

    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(5);
    let err = loop {
        match commands.stop_training().await {
            Ok(()) => {
                assert!(tokio::time::Instant::now() < deadline, "sends kept succeeding");
                tokio::task::yield_now().await;
            }
            Err(e) => break e,
        }
    };

    assert_eq!(err, SessionError::NotConnected);
    for _ in 0..10 {
        assert_eq!(commands.stop_training().await, Err(SessionError::NotConnected));
    }
}

#[actix_rt::test]
async fn presets_and_defaults_go_out_as_regular_commands() {
    let LiveSession {
        session,
        mut desktop,
        ..
    } = live_session().await;
    let commands = session.commands();

    assert_ok!(commands.start_with(&TrainingParams::default()).await);
    assert_eq!(
        recv_json(&mut desktop).await,
        json!({
            "action": "start_training",
            "epochs": 10,
            "batch_size": 32,
            "learning_rate": 0.001,
            "model": "resnet18",
        })
    );

    assert_ok!(commands.adjust_with(&Preset::Accurate.params(Model::VitB16)).await);
    assert_eq!(
        recv_json(&mut desktop).await,
        json!({
            "action": "adjust_params",
            "epochs": 30,
            "batch_size": 16,
            "learning_rate": 0.0001,
            "model": "vit_b_16",
        })
    );
}
