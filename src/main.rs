use std::{env, process};

use anyhow::Result;
use epoq_remote::{
    protocol::{Model, Preset, TrainingParams},
    state::LogEntry,
    ClientConfig, Notice, SessionHandle, SessionState,
};
use log::info;
use tokio::io::{self, AsyncBufReadExt, BufReader};

const PAIRING_VAR: &str = "EPOQ_PAIRING";
const RECENT_LOGS: usize = 10;

const HELP: &str = "\
commands:
  start [<preset> <model> | <epochs> <batch_size> <learning_rate> <model>]
  adjust <preset> <model> | <epochs> <batch_size> <learning_rate> <model>
  presets: fast (5/64/0.001), standard (15/32/0.001), accurate (30/16/0.0001)
  stop | dataset | status | log | dismiss
  pair <json> | disconnect | help | quit";

#[actix_rt::main]
async fn main() -> Result<()> {
    env_logger::init();

    let payload = env::args().nth(1).or_else(|| env::var(PAIRING_VAR).ok());
    let config = ClientConfig::from_env();
    info!("starting with {config:?}");

    let (session, mut notices) = SessionHandle::start(config);

    actix_rt::spawn(async move {
        while let Some(notice) = notices.recv().await {
            match notice {
                Notice::TrainingBusy(msg) => println!("! Already running: {msg}"),
            }
        }
    });

    if let Some(payload) = payload {
        if let Err(e) = session.pair_payload(&payload).await {
            eprintln!("{e}");
            process::exit(1);
        }
    } else {
        println!("no pairing code given, use `pair <json>`");
    }

    println!("{HELP}");

    let mut lines = BufReader::new(io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (cmd, rest) = line.split_once(' ').unwrap_or((line, ""));
        let args: Vec<&str> = rest.split_whitespace().collect();
        let commands = session.commands();

        let res = match (cmd, args.as_slice()) {
            ("", _) => Ok(()),
            ("start", []) => commands.start_with(&TrainingParams::default()).await,
            ("start", [preset, model]) => match preset_params(preset, model) {
                Ok(params) => commands.start_with(&params).await,
                Err(e) => Err(e),
            },
            ("start", [epochs, batch, lr, model]) => {
                commands.start_training(epochs, batch, lr, model).await
            }
            ("adjust", [preset, model]) => match preset_params(preset, model) {
                Ok(params) => commands.adjust_with(&params).await,
                Err(e) => Err(e),
            },
            ("adjust", [epochs, batch, lr, model]) => {
                commands.adjust_params(epochs, batch, lr, model).await
            }
            ("stop", []) => commands.stop_training().await,
            ("dataset", []) => commands.select_dataset().await,
            ("dismiss", []) => session.dismiss_artifact().await,
            ("pair", _) => session.pair_payload(rest).await,
            ("disconnect", []) => session.disconnect().await,
            ("status", []) => session.snapshot().await.map(|s| print_status(&s)),
            ("log", []) => session
                .snapshot()
                .await
                .map(|s| s.log().iter().for_each(print_log)),
            ("quit" | "exit", []) => break,
            _ => {
                println!("{HELP}");
                Ok(())
            }
        };

        if let Err(e) = res {
            println!("! {e}");
        }
    }

    session.disconnect().await?;
    Ok(())
}

fn preset_params(preset: &str, model: &str) -> epoq_remote::Result<TrainingParams> {
    let preset: Preset = preset.parse()?;
    let model: Model = model.parse()?;
    Ok(preset.params(model))
}

fn print_status(state: &SessionState) {
    let m = state.metrics();

    println!(
        "connection: {:?}  training: {:?}",
        state.connection_phase(),
        state.training_phase()
    );
    if let Some(e) = state.last_error() {
        println!("last error: {e}");
    }
    println!(
        "epoch {}/{} ({:.0}%)  acc {:.2}%  loss {:.4}  val {:.2}%",
        m.epoch,
        m.total_epochs,
        state.progress() * 100.0,
        m.train_accuracy * 100.0,
        m.train_loss,
        m.val_accuracy * 100.0
    );
    println!(
        "dataset: {}  artifact: {}  history: {} points",
        state.dataset_path().unwrap_or("none"),
        if state.latest_artifact().is_some() { "yes" } else { "no" },
        state.metric_history().len()
    );

    let skip = state.log().len().saturating_sub(RECENT_LOGS);
    state.log().iter().skip(skip).for_each(print_log);
}

fn print_log(entry: &LogEntry) {
    println!(
        "[{}] {:<5} {}",
        entry.timestamp.format("%H:%M:%S"),
        entry.severity.as_str(),
        entry.text
    );
}
