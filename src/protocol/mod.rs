//! The JSON text protocol spoken with the desktop app.

pub mod command;
pub mod event;

pub use command::{Command, Model, Preset, TrainingParams};
pub use event::{decode, decode_frame, Artifact, ClassifiedEvent, Metrics, Severity};
