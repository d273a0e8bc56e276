//! Outbound half of the wire protocol.

use std::{fmt, str::FromStr};

use serde_json::{json, Value};

use crate::error::SessionError;

/// Architectures the desktop trainer knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Model {
    Resnet18,
    Resnet50,
    EfficientnetB0,
    VitB16,
    Eva02,
}

impl Model {
    pub const ALL: [Model; 5] = [
        Model::Resnet18,
        Model::Resnet50,
        Model::EfficientnetB0,
        Model::VitB16,
        Model::Eva02,
    ];

    /// Returns the name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Model::Resnet18 => "resnet18",
            Model::Resnet50 => "resnet50",
            Model::EfficientnetB0 => "efficientnet_b0",
            Model::VitB16 => "vit_b_16",
            Model::Eva02 => "eva02",
        }
    }
}

impl FromStr for Model {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Model::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| SessionError::InvalidParameters {
                field: "model",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quick settings for epochs, batch size and learning rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Fast,
    Standard,
    Accurate,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Fast, Preset::Standard, Preset::Accurate];

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Fast => "fast",
            Preset::Standard => "standard",
            Preset::Accurate => "accurate",
        }
    }

    /// Builds the parameters of this preset for `model`.
    pub fn params(&self, model: Model) -> TrainingParams {
        let (epochs, batch_size, learning_rate) = match self {
            Preset::Fast => (5, 64, 0.001),
            Preset::Standard => (15, 32, 0.001),
            Preset::Accurate => (30, 16, 0.0001),
        };

        TrainingParams {
            epochs,
            batch_size,
            learning_rate,
            model,
        }
    }
}

impl FromStr for Preset {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SessionError::InvalidParameters {
                field: "preset",
                value: s.to_string(),
            })
    }
}

/// Hyper-parameters for starting or adjusting a training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingParams {
    pub epochs: u32,
    pub batch_size: u32,
    pub learning_rate: f64,
    pub model: Model,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            epochs: 10,
            batch_size: 32,
            learning_rate: 0.001,
            model: Model::Resnet18,
        }
    }
}

impl TrainingParams {
    /// Parses raw user input into validated parameters.
    ///
    /// # Args
    /// * `epochs` - Must be a positive integer.
    /// * `batch_size` - Must be a positive integer.
    /// * `learning_rate` - Must be a positive, finite float.
    /// * `model` - One of the names in [`Model::ALL`].
    ///
    /// # Errors
    /// `InvalidParameters` naming the first field that was rejected.
    pub fn parse(
        epochs: &str,
        batch_size: &str,
        learning_rate: &str,
        model: &str,
    ) -> Result<Self, SessionError> {
        let epochs = positive_int("epochs", epochs)?;
        let batch_size = positive_int("batch_size", batch_size)?;

        let learning_rate = learning_rate
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|lr| lr.is_finite() && *lr > 0.0)
            .ok_or_else(|| SessionError::InvalidParameters {
                field: "learning_rate",
                value: learning_rate.to_string(),
            })?;

        Ok(Self {
            epochs,
            batch_size,
            learning_rate,
            model: model.parse()?,
        })
    }

    fn to_fields(&self, action: &str) -> Value {
        json!({
            "action": action,
            "epochs": self.epochs,
            "batch_size": self.batch_size,
            "learning_rate": self.learning_rate,
            "model": self.model.as_str(),
        })
    }
}

fn positive_int(field: &'static str, raw: &str) -> Result<u32, SessionError> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| SessionError::InvalidParameters {
            field,
            value: raw.to_string(),
        })
}

/// The closed set of commands a client can send to the desktop.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Auth { token: String },
    StartTraining(TrainingParams),
    AdjustParams(TrainingParams),
    StopTraining,
    SelectDataset,
}

impl Command {
    /// Encodes the command into a single text frame.
    pub fn encode(&self) -> String {
        let val = match self {
            Command::Auth { token } => json!({ "action": "auth", "token": token }),
            Command::StartTraining(params) => params.to_fields("start_training"),
            Command::AdjustParams(params) => params.to_fields("adjust_params"),
            Command::StopTraining => json!({ "action": "stop_training" }),
            Command::SelectDataset => json!({ "action": "select_dataset" }),
        };

        val.to_string()
    }
}
