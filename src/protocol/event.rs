//! Inbound half of the wire protocol.
//!
//! Decoding is total: any frame the desktop (or the training process behind
//! it) emits maps to some [`ClassifiedEvent`], falling back to a plain log
//! line for unstructured text.

use serde_json::{Map, Value};

/// Severity of a user-visible log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
    Success,
}

impl Severity {
    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "info" => Some(Severity::Info),
            "error" => Some(Severity::Error),
            "success" => Some(Severity::Success),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Error => "ERROR",
            Severity::Success => "OK",
        }
    }
}

/// One epoch's worth of training metrics as reported by the desktop.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Metrics {
    pub epoch: u32,
    pub total_epochs: u32,
    pub train_accuracy: f64,
    pub train_loss: f64,
    pub val_accuracy: f64,
}

/// An opaque artifact pushed by the desktop (e.g. a base64 confusion matrix image).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact(String);

impl Artifact {
    pub fn new(data: impl Into<String>) -> Self {
        Self(data.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The typed result of decoding one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifiedEvent {
    AuthSucceeded,
    AuthFailed,
    TrainingProgress(Metrics),
    TrainingFinished { message: Option<String> },
    DatasetUpdate { path: Option<String> },
    ArtifactReceived { data: Option<Artifact> },
    RejectedBusy { message: Option<String> },
    LogEvent { text: String, severity: Severity },
    UnclassifiedStructured,
}

/// Decodes a whole transport frame.
///
/// A frame normally holds one document, but the training process may flush
/// several newline-separated lines at once; those are decoded one by one, in order.
pub fn decode_frame(raw: &str) -> Vec<ClassifiedEvent> {
    if serde_json::from_str::<Value>(raw).is_ok() || !raw.trim().contains('\n') {
        return decode(raw).into_iter().collect();
    }

    raw.lines().filter_map(decode).collect()
}

/// Decodes a single frame.
///
/// Returns `None` only for blank text, which is dropped.
pub fn decode(raw: &str) -> Option<ClassifiedEvent> {
    if raw.trim().is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(val) => classify(val),
        Err(_) => Some(log_line(raw.trim_end())),
    }
}

fn classify(val: Value) -> Option<ClassifiedEvent> {
    match val {
        Value::Object(obj) => Some(classify_object(&obj)),
        // Some bridges double-encode: the frame is a JSON string holding JSON.
        Value::String(inner) => match serde_json::from_str::<Value>(&inner) {
            Ok(Value::Object(obj)) => Some(classify_object(&obj)),
            _ if inner.trim().is_empty() => None,
            _ => Some(log_line(inner.trim_end())),
        },
        _ => Some(ClassifiedEvent::UnclassifiedStructured),
    }
}

fn classify_object(obj: &Map<String, Value>) -> ClassifiedEvent {
    let text = |key: &str| obj.get(key).and_then(as_text);

    match obj.get("status").and_then(Value::as_str) {
        Some("authenticated") => return ClassifiedEvent::AuthSucceeded,
        Some("auth_failed") => return ClassifiedEvent::AuthFailed,
        Some("training") => return ClassifiedEvent::TrainingProgress(metrics(obj)),
        Some("stopped_early" | "evaluation_complete" | "stopped") => {
            return ClassifiedEvent::TrainingFinished {
                message: text("message"),
            }
        }
        _ => {}
    }

    let kind = obj.get("type").and_then(Value::as_str);
    match kind {
        Some("dataset_update") => {
            return ClassifiedEvent::DatasetUpdate {
                path: text("path").filter(|p| !p.is_empty()),
            }
        }
        Some("confusion_matrix") => {
            return ClassifiedEvent::ArtifactReceived {
                data: text("data").map(Artifact),
            }
        }
        Some("training_busy") => {
            return ClassifiedEvent::RejectedBusy {
                message: text("message"),
            }
        }
        _ => {}
    }

    match text("message").filter(|t| !t.trim().is_empty()) {
        Some(text) => ClassifiedEvent::LogEvent {
            text,
            severity: kind.and_then(Severity::from_wire).unwrap_or(Severity::Info),
        },
        None => ClassifiedEvent::UnclassifiedStructured,
    }
}

fn metrics(obj: &Map<String, Value>) -> Metrics {
    Metrics {
        epoch: lenient_u32(obj.get("epoch")),
        total_epochs: lenient_u32(obj.get("total_epochs")),
        train_accuracy: lenient_f64(obj.get("train_accuracy")).clamp(0.0, 1.0),
        train_loss: lenient_f64(obj.get("train_loss")).max(0.0),
        val_accuracy: lenient_f64(obj.get("val_accuracy")).clamp(0.0, 1.0),
    }
}

fn lenient_f64(val: Option<&Value>) -> f64 {
    let parsed = match val {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed.filter(|x| x.is_finite()).unwrap_or(0.0)
}

fn lenient_u32(val: Option<&Value>) -> u32 {
    match val {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|x| *x >= 0.0).map(|x| x as u64))
            .and_then(|x| u32::try_from(x).ok())
            .unwrap_or(0),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<u32>()
                .ok()
                .or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|x| x.is_finite() && *x >= 0.0)
                        .and_then(|x| u32::try_from(x as u64).ok())
                })
                .unwrap_or(0)
        }
        _ => 0,
    }
}

fn as_text(val: &Value) -> Option<String> {
    match val {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn log_line(text: &str) -> ClassifiedEvent {
    ClassifiedEvent::LogEvent {
        text: text.to_string(),
        severity: Severity::Info,
    }
}
