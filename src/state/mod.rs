mod model;
mod session;

pub use model::{ConnectionPhase, Effect, LogEntry, MetricPoint, Notice, TrainingPhase};
pub use session::{SessionState, MAX_HISTORY, MAX_LOGS};
