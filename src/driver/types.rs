use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a monitored device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverState {
    /// Created, polling not started
    Idle,
    /// Polling on schedule
    Running,
    /// Polling stopped; mirrored state kept
    Stopped,
    /// Removed; late writes and events are discarded
    TornDown,
}

impl DriverState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::TornDown => "torn_down",
        }
    }
}

/// Counters over the poll cycles run so far
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollStats {
    pub total_polls: u64,
    pub failed_polls: u64,
    pub last_poll_at: Option<DateTime<Utc>>,
    pub last_poll_duration_ms: Option<u64>,
    /// Writes made by the most recent cycle
    pub last_writes: usize,
    pub last_error: Option<String>,
}
