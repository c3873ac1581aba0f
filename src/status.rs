//! Charger status normalization
//!
//! The cloud API reports an integer status code; everything downstream works
//! with the canonical [`ChargerStatus`] it maps to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical charger status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChargerStatus {
    Disconnected,
    Ready,
    Charging,
    Paused,
    Scheduled,
    Waiting,
    WaitingMid,
    Locked,
    Updating,
    Discharging,
    Error,
    Unknown,
}

/// Code table as reported by the charger firmware
const STATUS_TABLE: &[(i64, ChargerStatus)] = &[
    (0, ChargerStatus::Disconnected),
    (14, ChargerStatus::Error),
    (15, ChargerStatus::Error),
    (161, ChargerStatus::Ready),
    (162, ChargerStatus::Ready),
    (163, ChargerStatus::Disconnected),
    (164, ChargerStatus::Waiting),
    (165, ChargerStatus::Locked),
    (166, ChargerStatus::Updating),
    (177, ChargerStatus::Scheduled),
    (178, ChargerStatus::Paused),
    (179, ChargerStatus::Scheduled),
    (180, ChargerStatus::Waiting),
    (181, ChargerStatus::Waiting),
    (182, ChargerStatus::Paused),
    (183, ChargerStatus::Waiting),
    (184, ChargerStatus::Waiting),
    (185, ChargerStatus::Waiting),
    (186, ChargerStatus::Waiting),
    (187, ChargerStatus::WaitingMid),
    (188, ChargerStatus::WaitingMid),
    (189, ChargerStatus::Waiting),
    (193, ChargerStatus::Charging),
    (194, ChargerStatus::Charging),
    (195, ChargerStatus::Charging),
    (196, ChargerStatus::Discharging),
    (209, ChargerStatus::Locked),
    (210, ChargerStatus::Locked),
];

impl ChargerStatus {
    /// Every status, in declaration order
    pub const ALL: [ChargerStatus; 12] = [
        ChargerStatus::Disconnected,
        ChargerStatus::Ready,
        ChargerStatus::Charging,
        ChargerStatus::Paused,
        ChargerStatus::Scheduled,
        ChargerStatus::Waiting,
        ChargerStatus::WaitingMid,
        ChargerStatus::Locked,
        ChargerStatus::Updating,
        ChargerStatus::Discharging,
        ChargerStatus::Error,
        ChargerStatus::Unknown,
    ];

    /// Map a raw status code; codes outside the table become `Unknown`
    pub fn from_code(code: i64) -> Self {
        STATUS_TABLE
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, status)| *status)
            .unwrap_or(ChargerStatus::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Ready => "Ready",
            Self::Charging => "Charging",
            Self::Paused => "Paused",
            Self::Scheduled => "Scheduled",
            Self::Waiting => "Waiting",
            Self::WaitingMid => "WaitingMID",
            Self::Locked => "Locked",
            Self::Updating => "Updating",
            Self::Discharging => "Discharging",
            Self::Error => "Error",
            Self::Unknown => "Unknown",
        }
    }

    /// Whether the host should treat the device as reachable in this state
    pub fn is_available(&self) -> bool {
        !matches!(self, Self::Disconnected | Self::Error)
    }
}

impl fmt::Display for ChargerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChargerStatus {
    type Err = crate::error::ChargeSyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| crate::error::ChargeSyncError::validation("status", "unknown status name"))
    }
}
