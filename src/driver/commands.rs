//! Remote commands forwarded to the charger

use crate::error::{ChargeSyncError, Result};
use serde::Serialize;
use std::fmt;

/// User-initiated operation on one charger
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "command", content = "value", rename_all = "snake_case")]
pub enum DeviceCommand {
    Lock,
    Unlock,
    Pause,
    Resume,
    /// Amperes
    SetMaxCurrent(f64),
    /// Price per kWh
    SetEnergyCost(f64),
}

impl DeviceCommand {
    /// Build a command from its wire name and optional numeric argument
    pub fn parse(name: &str, value: Option<f64>) -> Result<Self> {
        let cmd = match name.trim().to_ascii_lowercase().as_str() {
            "lock" => Self::Lock,
            "unlock" => Self::Unlock,
            "pause" => Self::Pause,
            "resume" => Self::Resume,
            "set_max_current" => Self::SetMaxCurrent(value.ok_or_else(|| {
                ChargeSyncError::validation("value", "set_max_current requires a value")
            })?),
            "set_energy_cost" => Self::SetEnergyCost(value.ok_or_else(|| {
                ChargeSyncError::validation("value", "set_energy_cost requires a value")
            })?),
            other => {
                return Err(ChargeSyncError::validation(
                    "command".to_string(),
                    format!("unknown command '{}'", other),
                ));
            }
        };
        cmd.validate()?;
        Ok(cmd)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Lock => "lock",
            Self::Unlock => "unlock",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::SetMaxCurrent(_) => "set_max_current",
            Self::SetEnergyCost(_) => "set_energy_cost",
        }
    }

    /// Reject arguments the charger would refuse or misinterpret
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::SetMaxCurrent(amps) if !amps.is_finite() || amps <= 0.0 => {
                Err(ChargeSyncError::validation(
                    "max_charging_current".to_string(),
                    format!("must be a positive number of amperes, got {}", amps),
                ))
            }
            Self::SetEnergyCost(cost) if !cost.is_finite() || cost < 0.0 => {
                Err(ChargeSyncError::validation(
                    "energy_cost".to_string(),
                    format!("must be a non-negative price, got {}", cost),
                ))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetMaxCurrent(v) | Self::SetEnergyCost(v) => write!(f, "{}({})", self.name(), v),
            _ => f.write_str(self.name()),
        }
    }
}
