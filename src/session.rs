//! Charging session accounting for ChargeSync
//!
//! The charger API exposes no session-start marker and no ledger, so session
//! cost and lifetime energy are rebuilt every poll from the latest reading and
//! the previously mirrored values.

use serde::{Deserialize, Serialize};

/// One historical session as listed by the charger API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Charger the session ran on
    #[serde(alias = "charger_id", alias = "charger")]
    pub device_id: String,

    /// Energy delivered in kWh, absent for sessions still being settled
    #[serde(default)]
    pub energy: Option<f64>,
}

impl SessionRecord {
    pub fn new(device_id: &str, energy: Option<f64>) -> Self {
        Self {
            device_id: device_id.to_string(),
            energy,
        }
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Derive the cost of the running session.
///
/// A drop in cumulative session energy (or a zero reading) marks a session
/// boundary and the cost is recomputed from scratch. Otherwise only the
/// energy added since the previous reading is priced, so a price change
/// mid-session never re-prices energy already accounted for.
pub fn session_cost(
    current_energy: f64,
    previous_energy: f64,
    previous_cost: f64,
    price_per_kwh: f64,
) -> f64 {
    let current = finite_or_zero(current_energy);
    let previous = finite_or_zero(previous_energy);
    let price = finite_or_zero(price_per_kwh);

    if current < previous || current == 0.0 {
        return current * price;
    }
    finite_or_zero(previous_cost) + (current - previous) * price
}

/// Total energy ever delivered by `device_id`: its settled sessions plus the
/// one in progress.
pub fn lifetime_energy(
    sessions: &[SessionRecord],
    device_id: &str,
    current_session_energy: f64,
) -> f64 {
    let settled: f64 = sessions
        .iter()
        .filter(|s| s.device_id == device_id)
        .filter_map(|s| s.energy)
        .filter(|e| e.is_finite())
        .sum();
    settled + finite_or_zero(current_session_energy)
}
