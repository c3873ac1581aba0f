//! Mirrored device state
//!
//! Every value the monitor keeps in sync with the charger is an
//! [`Observable`]. The host owns the storage behind a [`CapabilitySink`];
//! the poll cycle only ever reaches it through [`diff::CapabilityWriter`].

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod diff;
pub mod store;

pub use diff::{CapabilityWriter, apply_if_changed};
pub use store::MemoryCapabilityStore;

/// Named piece of device state exposed to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Observable {
    Status,
    Locked,
    Running,
    /// Watts
    MeasurePower,
    /// kWh in the running session
    SessionEnergy,
    SessionCost,
    /// kWh over all sessions
    LifetimeEnergy,
    MaxAvailableCurrent,
    MaxChargingCurrent,
    /// Price per kWh
    EnergyCost,
    UserId,
    UserName,
}

impl Observable {
    pub const ALL: [Observable; 12] = [
        Observable::Status,
        Observable::Locked,
        Observable::Running,
        Observable::MeasurePower,
        Observable::SessionEnergy,
        Observable::SessionCost,
        Observable::LifetimeEnergy,
        Observable::MaxAvailableCurrent,
        Observable::MaxChargingCurrent,
        Observable::EnergyCost,
        Observable::UserId,
        Observable::UserName,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Locked => "locked",
            Self::Running => "running",
            Self::MeasurePower => "measure_power",
            Self::SessionEnergy => "session_energy",
            Self::SessionCost => "session_cost",
            Self::LifetimeEnergy => "lifetime_energy",
            Self::MaxAvailableCurrent => "max_available_current",
            Self::MaxChargingCurrent => "max_charging_current",
            Self::EnergyCost => "energy_cost",
            Self::UserId => "user_id",
            Self::UserName => "user_name",
        }
    }
}

impl fmt::Display for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value held for an observable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObservableValue {
    Bool(bool),
    Float(f64),
    Text(String),
}

impl ObservableValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }
}

impl From<bool> for ObservableValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for ObservableValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for ObservableValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for ObservableValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

/// Key/value store the host exposes for mirrored device state.
///
/// `get` returns `None` for an observable that was never written, which is
/// how a freshly started device guarantees its first poll writes everything.
pub trait CapabilitySink: Send + Sync {
    fn get(&self, name: Observable) -> Option<ObservableValue>;

    fn set(&self, name: Observable, value: ObservableValue) -> Result<()>;

    fn is_available(&self) -> bool;

    /// Flip the availability flag; `reason` is shown to the user when unavailable
    fn set_available(&self, available: bool, reason: Option<&str>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observable_names_are_snake_case() {
        assert_eq!(Observable::MeasurePower.as_str(), "measure_power");
        assert_eq!(
            serde_json::to_value(Observable::MaxAvailableCurrent).unwrap(),
            serde_json::json!("max_available_current")
        );
    }

    #[test]
    fn value_accessors_match_variant() {
        assert_eq!(ObservableValue::from(1.5).as_f64(), Some(1.5));
        assert_eq!(ObservableValue::from(true).as_f64(), None);
        assert_eq!(ObservableValue::from("x").as_text(), Some("x"));
        assert_eq!(ObservableValue::from(false).as_bool(), Some(false));
    }

    #[test]
    fn values_serialize_untagged() {
        let v = serde_json::to_value(ObservableValue::from(2.0)).unwrap();
        assert_eq!(v, serde_json::json!(2.0));
        let v = serde_json::to_value(ObservableValue::from("Charging")).unwrap();
        assert_eq!(v, serde_json::json!("Charging"));
    }
}
