//! Charger cloud API
//!
//! The [`ChargerApi`] trait is the only way the poll cycle and the command
//! path reach the charger. [`http::HttpChargerApi`] implements it over the
//! vendor's REST API; tests substitute their own implementations.

use crate::error::{ChargeSyncError, Result};
use crate::session::SessionRecord;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::HttpChargerApi;

/// Charger-side configuration reported with each status read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargerSettings {
    pub locked: bool,
    pub max_charging_current: f64,
    pub max_available_current: f64,
    /// Price per kWh
    pub energy_price: f64,
}

/// One point-in-time read of charger telemetry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargerSnapshot {
    pub status_code: i64,
    pub charging_power_kw: f64,
    /// kWh added in the running session
    pub session_energy: f64,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub config: ChargerSettings,
}

/// Remote operations on a charger account
#[async_trait]
pub trait ChargerApi: Send + Sync {
    /// Obtain credentials for every later call
    async fn authenticate(&self) -> Result<()>;

    async fn get_status(&self, device_id: &str) -> Result<ChargerSnapshot>;

    /// Full session history of the account, all chargers included
    async fn list_sessions(&self) -> Result<Vec<SessionRecord>>;

    async fn lock(&self, device_id: &str) -> Result<()>;

    async fn unlock(&self, device_id: &str) -> Result<()>;

    async fn pause(&self, device_id: &str) -> Result<()>;

    async fn resume(&self, device_id: &str) -> Result<()>;

    async fn set_max_current(&self, device_id: &str, amps: f64) -> Result<()>;

    async fn set_energy_cost(&self, device_id: &str, cost: f64) -> Result<()>;
}

/// Status document as served by the cloud API.
///
/// Every field is optional on the wire; [`ChargerSnapshot::try_from`]
/// decides what is required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusResponse {
    #[serde(default, alias = "status", deserialize_with = "de_opt_i64")]
    pub status_id: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub charging_power: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub added_energy: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub user_name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub max_available_current: Option<f64>,
    #[serde(default, alias = "config")]
    pub config_data: Option<ConfigData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigData {
    #[serde(default, deserialize_with = "de_opt_bool")]
    pub locked: Option<bool>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub max_charging_current: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub max_available_current: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub energy_price: Option<f64>,
}

impl TryFrom<StatusResponse> for ChargerSnapshot {
    type Error = ChargeSyncError;

    fn try_from(doc: StatusResponse) -> Result<Self> {
        let status_code = doc
            .status_id
            .ok_or_else(|| ChargeSyncError::data_shape("status document has no status_id"))?;
        let config = doc
            .config_data
            .ok_or_else(|| ChargeSyncError::data_shape("status document has no config_data"))?;

        // Some firmware reports the available current at the top level
        let max_available_current = config
            .max_available_current
            .or(doc.max_available_current)
            .unwrap_or(0.0);

        Ok(Self {
            status_code,
            charging_power_kw: doc.charging_power.unwrap_or(0.0),
            session_energy: doc.added_energy.unwrap_or(0.0),
            user_id: doc.user_id,
            user_name: doc.user_name,
            config: ChargerSettings {
                locked: config.locked.unwrap_or(false),
                max_charging_current: config.max_charging_current.unwrap_or(0.0),
                max_available_current,
                energy_price: config.energy_price.unwrap_or(0.0),
            },
        })
    }
}

/// Session listing as served by the cloud API
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionsResponse {
    #[serde(default)]
    pub data: Vec<SessionEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionEntry {
    #[serde(default, alias = "charger", deserialize_with = "de_opt_text")]
    pub charger_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub energy: Option<f64>,
}

impl SessionsResponse {
    /// Entries without a charger id cannot be attributed and are dropped
    pub fn into_records(self) -> Vec<SessionRecord> {
        self.data
            .into_iter()
            .filter_map(|e| e.charger_id.map(|id| SessionRecord::new(&id, e.energy)))
            .collect()
    }
}

fn number_from_value(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        serde_json::Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn de_opt_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value).filter(|v| v.is_finite()))
}

fn de_opt_i64<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_i64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    })
}

fn de_opt_bool<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Bool(b)) => Some(b),
        Some(other) => number_from_value(&other).map(|v| v != 0.0),
        None => None,
    })
}

fn de_opt_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
