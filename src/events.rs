//! Charger lifecycle events
//!
//! Status changes are turned into discrete lifecycle events by
//! [`transition`] and handed to the host through an [`EventSink`].

use crate::status::ChargerStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod bus;

pub use bus::EventBus;

/// Lifecycle event derived from a status change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChargerEvent {
    /// `old` is `None` for the first status seen after monitoring started
    StatusChanged {
        old: Option<ChargerStatus>,
        new: ChargerStatus,
    },
    ChargingStarted,
    ChargingEnded,
    CarConnected,
    CarUnplugged,
}

impl ChargerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::StatusChanged { .. } => "status_changed",
            Self::ChargingStarted => "charging_started",
            Self::ChargingEnded => "charging_ended",
            Self::CarConnected => "car_connected",
            Self::CarUnplugged => "car_unplugged",
        }
    }
}

/// Event as delivered to the host, stamped with its origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceEvent {
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: ChargerEvent,
}

impl DeviceEvent {
    pub fn new(device_id: &str, event: ChargerEvent) -> Self {
        Self {
            device_id: device_id.to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Receiver of lifecycle events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: DeviceEvent);
}

/// Events implied by a status change, in emission order.
///
/// Nothing is emitted when the status did not change. Error and Updating
/// only ever produce the `StatusChanged` event.
pub fn transition(old: Option<ChargerStatus>, new: ChargerStatus) -> Vec<ChargerEvent> {
    if old == Some(new) {
        return Vec::new();
    }

    let mut events = vec![ChargerEvent::StatusChanged { old, new }];
    if matches!(new, ChargerStatus::Error | ChargerStatus::Updating) {
        return events;
    }

    match old {
        Some(ChargerStatus::Charging) => events.push(ChargerEvent::ChargingEnded),
        Some(ChargerStatus::Ready) => events.push(ChargerEvent::CarConnected),
        _ => {}
    }

    match new {
        ChargerStatus::Charging => events.push(ChargerEvent::ChargingStarted),
        ChargerStatus::Ready => events.push(ChargerEvent::CarUnplugged),
        _ => {}
    }

    events
}
