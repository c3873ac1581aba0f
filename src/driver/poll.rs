//! One fetch-and-reconcile pass over a charger

use crate::api::{ChargerApi, ChargerSnapshot};
use crate::capabilities::{CapabilitySink, CapabilityWriter, Observable};
use crate::error::ChargeSyncError;
use crate::events::{ChargerEvent, DeviceEvent, EventSink, transition};
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::session::{lifetime_energy, session_cost};
use crate::status::ChargerStatus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// How a cycle ended
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Snapshot fetched and reconciled
    Completed,
    /// Snapshot could not be fetched; nothing was reconciled
    Failed(String),
}

/// What a single cycle did
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    /// Observable writes that reached the sink
    pub writes: usize,
    /// Events handed to the event sink
    pub events: Vec<ChargerEvent>,
}

impl CycleReport {
    fn failed(message: String) -> Self {
        Self {
            outcome: CycleOutcome::Failed(message),
            writes: 0,
            events: Vec::new(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.outcome == CycleOutcome::Completed
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Availability {
    available: bool,
    reason: Option<String>,
}

/// Reconciles one device's observables against a fresh API snapshot.
///
/// Scheduled and manual runs share one lock, so at most one cycle per device
/// is in flight and the read-compare-write sequence on the sink is never
/// interleaved.
pub struct PollCycle {
    device_id: String,
    api: Arc<dyn ChargerApi>,
    sink: Arc<dyn CapabilitySink>,
    events: Arc<dyn EventSink>,
    torn_down: Arc<AtomicBool>,
    in_flight: tokio::sync::Mutex<()>,
    last_availability: Mutex<Option<Availability>>,
    logger: StructuredLogger,
}

impl PollCycle {
    pub fn new(
        device_id: &str,
        api: Arc<dyn ChargerApi>,
        sink: Arc<dyn CapabilitySink>,
        events: Arc<dyn EventSink>,
        torn_down: Arc<AtomicBool>,
    ) -> Self {
        let logger = get_logger_with_context(LogContext::new("poll").with_device_id(device_id));
        Self {
            device_id: device_id.to_string(),
            api,
            sink,
            events,
            torn_down,
            in_flight: tokio::sync::Mutex::new(()),
            last_availability: Mutex::new(None),
            logger,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Fetch a snapshot and apply the differences to the sink.
    ///
    /// Waits for a cycle already running on this device to finish first.
    pub async fn run(&self) -> CycleReport {
        let _running = self.in_flight.lock().await;
        let snapshot = match self.api.get_status(&self.device_id).await {
            Ok(s) => s,
            Err(e) => return self.fail(&e),
        };
        self.reconcile(&snapshot).await
    }

    fn fail(&self, err: &ChargeSyncError) -> CycleReport {
        let message = err.to_string();
        if err.is_auth() {
            self.logger
                .error(&format!("Status fetch rejected, re-authentication needed: {}", message));
        } else {
            self.logger.warn(&format!("Status fetch failed: {}", message));
        }
        self.set_availability(false, Some(message.clone()));
        CycleReport::failed(message)
    }

    fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::Acquire)
    }

    fn set_availability(&self, available: bool, reason: Option<String>) {
        if self.is_torn_down() {
            return;
        }
        let next = Availability { available, reason };
        let mut last = self
            .last_availability
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if last.as_ref() == Some(&next) && self.sink.is_available() == available {
            return;
        }
        self.sink.set_available(next.available, next.reason.as_deref());
        *last = Some(next);
    }

    fn emit(&self, event: ChargerEvent) -> bool {
        if self.is_torn_down() {
            self.logger
                .debug(&format!("Device torn down, dropping event {}", event.name()));
            return false;
        }
        self.logger.info(&format!("Event: {}", event.name()));
        self.events.emit(DeviceEvent::new(&self.device_id, event));
        true
    }

    async fn reconcile(&self, snapshot: &ChargerSnapshot) -> CycleReport {
        let status = ChargerStatus::from_code(snapshot.status_code);
        if status.is_available() {
            self.set_availability(true, None);
        } else {
            self.set_availability(false, Some(status.as_str().to_string()));
        }

        let mut writer = CapabilityWriter::new(self.sink.as_ref(), &self.torn_down);
        let mut emitted = Vec::new();

        // Status first so events reflect the held value before this cycle
        let old_status = writer
            .current(Observable::Status)
            .and_then(|v| v.as_text().and_then(|t| t.parse::<ChargerStatus>().ok()));
        if old_status != Some(status) {
            writer.apply(Observable::Status, status.as_str());
            if status == ChargerStatus::Unknown {
                self.logger.warn(&format!(
                    "Unmapped status code {}",
                    snapshot.status_code
                ));
            }
            for event in transition(old_status, status) {
                if self.emit(event.clone()) {
                    emitted.push(event);
                }
            }
        }

        let cfg = &snapshot.config;
        writer.apply(Observable::Locked, cfg.locked);
        writer.apply(Observable::Running, status != ChargerStatus::Paused);
        writer.apply(Observable::MeasurePower, snapshot.charging_power_kw * 1000.0);
        writer.apply(Observable::MaxAvailableCurrent, cfg.max_available_current);
        writer.apply(Observable::MaxChargingCurrent, cfg.max_charging_current);
        writer.apply(Observable::EnergyCost, cfg.energy_price);
        writer.apply(
            Observable::UserId,
            snapshot.user_id.clone().unwrap_or_default(),
        );
        writer.apply(
            Observable::UserName,
            snapshot.user_name.clone().unwrap_or_default(),
        );

        let sessions = match self.api.list_sessions().await {
            Ok(s) => s,
            Err(e) => {
                self.logger.warn(&format!(
                    "Session listing failed, lifetime energy from current session only: {}",
                    e
                ));
                Vec::new()
            }
        };
        let lifetime = lifetime_energy(&sessions, &self.device_id, snapshot.session_energy);

        let previous_energy = writer.current_f64(Observable::SessionEnergy).unwrap_or(0.0);
        let previous_cost = writer.current_f64(Observable::SessionCost).unwrap_or(0.0);
        let cost = session_cost(
            snapshot.session_energy,
            previous_energy,
            previous_cost,
            cfg.energy_price,
        );

        writer.apply(Observable::SessionEnergy, snapshot.session_energy);
        // Cost is priced against the held energy, so it only moves with it
        if writer.current_f64(Observable::SessionEnergy) == Some(snapshot.session_energy) {
            writer.apply(Observable::SessionCost, cost);
        } else if !self.is_torn_down() {
            self.logger
                .warn("Session energy not stored, leaving session cost unchanged");
        }
        writer.apply(Observable::LifetimeEnergy, lifetime);

        self.logger.debug(&format!(
            "Cycle done: status={}, writes={}, events={}",
            status,
            writer.writes(),
            emitted.len()
        ));

        CycleReport {
            outcome: CycleOutcome::Completed,
            writes: writer.writes(),
            events: emitted,
        }
    }
}
