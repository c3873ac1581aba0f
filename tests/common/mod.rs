#![allow(dead_code)]

use async_trait::async_trait;
use chargesync::api::{ChargerApi, ChargerSettings, ChargerSnapshot};
use chargesync::capabilities::{
    CapabilitySink, MemoryCapabilityStore, Observable, ObservableValue,
};
use chargesync::error::{ChargeSyncError, Result};
use chargesync::events::{DeviceEvent, EventSink};
use chargesync::session::SessionRecord;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::time::Duration;

pub fn snapshot(status_code: i64, session_energy: f64, price: f64) -> ChargerSnapshot {
    ChargerSnapshot {
        status_code,
        charging_power_kw: 7.4,
        session_energy,
        user_id: Some("42".to_string()),
        user_name: Some("Alice".to_string()),
        config: ChargerSettings {
            locked: false,
            max_charging_current: 16.0,
            max_available_current: 32.0,
            energy_price: price,
        },
    }
}

/// Scripted charger API recording every call
pub struct MockApi {
    status: Mutex<std::result::Result<ChargerSnapshot, String>>,
    sessions: Mutex<std::result::Result<Vec<SessionRecord>, String>>,
    auth_error: Mutex<Option<String>>,
    calls: Mutex<Vec<String>>,
    status_delay: Mutex<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockApi {
    pub fn new(snapshot: ChargerSnapshot) -> Self {
        Self {
            status: Mutex::new(Ok(snapshot)),
            sessions: Mutex::new(Ok(Vec::new())),
            auth_error: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            status_delay: Mutex::new(Duration::ZERO),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Make every status fetch take `delay`
    pub fn set_status_delay(&self, delay: Duration) {
        *self.status_delay.lock().unwrap() = delay;
    }

    /// Most status fetches ever running at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn set_snapshot(&self, snapshot: ChargerSnapshot) {
        *self.status.lock().unwrap() = Ok(snapshot);
    }

    pub fn fail_status(&self, message: &str) {
        *self.status.lock().unwrap() = Err(message.to_string());
    }

    pub fn set_sessions(&self, sessions: Vec<SessionRecord>) {
        *self.sessions.lock().unwrap() = Ok(sessions);
    }

    pub fn fail_sessions(&self, message: &str) {
        *self.sessions.lock().unwrap() = Err(message.to_string());
    }

    pub fn fail_auth(&self, message: &str) {
        *self.auth_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ChargerApi for MockApi {
    async fn authenticate(&self) -> Result<()> {
        self.record("authenticate".to_string());
        match self.auth_error.lock().unwrap().clone() {
            Some(msg) => Err(ChargeSyncError::auth(msg)),
            None => Ok(()),
        }
    }

    async fn get_status(&self, device_id: &str) -> Result<ChargerSnapshot> {
        self.record(format!("get_status {}", device_id));
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        let delay = *self.status_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.status
            .lock()
            .unwrap()
            .clone()
            .map_err(ChargeSyncError::fetch)
    }

    async fn list_sessions(&self) -> Result<Vec<SessionRecord>> {
        self.record("list_sessions".to_string());
        self.sessions
            .lock()
            .unwrap()
            .clone()
            .map_err(ChargeSyncError::fetch)
    }

    async fn lock(&self, device_id: &str) -> Result<()> {
        self.record(format!("lock {}", device_id));
        Ok(())
    }

    async fn unlock(&self, device_id: &str) -> Result<()> {
        self.record(format!("unlock {}", device_id));
        Ok(())
    }

    async fn pause(&self, device_id: &str) -> Result<()> {
        self.record(format!("pause {}", device_id));
        Ok(())
    }

    async fn resume(&self, device_id: &str) -> Result<()> {
        self.record(format!("resume {}", device_id));
        Ok(())
    }

    async fn set_max_current(&self, device_id: &str, amps: f64) -> Result<()> {
        self.record(format!("set_max_current {} {}", device_id, amps));
        Ok(())
    }

    async fn set_energy_cost(&self, device_id: &str, cost: f64) -> Result<()> {
        self.record(format!("set_energy_cost {} {}", device_id, cost));
        Ok(())
    }
}

/// Event sink keeping everything it receives
#[derive(Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<DeviceEvent>>,
}

impl RecordingEvents {
    pub fn names(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.event.name())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

impl EventSink for RecordingEvents {
    fn emit(&self, event: DeviceEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Store that refuses writes to one observable
pub struct RejectingSink {
    pub inner: MemoryCapabilityStore,
    pub rejected: Observable,
}

impl CapabilitySink for RejectingSink {
    fn get(&self, name: Observable) -> Option<ObservableValue> {
        self.inner.get(name)
    }

    fn set(&self, name: Observable, value: ObservableValue) -> Result<()> {
        if name == self.rejected {
            return Err(ChargeSyncError::generic(format!("{} is read-only", name)));
        }
        self.inner.set(name, value)
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }

    fn set_available(&self, available: bool, reason: Option<&str>) {
        self.inner.set_available(available, reason);
    }
}
