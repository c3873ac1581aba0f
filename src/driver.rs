//! Per-device driver for ChargeSync
//!
//! A [`ChargerDriver`] owns everything needed to mirror one charger: the
//! poll cycle, the scheduler that drives it, and the command path back to
//! the charger. Devices share nothing mutable with each other.

use crate::api::ChargerApi;
use crate::capabilities::CapabilitySink;
use crate::error::{ChargeSyncError, Result};
use crate::events::EventSink;
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::time::{Duration, Instant};

pub mod commands;
pub mod poll;
pub mod scheduler;
pub mod types;

pub use commands::DeviceCommand;
pub use poll::{CycleOutcome, CycleReport, PollCycle};
pub use scheduler::{MAX_POLL_INTERVAL, PollScheduler};
pub use types::{DriverState, PollStats};

/// Monitoring session for one charger
pub struct ChargerDriver {
    device_id: String,
    api: Arc<dyn ChargerApi>,
    sink: Arc<dyn CapabilitySink>,
    cycle: Arc<PollCycle>,
    scheduler: tokio::sync::Mutex<PollScheduler>,
    poll_interval: Mutex<Duration>,
    torn_down: Arc<AtomicBool>,
    state: watch::Sender<DriverState>,
    stats: Arc<Mutex<PollStats>>,
    logger: StructuredLogger,
}

impl ChargerDriver {
    pub fn new(
        device_id: &str,
        api: Arc<dyn ChargerApi>,
        sink: Arc<dyn CapabilitySink>,
        events: Arc<dyn EventSink>,
        poll_interval: Duration,
    ) -> Self {
        let torn_down = Arc::new(AtomicBool::new(false));
        let cycle = Arc::new(PollCycle::new(
            device_id,
            api.clone(),
            sink.clone(),
            events,
            torn_down.clone(),
        ));
        let (state, _) = watch::channel(DriverState::Idle);
        Self {
            device_id: device_id.to_string(),
            api,
            sink,
            cycle,
            scheduler: tokio::sync::Mutex::new(PollScheduler::new()),
            poll_interval: Mutex::new(poll_interval),
            torn_down,
            state,
            stats: Arc::new(Mutex::new(PollStats::default())),
            logger: get_logger_with_context(LogContext::new("driver").with_device_id(device_id)),
        }
    }

    /// Authenticate and begin polling; the first cycle runs immediately
    pub async fn start(&self) -> Result<()> {
        if self.is_torn_down() {
            return Err(ChargeSyncError::generic("device has been torn down"));
        }
        self.logger.info("Starting charger monitoring");

        if let Err(e) = self.api.authenticate().await {
            self.logger.error(&format!("Authentication failed: {}", e));
            self.sink.set_available(false, Some(&e.to_string()));
            return Err(e);
        }

        let interval = self.poll_interval();
        let cycle = self.cycle.clone();
        let stats = self.stats.clone();
        self.scheduler.lock().await.start(interval, move || {
            let cycle = cycle.clone();
            let stats = stats.clone();
            async move {
                let started = Instant::now();
                let report = cycle.run().await;
                record(&stats, &report, started.elapsed());
            }
        })?;

        self.state.send_replace(DriverState::Running);
        Ok(())
    }

    /// Change the poll period at runtime
    pub async fn set_poll_interval(&self, interval: Duration) -> Result<()> {
        self.scheduler.lock().await.reconfigure(interval)?;
        *self
            .poll_interval
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = interval;
        Ok(())
    }

    /// Stop polling; mirrored values are kept
    pub async fn stop(&self) {
        self.scheduler.lock().await.shutdown().await;
        if !self.is_torn_down() {
            self.state.send_replace(DriverState::Stopped);
        }
    }

    /// Remove the device. Writes and events from a cycle still in flight
    /// are discarded.
    pub async fn teardown(&self) {
        self.torn_down.store(true, Ordering::Release);
        self.state.send_replace(DriverState::TornDown);
        self.scheduler.lock().await.shutdown().await;
        self.logger.info("Device torn down");
    }

    /// Validate and forward a command to the charger
    pub async fn handle_command(&self, cmd: DeviceCommand) -> Result<()> {
        if self.is_torn_down() {
            return Err(ChargeSyncError::generic("device has been torn down"));
        }
        cmd.validate()?;
        self.logger.info(&format!("Command: {}", cmd));

        let id = self.device_id.as_str();
        let result = match cmd {
            DeviceCommand::Lock => self.api.lock(id).await,
            DeviceCommand::Unlock => self.api.unlock(id).await,
            DeviceCommand::Pause => self.api.pause(id).await,
            DeviceCommand::Resume => self.api.resume(id).await,
            DeviceCommand::SetMaxCurrent(amps) => self.api.set_max_current(id, amps).await,
            DeviceCommand::SetEnergyCost(cost) => self.api.set_energy_cost(id, cost).await,
        };
        if let Err(ref e) = result {
            self.logger
                .error(&format!("Command {} failed: {}", cmd.name(), e));
        }
        result
    }

    /// Run one cycle outside the schedule, after any cycle already in flight
    pub async fn poll_now(&self) -> CycleReport {
        let started = Instant::now();
        let report = self.cycle.run().await;
        record(&self.stats, &report, started.elapsed());
        report
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn poll_interval(&self) -> Duration {
        *self
            .poll_interval
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self) -> DriverState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<DriverState> {
        self.state.subscribe()
    }

    pub fn stats(&self) -> PollStats {
        self.stats.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn sink(&self) -> &Arc<dyn CapabilitySink> {
        &self.sink
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::Acquire)
    }
}

fn record(stats: &Mutex<PollStats>, report: &CycleReport, elapsed: Duration) {
    let mut s = stats.lock().unwrap_or_else(|e| e.into_inner());
    s.total_polls += 1;
    s.last_poll_at = Some(chrono::Utc::now());
    s.last_poll_duration_ms = Some(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
    s.last_writes = report.writes;
    match &report.outcome {
        CycleOutcome::Completed => s.last_error = None,
        CycleOutcome::Failed(msg) => {
            s.failed_polls += 1;
            s.last_error = Some(msg.clone());
        }
    }
}
