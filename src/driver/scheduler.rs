//! Fixed-period poll loop with non-overlapping cycles

use crate::error::{ChargeSyncError, Result};
use crate::logging::{StructuredLogger, get_logger};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, sleep_until};

enum Control {
    Reconfigure { interval: Duration, at: Instant },
    Stop,
}

/// Drives a cycle function on a fixed period.
///
/// The loop task awaits every cycle before looking at the clock again, so
/// cycles never overlap; ticks that elapsed meanwhile are dropped.
pub struct PollScheduler {
    interval: Duration,
    control: Option<mpsc::UnboundedSender<Control>>,
    stopped: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
    logger: StructuredLogger,
}

/// Longest accepted poll period (one day)
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(86_400);

fn check_interval(interval: Duration) -> Result<()> {
    if interval.is_zero() {
        return Err(ChargeSyncError::validation(
            "poll_interval",
            "must be greater than zero",
        ));
    }
    if interval > MAX_POLL_INTERVAL {
        return Err(ChargeSyncError::validation(
            "poll_interval".to_string(),
            format!("must be at most {} seconds", MAX_POLL_INTERVAL.as_secs()),
        ));
    }
    Ok(())
}

/// `from + period`, saturating at a far-future deadline instead of panicking
fn deadline(from: Instant, period: Duration) -> Instant {
    from.checked_add(period)
        .or_else(|| from.checked_add(MAX_POLL_INTERVAL))
        .unwrap_or(from)
}

impl PollScheduler {
    pub fn new() -> Self {
        Self {
            interval: Duration::ZERO,
            control: None,
            stopped: Arc::new(AtomicBool::new(true)),
            task: None,
            logger: get_logger("scheduler"),
        }
    }

    /// Run `cycle` now and then every `interval` from this instant
    pub fn start<F, Fut>(&mut self, interval: Duration, cycle: F) -> Result<()>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        check_interval(interval)?;
        if self.is_running() {
            return Err(ChargeSyncError::generic("poll scheduler already running"));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let stopped = Arc::new(AtomicBool::new(false));
        self.interval = interval;
        self.control = Some(tx);
        self.stopped = stopped.clone();
        self.task = Some(tokio::spawn(run_loop(interval, cycle, rx, stopped)));
        self.logger
            .info(&format!("Polling started every {:?}", interval));
        Ok(())
    }

    /// Change the period; the next cycle is due one new interval from now
    pub fn reconfigure(&mut self, interval: Duration) -> Result<()> {
        check_interval(interval)?;
        self.interval = interval;
        if let Some(tx) = &self.control {
            let _ = tx.send(Control::Reconfigure {
                interval,
                at: Instant::now(),
            });
            self.logger
                .info(&format!("Poll interval changed to {:?}", interval));
        }
        Ok(())
    }

    /// Prevent further cycles; an in-flight cycle runs to completion
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(tx) = &self.control {
            let _ = tx.send(Control::Stop);
        }
        self.logger.info("Polling stopped");
    }

    /// Stop and wait for the loop task, including any in-flight cycle
    pub async fn shutdown(&mut self) {
        self.stop();
        self.control = None;
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            self.logger
                .error(&format!("Poll loop ended abnormally: {}", e));
        }
    }

    pub fn is_running(&self) -> bool {
        !self.stopped.load(Ordering::Acquire)
            && self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Most recently requested interval
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for PollScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.stopped.store(true, Ordering::Release);
    }
}

async fn run_loop<F, Fut>(
    interval: Duration,
    mut cycle: F,
    mut control: mpsc::UnboundedReceiver<Control>,
    stopped: Arc<AtomicBool>,
) where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut period = interval;
    let mut next = deadline(Instant::now(), period);

    cycle().await;

    loop {
        if stopped.load(Ordering::Acquire) {
            break;
        }

        // Missed deadlines are skipped, not queued
        let now = Instant::now();
        while next < now {
            let after = deadline(next, period);
            if after <= next {
                next = now;
                break;
            }
            next = after;
        }

        tokio::select! {
            biased;
            msg = control.recv() => match msg {
                Some(Control::Reconfigure { interval, at }) => {
                    period = interval;
                    next = deadline(at, interval);
                }
                Some(Control::Stop) | None => break,
            },
            () = sleep_until(next) => {
                if stopped.load(Ordering::Acquire) {
                    break;
                }
                next = deadline(next, period);
                cycle().await;
            }
        }
    }
}
