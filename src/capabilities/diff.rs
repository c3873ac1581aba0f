//! Read-compare-write gate for observables

use super::{CapabilitySink, Observable, ObservableValue};
use crate::error::Result;
use std::sync::atomic::{AtomicBool, Ordering};

/// Write `new_value` only when it differs from what `read_current` returns.
///
/// Returns whether a write happened. Equality is exact, floats included: all
/// values of one cycle come from a single upstream read. A failing `write`
/// is logged and reported as no change so the caller can carry on with the
/// next observable.
pub fn apply_if_changed<V, R, W>(name: Observable, new_value: V, read_current: R, write: W) -> bool
where
    V: PartialEq,
    R: FnOnce() -> Option<V>,
    W: FnOnce(V) -> Result<()>,
{
    if read_current().is_some_and(|current| current == new_value) {
        return false;
    }
    match write(new_value) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(observable = %name, "Failed to write observable: {}", e);
            false
        }
    }
}

/// Routes every observable update of one poll cycle through
/// [`apply_if_changed`] and counts the writes that happened.
pub struct CapabilityWriter<'a> {
    sink: &'a dyn CapabilitySink,
    torn_down: &'a AtomicBool,
    writes: usize,
}

impl<'a> CapabilityWriter<'a> {
    pub fn new(sink: &'a dyn CapabilitySink, torn_down: &'a AtomicBool) -> Self {
        Self {
            sink,
            torn_down,
            writes: 0,
        }
    }

    /// Apply a new value, returning whether the sink was written
    pub fn apply(&mut self, name: Observable, value: impl Into<ObservableValue>) -> bool {
        // Device gone: writes from a late cycle are dropped
        if self.torn_down.load(Ordering::Acquire) {
            tracing::debug!(observable = %name, "Device torn down, discarding write");
            return false;
        }
        let sink = self.sink;
        let changed = apply_if_changed(name, value.into(), || sink.get(name), |v| sink.set(name, v));
        if changed {
            self.writes += 1;
        }
        changed
    }

    /// Last value held by the sink
    pub fn current(&self, name: Observable) -> Option<ObservableValue> {
        self.sink.get(name)
    }

    pub fn current_f64(&self, name: Observable) -> Option<f64> {
        self.current(name).and_then(|v| v.as_f64())
    }

    /// Writes performed so far
    pub fn writes(&self) -> usize {
        self.writes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::MemoryCapabilityStore;
    use crate::error::ChargeSyncError;
    use std::cell::Cell;

    #[test]
    fn equal_value_is_not_written() {
        let written = Cell::new(false);
        let changed = apply_if_changed(
            Observable::Locked,
            true,
            || Some(true),
            |_| {
                written.set(true);
                Ok(())
            },
        );
        assert!(!changed);
        assert!(!written.get());
    }

    #[test]
    fn unset_value_is_written() {
        let written = Cell::new(None);
        let changed = apply_if_changed(
            Observable::MeasurePower,
            1200.0,
            || None,
            |v| {
                written.set(Some(v));
                Ok(())
            },
        );
        assert!(changed);
        assert_eq!(written.get(), Some(1200.0));
    }

    #[test]
    fn failed_write_reports_no_change() {
        let changed = apply_if_changed(
            Observable::UserName,
            "alice".to_string(),
            || Some("bob".to_string()),
            |_| Err(ChargeSyncError::generic("sink offline")),
        );
        assert!(!changed);
    }

    #[test]
    fn writer_counts_only_real_writes() {
        let store = MemoryCapabilityStore::new();
        let torn_down = AtomicBool::new(false);
        let mut writer = CapabilityWriter::new(&store, &torn_down);

        assert!(writer.apply(Observable::EnergyCost, 0.25));
        assert!(!writer.apply(Observable::EnergyCost, 0.25));
        assert!(writer.apply(Observable::EnergyCost, 0.30));
        assert_eq!(writer.writes(), 2);
        assert_eq!(writer.current_f64(Observable::EnergyCost), Some(0.30));
    }

    #[test]
    fn writer_discards_after_teardown() {
        let store = MemoryCapabilityStore::new();
        let torn_down = AtomicBool::new(true);
        let mut writer = CapabilityWriter::new(&store, &torn_down);

        assert!(!writer.apply(Observable::Running, true));
        assert_eq!(store.get(Observable::Running), None);
        assert_eq!(writer.writes(), 0);
    }
}
