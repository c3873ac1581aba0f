//! In-memory capability store used by the binary and the web surface

use super::{CapabilitySink, Observable, ObservableValue};
use crate::error::Result;
use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
struct StoreState {
    values: BTreeMap<Observable, ObservableValue>,
    available: bool,
    unavailable_reason: Option<String>,
}

/// Thread-safe observable store with an availability flag
#[derive(Debug, Default)]
pub struct MemoryCapabilityStore {
    state: RwLock<StoreState>,
    writes: AtomicUsize,
}

impl MemoryCapabilityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of `set` calls that reached the store
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    pub fn unavailable_reason(&self) -> Option<String> {
        self.read().unavailable_reason.clone()
    }

    /// Copy of every value written so far
    pub fn values(&self) -> BTreeMap<Observable, ObservableValue> {
        self.read().values.clone()
    }

    /// JSON view of the mirrored state
    pub fn snapshot(&self) -> serde_json::Value {
        let state = self.read();
        let mut root = serde_json::Map::new();
        for (name, value) in &state.values {
            root.insert(
                name.as_str().to_string(),
                serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
            );
        }
        root.insert("available".to_string(), state.available.into());
        if let Some(ref reason) = state.unavailable_reason {
            root.insert("unavailable_reason".to_string(), reason.clone().into());
        }
        serde_json::Value::Object(root)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl CapabilitySink for MemoryCapabilityStore {
    fn get(&self, name: Observable) -> Option<ObservableValue> {
        self.read().values.get(&name).cloned()
    }

    fn set(&self, name: Observable, value: ObservableValue) -> Result<()> {
        self.write().values.insert(name, value);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.read().available
    }

    fn set_available(&self, available: bool, reason: Option<&str>) {
        let mut state = self.write();
        state.available = available;
        state.unavailable_reason = if available {
            None
        } else {
            reason.map(str::to_string)
        };
    }
}
