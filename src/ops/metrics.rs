//! Per-plugin round counters.
//!
//! One counter per registered key, bumped once per completed round and
//! drained periodically by the reporter. Draining is atomic per key, not
//! across keys: a snapshot taken while rounds complete may attribute a
//! round to either the current or the next interval, but never loses or
//! double-counts one.

use crate::core::error::{CheckError, CheckResult};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Registry of named round counters.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    counters: RwLock<HashMap<String, Arc<AtomicU64>>>,
}

impl MetricsRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or reset to zero) the counter for `key`.
    ///
    /// Registering an existing key installs a fresh counter; increments
    /// racing with the re-registration may land on the replaced one. Register
    /// every key before concurrent increments start.
    pub fn register(&self, key: &str) {
        self.counters
            .write()
            .insert(key.to_string(), Arc::new(AtomicU64::new(0)));
    }

    /// Add one to the counter for `key`.
    pub fn increment(&self, key: &str) -> CheckResult<()> {
        let counters = self.counters.read();
        match counters.get(key) {
            Some(counter) => {
                counter.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            None => Err(CheckError::UnregisteredMetric {
                key: key.to_string(),
            }),
        }
    }

    /// Current value of `key`, if registered.
    pub fn get(&self, key: &str) -> Option<u64> {
        self.counters
            .read()
            .get(key)
            .map(|c| c.load(Ordering::Relaxed))
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.counters.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Read and zero every counter.
    pub fn snapshot_and_reset(&self) -> BTreeMap<String, u64> {
        self.counters
            .read()
            .iter()
            .map(|(key, counter)| (key.clone(), counter.swap(0, Ordering::AcqRel)))
            .collect()
    }
}
