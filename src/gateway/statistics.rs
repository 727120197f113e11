//! Call statistics for diagnosing resync behavior
//!
//! Counts gateway calls per verb and, while enabled, keeps an ordered log of
//! mutating calls plus the comparisons that failed to match. A second resync
//! pass that is a true no-op leaves the action log empty.

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::transport::Verb;

/// One mutating call as it was issued
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ActionLogEntry {
    pub method: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

/// A desired/observed pair the matcher rejected
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Mismatch {
    pub desired: Value,
    pub observed: Value,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSnapshot {
    /// Calls per verb since the last reset
    pub counters: BTreeMap<String, u64>,
    pub action_log: Vec<ActionLogEntry>,
    pub failed_comparisons: Vec<Mismatch>,
    pub warnings: Vec<String>,
    pub keep_action_log: bool,
    pub since: DateTime<Utc>,
}

impl StatisticsSnapshot {
    fn empty(keep_action_log: bool) -> Self {
        Self {
            counters: BTreeMap::new(),
            action_log: Vec::new(),
            failed_comparisons: Vec::new(),
            warnings: Vec::new(),
            keep_action_log,
            since: Utc::now(),
        }
    }

    pub fn count(&self, verb: Verb) -> u64 {
        self.counters.get(verb.as_str()).copied().unwrap_or(0)
    }
}

#[derive(Debug)]
pub struct Statistics {
    inner: Mutex<StatisticsSnapshot>,
}

impl Default for Statistics {
    fn default() -> Self {
        Self {
            inner: Mutex::new(StatisticsSnapshot::empty(false)),
        }
    }
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear everything. With `keep_action_log`, mutating calls and failed
    /// comparisons are recorded until the next `get_statistics`.
    pub fn reset(&self, keep_action_log: bool) {
        *self.lock() = StatisticsSnapshot::empty(keep_action_log);
    }

    /// Return the current statistics and switch action logging off.
    pub fn get_statistics(&self) -> StatisticsSnapshot {
        let mut guard = self.lock();
        let snapshot = guard.clone();
        guard.keep_action_log = false;
        snapshot
    }

    pub fn recording_enabled(&self) -> bool {
        self.lock().keep_action_log
    }

    pub(crate) fn record_call(&self, verb: Verb, url: &str, body: Option<&Value>) {
        let mut guard = self.lock();
        *guard.counters.entry(verb.as_str().to_string()).or_insert(0) += 1;
        if guard.keep_action_log && verb != Verb::Get {
            guard.action_log.push(ActionLogEntry {
                method: verb.as_str().to_string(),
                url: url.to_string(),
                body: body.cloned(),
            });
        }
    }

    pub(crate) fn record_mismatch(&self, desired: &Value, observed: &Value) {
        let mut guard = self.lock();
        if guard.keep_action_log {
            guard.failed_comparisons.push(Mismatch {
                desired: desired.clone(),
                observed: observed.clone(),
            });
        }
    }

    pub(crate) fn record_warning(&self, warning: impl Into<String>) {
        self.lock().warnings.push(warning.into());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StatisticsSnapshot> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
