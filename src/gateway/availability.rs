//! Availability gate for the gateway admin API
//!
//! Advisory circuit flag: while closed, new logical calls fail fast instead
//! of hitting the network. Only the executor changes it.

use std::sync::RwLock;

use serde::Serialize;
use serde_json::Value;

/// Consistent view of the gate at one instant
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySnapshot {
    pub available: bool,
    pub message: String,
    pub cluster_status: Option<Value>,
}

impl Default for AvailabilitySnapshot {
    fn default() -> Self {
        Self {
            available: true,
            message: String::new(),
            cluster_status: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct AvailabilityGate {
    inner: RwLock<AvailabilitySnapshot>,
}

impl AvailabilityGate {
    /// New gates start open so the first call is attempted
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the gate in one step. `None` keeps the last cluster status.
    pub(crate) fn mark_available(
        &self,
        available: bool,
        message: impl Into<String>,
        cluster_status: Option<Value>,
    ) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        guard.available = available;
        guard.message = message.into();
        if cluster_status.is_some() {
            guard.cluster_status = cluster_status;
        }
    }

    pub fn is_available(&self) -> bool {
        self.snapshot().available
    }

    pub fn cluster_status(&self) -> Option<Value> {
        self.snapshot().cluster_status
    }

    pub fn snapshot(&self) -> AvailabilitySnapshot {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
