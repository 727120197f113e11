//! Gateway admin API plumbing
//!
//! Process-scoped state (availability gate, statistics, endpoint URLs), the
//! retrying executor, and the transport it sends through.

pub mod availability;
mod client;
pub mod executor;
pub mod statistics;
pub mod transport;

use std::sync::{Arc, RwLock};
use std::time::Duration;

use once_cell::sync::Lazy;

pub use availability::{AvailabilityGate, AvailabilitySnapshot};
pub use client::GatewayClient;
pub use executor::ActionExecutor;
pub use statistics::{ActionLogEntry, Mismatch, Statistics, StatisticsSnapshot};
pub use transport::{
    GatewayRequest, HttpTransport, Transport, TransportError, TransportResponse, Verb,
};

use crate::config::{DEFAULT_ADAPTER_URL, DEFAULT_GATEWAY_URL};

/// Retry behavior for transport-level failures
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    pub request_timeout: Duration,
    pub retry_delay: Duration,
    /// Attempts are numbered from 0; failing attempt `max_retries` is final
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_millis(5000),
            retry_delay: Duration::from_millis(2000),
            max_retries: 10,
        }
    }
}

#[derive(Debug)]
struct Endpoints {
    gateway_url: String,
    adapter_url: String,
}

/// State shared by every call chain in the process
#[derive(Debug)]
pub struct AdapterState {
    pub availability: AvailabilityGate,
    pub statistics: Statistics,
    endpoints: RwLock<Endpoints>,
}

impl AdapterState {
    pub fn new(gateway_url: impl Into<String>, adapter_url: impl Into<String>) -> Self {
        Self {
            availability: AvailabilityGate::new(),
            statistics: Statistics::new(),
            endpoints: RwLock::new(Endpoints {
                gateway_url: gateway_url.into(),
                adapter_url: adapter_url.into(),
            }),
        }
    }

    pub fn gateway_url(&self) -> String {
        self.endpoints
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .gateway_url
            .clone()
    }

    pub fn set_gateway_url(&self, url: impl Into<String>) {
        self.endpoints
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .gateway_url = url.into();
    }

    /// Externally visible base URL of this adapter
    pub fn adapter_url(&self) -> String {
        self.endpoints
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .adapter_url
            .clone()
    }

    pub fn set_adapter_url(&self, url: impl Into<String>) {
        self.endpoints
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .adapter_url = url.into();
    }
}

static GLOBAL_STATE: Lazy<Arc<AdapterState>> =
    Lazy::new(|| Arc::new(AdapterState::new(DEFAULT_GATEWAY_URL, DEFAULT_ADAPTER_URL)));

/// Process-wide state, created on first use with the default endpoints
pub fn global_state() -> Arc<AdapterState> {
    GLOBAL_STATE.clone()
}
