//! Gateway admin API client
//!
//! Cheap to clone; every clone shares the executor and process state.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::statistics::StatisticsSnapshot;
use super::transport::{HttpTransport, Transport};
use super::{global_state, ActionExecutor, AdapterState, RetryPolicy};
use crate::config::AdapterConfig;
use crate::error::Result;

#[derive(Clone)]
pub struct GatewayClient {
    executor: ActionExecutor,
    page_size: u32,
}

impl GatewayClient {
    /// Client bound to the process-wide state. The configured endpoints
    /// replace whatever the state held before.
    pub fn new(config: &AdapterConfig) -> Result<Self> {
        Self::with_state(config, global_state())
    }

    pub fn with_state(config: &AdapterConfig, state: Arc<AdapterState>) -> Result<Self> {
        config.validate()?;
        let policy = config.retry_policy();
        let transport = Arc::new(HttpTransport::new(policy.request_timeout)?);
        state.set_gateway_url(config.gateway_url.clone());
        state.set_adapter_url(config.adapter_url.clone());
        debug!("Gateway client for {}", config.gateway_url);

        Ok(Self::from_parts(
            transport,
            state,
            policy,
            config.page_size,
            config.debug_curl,
        ))
    }

    pub fn from_parts(
        transport: Arc<dyn Transport>,
        state: Arc<AdapterState>,
        policy: RetryPolicy,
        page_size: u32,
        debug_curl: bool,
    ) -> Self {
        Self {
            executor: ActionExecutor::new(transport, state, policy).with_debug_curl(debug_curl),
            page_size,
        }
    }

    pub fn executor(&self) -> &ActionExecutor {
        &self.executor
    }

    pub fn state(&self) -> &Arc<AdapterState> {
        self.executor.state()
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn reset_statistics(&self, keep_action_log: bool) {
        self.state().statistics.reset(keep_action_log);
    }

    /// Current statistics; switches action logging off until the next reset
    pub fn get_statistics(&self) -> StatisticsSnapshot {
        self.state().statistics.get_statistics()
    }

    pub fn gateway_url(&self) -> String {
        self.state().gateway_url()
    }

    pub fn set_gateway_url(&self, url: impl Into<String>) {
        self.state().set_gateway_url(url);
    }

    pub fn adapter_url(&self) -> String {
        self.state().adapter_url()
    }

    pub fn set_adapter_url(&self, url: impl Into<String>) {
        self.state().set_adapter_url(url);
    }

    pub fn is_available(&self) -> bool {
        self.state().availability.is_available()
    }

    /// Last body returned by the gateway's `status` endpoint
    pub fn cluster_status(&self) -> Option<Value> {
        self.state().availability.cluster_status()
    }

    /// Node information from the admin API root
    pub async fn gateway_info(&self) -> Result<Value> {
        self.executor.get("").await
    }

    pub async fn probe_status(&self) -> Result<Value> {
        self.executor.probe_status().await
    }
}
