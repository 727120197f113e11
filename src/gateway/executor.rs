//! Retrying action executor
//!
//! Sends one verb against the gateway admin API. Transport failures are
//! retried on a fixed delay while the availability gate is held closed;
//! any response reopens the gate. From the caller's side every `execute`
//! has exactly one outcome.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::transport::{GatewayRequest, Transport, TransportResponse, Verb};
use super::{AdapterState, RetryPolicy};
use crate::error::{Error, Result};

#[derive(Clone)]
pub struct ActionExecutor {
    transport: Arc<dyn Transport>,
    state: Arc<AdapterState>,
    policy: RetryPolicy,
    debug_curl: bool,
}

impl ActionExecutor {
    pub fn new(
        transport: Arc<dyn Transport>,
        state: Arc<AdapterState>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            state,
            policy,
            debug_curl: false,
        }
    }

    /// Echo every call as a curl command on the `gateway_adapter::curl` target
    pub fn with_debug_curl(mut self, enabled: bool) -> Self {
        self.debug_curl = enabled;
        self
    }

    pub fn state(&self) -> &Arc<AdapterState> {
        &self.state
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Resolve a collection path (or an absolute `next` link) against the gateway URL
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.state.gateway_url();
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub async fn execute(&self, verb: Verb, path: &str, body: Option<Value>) -> Result<Value> {
        self.execute_expecting(verb, path, body, verb.expected_status())
            .await
    }

    pub async fn execute_expecting(
        &self,
        verb: Verb,
        path: &str,
        body: Option<Value>,
        expected_status: u16,
    ) -> Result<Value> {
        let request = GatewayRequest {
            verb,
            url: self.url_for(path),
            body,
        };

        self.state
            .statistics
            .record_call(verb, &request.url, request.body.as_ref());

        let gate = self.state.availability.snapshot();
        if !gate.available {
            debug!("Gate closed, not calling {} {}", verb, request.url);
            return Err(Error::GatewayUnavailable(gate.message));
        }

        if self.debug_curl {
            info!(target: "gateway_adapter::curl", "{}", request.to_curl());
        }

        let response = self.send_with_retries(&request).await?;
        self.state.availability.mark_available(true, "", None);

        if response.status != expected_status {
            return Err(Error::UnexpectedStatus {
                method: verb.to_string(),
                url: request.url,
                actual: response.status,
                expected: expected_status,
                body: response.body,
            });
        }

        Ok(parse_body(&response.body))
    }

    async fn send_with_retries(&self, request: &GatewayRequest) -> Result<TransportResponse> {
        let mut attempt: u32 = 0;
        loop {
            match self.transport.send(request).await {
                Ok(response) => return Ok(response),
                Err(e) if attempt < self.policy.max_retries => {
                    warn!(
                        "{} {} failed: {}, attempt {}/{}, retrying in {:?}",
                        request.verb,
                        request.url,
                        e,
                        attempt + 1,
                        self.policy.max_retries + 1,
                        self.policy.retry_delay
                    );
                    self.state
                        .availability
                        .mark_available(false, e.to_string(), None);
                    attempt += 1;
                    tokio::time::sleep(self.policy.retry_delay).await;
                }
                Err(e) => {
                    warn!(
                        "{} {} failed after {} attempts, giving up: {}",
                        request.verb,
                        request.url,
                        attempt + 1,
                        e
                    );
                    // Reopen so later calls can probe the gateway again
                    self.state.availability.mark_available(true, "", None);
                    return Err(Error::TransportFailure {
                        method: request.verb.to_string(),
                        url: request.url.clone(),
                        attempts: attempt + 1,
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    pub async fn get(&self, path: &str) -> Result<Value> {
        self.execute(Verb::Get, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<Value> {
        self.execute(Verb::Post, path, Some(body)).await
    }

    pub async fn patch(&self, path: &str, body: Value) -> Result<Value> {
        self.execute(Verb::Patch, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.execute(Verb::Delete, path, None).await.map(|_| ())
    }

    /// GET `status` and keep the body as the gate's cluster status
    pub async fn probe_status(&self) -> Result<Value> {
        let status = self.get("status").await?;
        self.state
            .availability
            .mark_available(true, "", Some(status.clone()));
        Ok(status)
    }
}

/// Responses are JSON; empty bodies (204) become null, anything else is kept as text
pub(crate) fn parse_body(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}
