//! HTTP transport used by the executor
//!
//! The executor only needs "send this request, give me status and body or a
//! transport-level failure". Keeping that behind a trait lets tests script
//! failure sequences without a network.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use tracing::warn;

use crate::error::{Error, Result};

/// HTTP verbs the gateway admin API is driven with
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Patch,
    Delete,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
        }
    }

    /// Status code the gateway returns when the verb succeeds
    pub fn expected_status(&self) -> u16 {
        match self {
            Verb::Get => 200,
            Verb::Post => 201,
            Verb::Patch => 200,
            Verb::Delete => 204,
        }
    }

    fn method(&self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
            Verb::Patch => Method::PATCH,
            Verb::Delete => Method::DELETE,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GatewayRequest {
    pub verb: Verb,
    pub url: String,
    pub body: Option<Value>,
}

impl GatewayRequest {
    /// Equivalent curl invocation, for manual replay against the gateway
    pub fn to_curl(&self) -> String {
        let mut cmd = format!("curl -X {}", self.verb);
        if let Some(body) = &self.body {
            let payload = body.to_string().replace('\'', r"'\''");
            cmd.push_str(&format!(
                " -H 'Content-Type: application/json' -d '{payload}'"
            ));
        }
        cmd.push_str(&format!(" '{}'", self.url));
        cmd
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Failure short of receiving a response (refused, timed out, DNS)
#[derive(Clone, Debug, PartialEq)]
pub struct TransportError(pub String);

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        request: &GatewayRequest,
    ) -> std::result::Result<TransportResponse, TransportError>;
}

/// reqwest-backed transport with a fixed per-attempt timeout
#[derive(Clone)]
pub struct HttpTransport {
    http_client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("gateway-adapter/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::HttpError)?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        request: &GatewayRequest,
    ) -> std::result::Result<TransportResponse, TransportError> {
        let mut builder = self.http_client.request(request.verb.method(), &request.url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response.text().await;

        Ok(received_response(request, status, body))
    }
}

/// A status line means the gateway acted on the request. A body that fails to
/// arrive after that is logged and treated as empty so the request is never resent.
fn received_response<E: fmt::Display>(
    request: &GatewayRequest,
    status: u16,
    body: std::result::Result<String, E>,
) -> TransportResponse {
    let body = body.unwrap_or_else(|e| {
        warn!(
            "{} {} answered {} but the body could not be read: {}",
            request.verb, request.url, status, e
        );
        String::new()
    });
    TransportResponse { status, body }
}
