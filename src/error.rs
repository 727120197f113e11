//! Error types for the gateway adapter

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The availability gate is closed; no request was sent
    #[error("Gateway endpoint unavailable: {0}")]
    GatewayUnavailable(String),

    /// Network-level failure that persisted through every retry
    #[error("Transport failure for {method} {url} after {attempts} attempt(s): {message}")]
    TransportFailure {
        method: String,
        url: String,
        attempts: u32,
        message: String,
    },

    /// A response arrived but its status code was not the one the verb expects
    #[error("Unexpected status {actual} for {method} {url} (expected {expected}): {body}")]
    UnexpectedStatus {
        method: String,
        url: String,
        actual: u16,
        expected: u16,
        body: String,
    },

    /// A referenced service or route does not exist on the gateway
    #[error("Unknown reference: {0}")]
    UnknownReference(String),

    /// An entity could not be translated between composite and split form
    #[error("Invalid entity: {0}")]
    InvalidEntity(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl Error {
    /// Status code carried by an `UnexpectedStatus` error
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::UnexpectedStatus { actual, .. } => Some(*actual),
            _ => None,
        }
    }

    /// True when the gateway answered 404 for the requested entity
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
