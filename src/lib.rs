//! Gateway Adapter: admin-API client and reconciliation support
//!
//! This crate drives an API gateway's administrative REST interface. It
//! retries through control-plane outages, tells a caller whether the gateway
//! already holds a desired object, and maps the composite API view onto the
//! gateway's service + route pair.

pub mod config;
pub mod error;
pub mod gateway;
pub mod matcher;
pub mod model;
pub mod resources;

pub use crate::config::AdapterConfig;
pub use crate::error::{Error, Result};
pub use crate::gateway::{global_state, AdapterState, GatewayClient};
