//! Resource accessors for the gateway admin API
//!
//! Typed collections for services, routes, consumers and plugins, and the
//! composite API lifecycle built on top of them.

pub mod apis;
mod collection;
pub mod consumers;
pub mod plugins;

use serde_json::Value;

pub use apis::{api_matches, create_api, delete_api, get_api, list_apis, update_api};
pub use collection::Collection;
pub use consumers::{create_consumer, find_consumers_by_custom_id, get_consumer};
pub use plugins::{
    add_api_plugin, add_consumer_plugin, delete_consumer_plugin, delete_plugin, list_api_plugins,
    list_consumer_plugins, update_consumer_plugin, update_plugin,
};

use crate::gateway::GatewayClient;
use crate::model::{Consumer, Plugin, Route, Service};

impl GatewayClient {
    fn collection<T>(&self, path: impl Into<String>) -> Collection<T>
    where
        T: serde::Serialize + serde::de::DeserializeOwned,
    {
        Collection::new(self.executor().clone(), path, self.page_size())
    }

    pub fn services(&self) -> Collection<Service> {
        self.collection("services")
    }

    pub fn routes(&self) -> Collection<Route> {
        self.collection("routes")
    }

    /// Routes referencing one service
    pub fn service_routes(&self, service_id: &str) -> Collection<Route> {
        self.collection(format!("services/{service_id}/routes"))
    }

    pub fn consumers(&self) -> Collection<Consumer> {
        self.collection("consumers")
    }

    pub fn plugins(&self) -> Collection<Plugin> {
        self.collection("plugins")
    }

    /// Plugins bound to one service
    pub fn service_plugins(&self, service_id: &str) -> Collection<Plugin> {
        self.collection(format!("services/{service_id}/plugins"))
    }

    /// Per-consumer plugin data (credentials, ACL groups) for one plugin name
    pub fn consumer_plugin(&self, consumer_id: &str, plugin_name: &str) -> Collection<Value> {
        self.collection(format!("consumers/{consumer_id}/{plugin_name}"))
    }
}
