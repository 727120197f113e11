//! Gateway entities and the composite API view
//!
//! Gateway-native entities keep any field this crate does not model in
//! `extra`, so objects read from the gateway can be written back without
//! losing server-assigned data.

pub mod translate;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use translate::{consumer_username, pick_route, to_composite_form, to_split_form};

/// Foreign-key reference as the gateway encodes it: `{"id": "..."}`
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct EntityRef {
    pub id: String,
}

impl EntityRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Upstream definition
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Service {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_timeout: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Path/method matching rule pointing at a service
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Route {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocols: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methods: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paths: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strip_path: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preserve_host: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<EntityRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Route {
    pub fn service_id(&self) -> Option<&str> {
        self.service.as_ref().map(|s| s.id.as_str())
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Plugin {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<EntityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer: Option<EntityRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Plugin {
    pub fn new(name: impl Into<String>, config: Value) -> Self {
        Self {
            name: name.into(),
            config: Some(config),
            ..Default::default()
        }
    }
}

/// Application identity on the gateway
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Consumer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One page of a gateway collection
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
}

/// Logical API: one service plus the single route that exposes it
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ApiEntity {
    /// Identifier of the backing service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub upstream_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uris: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methods: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocols: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strip_uri: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preserve_host: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_connect_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_read_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_send_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Value>,
    /// Service and route this entity was read from
    #[serde(skip)]
    pub(crate) observed: Option<(Service, Route)>,
}

impl ApiEntity {
    pub fn new(name: impl Into<String>, upstream_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            upstream_url: upstream_url.into(),
            ..Default::default()
        }
    }

    pub fn observed_service(&self) -> Option<&Service> {
        self.observed.as_ref().map(|(s, _)| s)
    }

    pub fn observed_route(&self) -> Option<&Route> {
        self.observed.as_ref().map(|(_, r)| r)
    }

    /// Identifier of the backing route, when read from the gateway
    pub fn route_id(&self) -> Option<&str> {
        self.observed_route().and_then(|r| r.id.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_service_keeps_unknown_fields() {
        let raw = json!({
            "id": "s1",
            "name": "orders",
            "host": "orders.internal",
            "port": 8080,
            "protocol": "http",
            "created_at": 1700000000,
            "tags": ["portal"]
        });
        let service: Service = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(service.port, Some(8080));
        assert_eq!(service.extra["created_at"], 1700000000);
        assert_eq!(serde_json::to_value(&service).unwrap(), raw);
    }

    #[test]
    fn test_route_service_reference() {
        let route: Route = serde_json::from_value(json!({
            "id": "r1",
            "paths": ["/orders"],
            "service": {"id": "s1"}
        }))
        .unwrap();
        assert_eq!(route.service_id(), Some("s1"));
        assert!(route.extra.is_empty());
    }

    #[test]
    fn test_page_without_next() {
        let page: Page<Consumer> =
            serde_json::from_value(json!({"data": [{"id": "c1", "username": "app$api"}]}))
                .unwrap();
        assert_eq!(page.data.len(), 1);
        assert!(page.next.is_none());
    }

    #[test]
    fn test_api_entity_serialization_skips_observed() {
        let api = ApiEntity::new("orders", "http://orders.internal");
        let value = serde_json::to_value(&api).unwrap();
        assert_eq!(
            value,
            json!({"name": "orders", "upstream_url": "http://orders.internal"})
        );
    }
}
