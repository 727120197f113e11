//! Integration tests against a mocked gateway admin API
//!
//! Exercises the composite API lifecycle, paging, plugins, consumers and the
//! diagnostics surface through real HTTP calls to a wiremock server.

use std::sync::Arc;
use std::time::Duration;

use gateway_adapter::error::Error;
use gateway_adapter::gateway::{HttpTransport, RetryPolicy, Verb};
use gateway_adapter::model::{ApiEntity, Plugin};
use gateway_adapter::resources::{self, apis::find_route_for_service};
use gateway_adapter::{AdapterConfig, AdapterState, GatewayClient};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── helpers ────────────────────────────────────────────────────────────────

fn client_for(server: &MockServer) -> GatewayClient {
    let config = AdapterConfig {
        gateway_url: server.uri(),
        retry_delay_ms: 1,
        max_retries: 2,
        ..Default::default()
    };
    let state = Arc::new(AdapterState::new(server.uri(), "http://adapter.test"));
    GatewayClient::with_state(&config, state).unwrap()
}

fn service_json(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "protocol": "http",
        "host": format!("{name}.internal"),
        "port": 8080,
        "path": null,
        "retries": 5,
        "created_at": 1700000000
    })
}

fn route_json(id: &str, service_id: &str, path: &str) -> Value {
    json!({
        "id": id,
        "paths": [path],
        "protocols": ["http", "https"],
        "strip_path": true,
        "service": {"id": service_id},
        "created_at": 1700000001
    })
}

fn page(items: Vec<Value>) -> Value {
    json!({"data": items, "next": null})
}

fn orders_api() -> ApiEntity {
    let mut api = ApiEntity::new("orders", "http://orders.internal:8080");
    api.uris = Some(vec!["/orders".to_string()]);
    api.strip_uri = Some(true);
    api
}

// ── create ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_api_creates_service_then_route() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services"))
        .and(body_partial_json(json!({"name": "orders", "host": "orders.internal", "port": 8080})))
        .respond_with(ResponseTemplate::new(201).set_body_json(service_json("s1", "orders")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/routes"))
        .and(body_partial_json(json!({"service": {"id": "s1"}, "paths": ["/orders"]})))
        .respond_with(ResponseTemplate::new(201).set_body_json(route_json("r1", "s1", "/orders")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let api = resources::create_api(&client, &orders_api()).await.unwrap();

    assert_eq!(api.id.as_deref(), Some("s1"));
    assert_eq!(api.route_id(), Some("r1"));
    assert_eq!(api.upstream_url, "http://orders.internal:8080");
    assert_eq!(api.uris, Some(vec!["/orders".to_string()]));

    let requests = server.received_requests().await.unwrap();
    let order: Vec<&str> = requests.iter().map(|r| r.url.path()).collect();
    assert_eq!(order, vec!["/services", "/routes"]);
}

#[tokio::test]
async fn test_create_api_route_failure_leaves_service() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services"))
        .respond_with(ResponseTemplate::new(201).set_body_json(service_json("s1", "orders")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/routes"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"message": "schema violation"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![service_json("s1", "orders")])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = resources::create_api(&client, &orders_api()).await.unwrap_err();

    match err {
        Error::UnexpectedStatus { actual, expected, body, .. } => {
            assert_eq!(actual, 400);
            assert_eq!(expected, 201);
            assert!(body.contains("schema violation"));
        }
        other => panic!("expected UnexpectedStatus, got {other:?}"),
    }

    let services = client.services().list().await.unwrap();
    assert_eq!(services.len(), 1);
    assert_eq!(services[0].id.as_deref(), Some("s1"));
}

#[tokio::test]
async fn test_create_api_rejects_bad_upstream_without_calls() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    let api = ApiEntity::new("broken", "no-scheme-here");
    let err = resources::create_api(&client, &api).await.unwrap_err();

    assert!(matches!(err, Error::InvalidEntity(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

// ── update / delete ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_update_api_patches_service_and_route() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/services/s1/routes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![route_json("r1", "s1", "/orders")])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/services/s1"))
        .and(body_partial_json(json!({"name": "orders", "retries": 3})))
        .respond_with(ResponseTemplate::new(200).set_body_json(service_json("s1", "orders")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/routes/r1"))
        .and(body_partial_json(json!({"paths": ["/orders", "/v2/orders"], "service": {"id": "s1"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(route_json("r1", "s1", "/v2/orders")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut desired = orders_api();
    desired.retries = Some(3);
    desired.uris = Some(vec!["/orders".to_string(), "/v2/orders".to_string()]);

    let updated = resources::update_api(&client, "s1", &desired).await.unwrap();
    assert_eq!(updated.route_id(), Some("r1"));

    // patch bodies never carry the entity id
    let requests = server.received_requests().await.unwrap();
    for request in requests.iter().filter(|r| r.method.as_str() == "PATCH") {
        let body: Value = serde_json::from_slice(&request.body).unwrap();
        assert!(body.get("id").is_none());
    }
}

#[tokio::test]
async fn test_update_api_clears_upstream_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/services/s1/routes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![route_json("r1", "s1", "/orders")])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/services/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "s1",
            "name": "orders",
            "protocol": "http",
            "host": "h",
            "port": 80,
            "path": null
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/routes/r1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(route_json("r1", "s1", "/orders")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    // stored upstream was http://h/v2
    let updated = resources::update_api(&client, "s1", &ApiEntity::new("orders", "http://h"))
        .await
        .unwrap();
    assert_eq!(updated.upstream_url, "http://h");

    let requests = server.received_requests().await.unwrap();
    let service_patch = requests
        .iter()
        .find(|r| r.method.as_str() == "PATCH" && r.url.path() == "/services/s1")
        .unwrap();
    let body: Value = serde_json::from_slice(&service_patch.body).unwrap();
    let fields = body.as_object().unwrap();
    assert_eq!(fields.get("path"), Some(&Value::Null));
    assert_eq!(fields.get("host"), Some(&json!("h")));
}

#[tokio::test]
async fn test_update_api_without_route_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/services/s1/routes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = resources::update_api(&client, "s1", &orders_api())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnknownReference(_)));
}

#[tokio::test]
async fn test_delete_api_removes_route_before_service() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/services/s1/routes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![route_json("r1", "s1", "/orders")])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/routes/r1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/services/s1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    resources::delete_api(&client, "s1").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let deletes: Vec<&str> = requests
        .iter()
        .filter(|r| r.method.as_str() == "DELETE")
        .map(|r| r.url.path())
        .collect();
    assert_eq!(deletes, vec!["/routes/r1", "/services/s1"]);
}

#[tokio::test]
async fn test_delete_api_stops_when_route_delete_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/services/s1/routes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![route_json("r1", "s1", "/orders")])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/routes/r1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/services/s1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = resources::delete_api(&client, "s1").await.unwrap_err();
    assert_eq!(err.status_code(), Some(500));
}

// ── read ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_api_missing_service_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/services/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not found"})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(resources::get_api(&client, "missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_get_api_service_without_route_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/services/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(service_json("s1", "orders")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/services/s1/routes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(resources::get_api(&client, "s1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_get_api_matches_desired_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/services/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(service_json("s1", "orders")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/services/s1/routes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![route_json("r1", "s1", "/orders")])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.reset_statistics(true);
    let observed = resources::get_api(&client, "s1").await.unwrap().unwrap();

    assert!(resources::api_matches(&client, &orders_api(), &observed).unwrap());

    let mut changed = orders_api();
    changed.uris = Some(vec!["/checkout".to_string()]);
    assert!(!resources::api_matches(&client, &changed, &observed).unwrap());

    let stats = client.get_statistics();
    assert_eq!(stats.failed_comparisons.len(), 1);
}

#[tokio::test]
async fn test_list_apis_joins_services_and_routes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![
            service_json("s1", "orders"),
            service_json("s2", "billing"),
            service_json("s3", "orphan"),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/routes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![
            route_json("r1", "s1", "/orders"),
            route_json("r2", "s1", "/orders-legacy"),
            route_json("r3", "s2", "/billing"),
            route_json("r4", "gone", "/stale"),
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let apis = resources::list_apis(&client).await.unwrap();

    let names: Vec<&str> = apis.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["orders", "billing"]);
    assert_eq!(apis[0].route_id(), Some("r1"));
    assert_eq!(apis[1].uris, Some(vec!["/billing".to_string()]));

    let warnings = client.get_statistics().warnings;
    assert_eq!(warnings.len(), 2);
    assert!(warnings.iter().any(|w| w.contains("r4")));
    assert!(warnings.iter().any(|w| w.contains("r2")));
}

#[tokio::test]
async fn test_list_follows_next_links() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/consumers"))
        .and(query_param("offset", "page2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "c2", "username": "app2$api"}],
            "next": null
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/consumers"))
        .and(query_param_is_missing("offset"))
        .and(query_param("size", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "c1", "username": "app1$api"}],
            "next": "/consumers?offset=page2"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let consumers = client.consumers().list().await.unwrap();

    let ids: Vec<&str> = consumers.iter().filter_map(|c| c.id.as_deref()).collect();
    assert_eq!(ids, vec!["c1", "c2"]);
}

// ── consumers and plugins ─────────────────────────────────────────────────

#[tokio::test]
async fn test_create_consumer_uses_generated_username() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/consumers"))
        .and(body_partial_json(json!({"username": "my-app$orders", "custom_id": "my-app"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "c1",
            "username": "my-app$orders",
            "custom_id": "my-app"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let consumer = resources::create_consumer(&client, "my-app", "orders", Some("my-app"))
        .await
        .unwrap();
    assert_eq!(consumer.id.as_deref(), Some("c1"));
}

#[tokio::test]
async fn test_find_consumers_by_custom_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/consumers"))
        .and(query_param("custom_id", "my-app"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![
            json!({"id": "c1", "username": "my-app$orders", "custom_id": "my-app"}),
            json!({"id": "c2", "username": "my-app$billing", "custom_id": "my-app"}),
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let consumers = resources::find_consumers_by_custom_id(&client, "my-app")
        .await
        .unwrap();
    assert_eq!(consumers.len(), 2);
}

#[tokio::test]
async fn test_api_and_consumer_plugins() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/s1/plugins"))
        .and(body_partial_json(json!({"name": "rate-limiting", "config": {"minute": 10}})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "p1",
            "name": "rate-limiting",
            "config": {"minute": 10, "policy": "local"},
            "service": {"id": "s1"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/plugins/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "p1",
            "name": "rate-limiting",
            "config": {"minute": 20}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/consumers/c1/key-auth"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "k1", "key": "secret"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/consumers/c1/key-auth/k1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);

    let plugin = Plugin::new("rate-limiting", json!({"minute": 10}));
    let created = resources::add_api_plugin(&client, "s1", &plugin).await.unwrap();
    assert_eq!(created.id.as_deref(), Some("p1"));
    assert_eq!(created.service.map(|s| s.id), Some("s1".to_string()));

    let patched = resources::update_plugin(&client, "p1", &Plugin::new("rate-limiting", json!({"minute": 20})))
        .await
        .unwrap();
    assert_eq!(patched.config, Some(json!({"minute": 20})));

    let credential = resources::add_consumer_plugin(&client, "c1", "key-auth", &json!({"key": "secret"}))
        .await
        .unwrap();
    assert_eq!(credential["id"], "k1");

    resources::delete_consumer_plugin(&client, "c1", "key-auth", "k1")
        .await
        .unwrap();
}

// ── diagnostics ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_statistics_action_log_contains_only_mutations() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services"))
        .respond_with(ResponseTemplate::new(201).set_body_json(service_json("s1", "orders")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![service_json("s1", "orders")])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let service = gateway_adapter::model::Service {
        name: Some("orders".to_string()),
        host: Some("orders.internal".to_string()),
        ..Default::default()
    };

    client.reset_statistics(true);
    client.services().create(&service).await.unwrap();
    client.services().list().await.unwrap();

    let stats = client.get_statistics();
    assert_eq!(stats.count(Verb::Post), 1);
    assert!(stats.count(Verb::Get) >= 1);
    assert_eq!(stats.action_log.len(), 1);
    assert_eq!(stats.action_log[0].method, "POST");
    assert_eq!(stats.action_log[0].body.as_ref().unwrap()["name"], "orders");
    assert!(!client.get_statistics().keep_action_log);

    client.reset_statistics(false);
    client.services().create(&service).await.unwrap();
    let stats = client.get_statistics();
    assert_eq!(stats.count(Verb::Post), 1);
    assert!(stats.action_log.is_empty());
}

#[tokio::test]
async fn test_probe_status_and_info() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"version": "3.4.0"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "database": {"reachable": true},
            "server": {"connections_active": 1}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let info = client.gateway_info().await.unwrap();
    assert_eq!(info["version"], "3.4.0");

    client.probe_status().await.unwrap();
    assert!(client.is_available());
    assert_eq!(
        client.cluster_status().unwrap()["database"]["reachable"],
        true
    );
}

#[tokio::test]
async fn test_endpoint_urls_are_switchable() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"node": "second"})))
        .expect(1)
        .mount(&second)
        .await;

    let client = client_for(&first);
    client.set_gateway_url(second.uri());
    client.set_adapter_url("https://adapter.example.com");

    assert_eq!(client.gateway_url(), second.uri());
    assert_eq!(client.adapter_url(), "https://adapter.example.com");
    assert_eq!(client.gateway_info().await.unwrap()["node"], "second");
}

#[tokio::test]
async fn test_unreachable_gateway_surfaces_transport_failure() {
    let state = Arc::new(AdapterState::new("http://localhost:1", "http://adapter.test"));
    let transport = Arc::new(HttpTransport::new(Duration::from_millis(200)).unwrap());
    let policy = RetryPolicy {
        request_timeout: Duration::from_millis(200),
        retry_delay: Duration::from_millis(1),
        max_retries: 2,
    };
    let client = GatewayClient::from_parts(transport, state, policy, 100, false);

    let err = client.services().list().await.unwrap_err();

    match err {
        Error::TransportFailure { attempts, .. } => assert_eq!(attempts, 3),
        other => panic!("expected TransportFailure, got {other:?}"),
    }
    assert!(client.is_available());
}

#[tokio::test]
async fn test_find_route_for_service_with_two_routes_warns() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/services/s1/routes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![
            route_json("r1", "s1", "/a"),
            route_json("r2", "s1", "/b"),
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let route = find_route_for_service(&client, "s1").await.unwrap().unwrap();

    assert_eq!(route.id.as_deref(), Some("r1"));
    assert_eq!(client.get_statistics().warnings.len(), 1);
}
