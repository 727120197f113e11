//! Plugin attachment
//!
//! API-scoped plugins hang off the API's service. Consumer-scoped plugin
//! data (credentials, ACL groups) lives under the consumer, keyed by plugin
//! name, and each entry is addressed by its own id.

use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::gateway::GatewayClient;
use crate::model::Plugin;

#[instrument(skip(client))]
pub async fn list_api_plugins(client: &GatewayClient, service_id: &str) -> Result<Vec<Plugin>> {
    client.service_plugins(service_id).list().await
}

/// Attach `plugin` to the service backing an API
#[instrument(skip(client, plugin), fields(plugin_name = %plugin.name))]
pub async fn add_api_plugin(
    client: &GatewayClient,
    service_id: &str,
    plugin: &Plugin,
) -> Result<Plugin> {
    // scoped by the collection path
    let mut body = plugin.clone();
    body.id = None;
    body.service = None;

    let created = client.service_plugins(service_id).create(&body).await?;
    debug!(
        "Attached plugin {} to service {} as {:?}",
        plugin.name, service_id, created.id
    );
    Ok(created)
}

/// Patch any plugin by its own id
#[instrument(skip(client, plugin), fields(plugin_name = %plugin.name))]
pub async fn update_plugin(
    client: &GatewayClient,
    plugin_id: &str,
    plugin: &Plugin,
) -> Result<Plugin> {
    let mut body = plugin.clone();
    body.id = None;
    client.plugins().update(plugin_id, &body).await
}

#[instrument(skip(client))]
pub async fn delete_plugin(client: &GatewayClient, plugin_id: &str) -> Result<()> {
    client.plugins().delete(plugin_id).await
}

#[instrument(skip(client))]
pub async fn list_consumer_plugins(
    client: &GatewayClient,
    consumer_id: &str,
    plugin_name: &str,
) -> Result<Vec<Value>> {
    client.consumer_plugin(consumer_id, plugin_name).list().await
}

#[instrument(skip(client, data))]
pub async fn add_consumer_plugin(
    client: &GatewayClient,
    consumer_id: &str,
    plugin_name: &str,
    data: &Value,
) -> Result<Value> {
    client
        .consumer_plugin(consumer_id, plugin_name)
        .create(data)
        .await
}

#[instrument(skip(client, data))]
pub async fn update_consumer_plugin(
    client: &GatewayClient,
    consumer_id: &str,
    plugin_name: &str,
    plugin_id: &str,
    data: &Value,
) -> Result<Value> {
    client
        .consumer_plugin(consumer_id, plugin_name)
        .update(plugin_id, data)
        .await
}

#[instrument(skip(client))]
pub async fn delete_consumer_plugin(
    client: &GatewayClient,
    consumer_id: &str,
    plugin_name: &str,
    plugin_id: &str,
) -> Result<()> {
    client
        .consumer_plugin(consumer_id, plugin_name)
        .delete(plugin_id)
        .await
}
