//! Consumers
//!
//! One consumer exists per application and API. Its username is
//! `<applicationId>$<apiId>`; `custom_id` carries the portal's application
//! id so all consumers of an application can be found again.

use tracing::{info, instrument};

use crate::error::Result;
use crate::gateway::GatewayClient;
use crate::model::{consumer_username, Consumer};

/// Look a consumer up by id or username
#[instrument(skip(client))]
pub async fn get_consumer(client: &GatewayClient, id_or_username: &str) -> Result<Option<Consumer>> {
    client.consumers().get(id_or_username).await
}

#[instrument(skip(client))]
pub async fn find_consumers_by_custom_id(
    client: &GatewayClient,
    custom_id: &str,
) -> Result<Vec<Consumer>> {
    client
        .consumers()
        .list_filtered(&[("custom_id", custom_id)])
        .await
}

/// Create the consumer for `application_id` subscribed to `api_id`
#[instrument(skip(client))]
pub async fn create_consumer(
    client: &GatewayClient,
    application_id: &str,
    api_id: &str,
    custom_id: Option<&str>,
) -> Result<Consumer> {
    let consumer = Consumer {
        username: Some(consumer_username(application_id, api_id)),
        custom_id: custom_id.map(str::to_string),
        ..Default::default()
    };
    let created = client.consumers().create(&consumer).await?;
    info!(
        "Created consumer {} ({:?})",
        consumer.username.as_deref().unwrap_or_default(),
        created.id
    );
    Ok(created)
}
