//! Composite API lifecycle
//!
//! An API is one service plus one route. The gateway has no multi-entity
//! transaction, so the two calls run in sequence: service first on create,
//! route first on delete. A route failure after the service was created
//! leaves the service behind for the next full resync to clean up.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::error::{Error, Result};
use crate::gateway::GatewayClient;
use crate::matcher::matches_recorded;
use crate::model::{pick_route, to_composite_form, to_split_form, ApiEntity, EntityRef, Route};

/// The route backing a service, if the service has one
pub async fn find_route_for_service(
    client: &GatewayClient,
    service_id: &str,
) -> Result<Option<Route>> {
    let routes = client.service_routes(service_id).list().await?;
    Ok(pick_route(service_id, routes, &client.state().statistics))
}

/// Create the service, then a route pointing at it
#[instrument(skip(client, api), fields(name = %api.name))]
pub async fn create_api(client: &GatewayClient, api: &ApiEntity) -> Result<ApiEntity> {
    let (service, mut route) = to_split_form(api)?;

    let created_service = client.services().create(&service).await?;
    let service_id = created_service.id.clone().ok_or_else(|| {
        Error::UnknownReference(format!("gateway returned no id for service {}", api.name))
    })?;
    debug!("Created service {} for API {}", service_id, api.name);

    route.id = None;
    route.service = Some(EntityRef::new(service_id.clone()));
    let created_route = match client.routes().create(&route).await {
        Ok(route) => route,
        Err(e) => {
            warn!(
                "Route creation for API {} failed, service {} is left without a route: {}",
                api.name, service_id, e
            );
            return Err(e);
        }
    };

    info!("Created API {} (service {})", api.name, service_id);
    Ok(to_composite_form(&created_service, &created_route))
}

/// Patch the service and its route with the modeled fields of `api`.
///
/// The upstream URL is always applied in full, so an upstream without a path
/// clears the stored one. Unset route fields (`hosts`, `uris`, `methods`,
/// `protocols`) are left out of the patch and keep their current gateway
/// values; they cannot be cleared through this call.
///
/// The two patches are independent; if the route patch fails the service
/// keeps its new values.
#[instrument(skip(client, api), fields(name = %api.name))]
pub async fn update_api(
    client: &GatewayClient,
    service_id: &str,
    api: &ApiEntity,
) -> Result<ApiEntity> {
    let route = find_route_for_service(client, service_id)
        .await?
        .ok_or_else(|| Error::UnknownReference(format!("service {service_id} has no route")))?;
    let route_id = route
        .id
        .ok_or_else(|| Error::UnknownReference(format!("route of service {service_id} has no id")))?;

    // Only send modeled fields; the gateway keeps everything else
    let mut desired = api.clone();
    desired.observed = None;
    desired.id = Some(service_id.to_string());
    let (mut service_patch, mut route_patch) = to_split_form(&desired)?;
    service_patch.id = None;
    route_patch.id = None;

    let mut service_body = serde_json::to_value(&service_patch)?;
    if let Value::Object(fields) = &mut service_body {
        fields.entry("path").or_insert(Value::Null);
    }

    let updated_service = client
        .services()
        .update_fields(service_id, service_body)
        .await?;
    let updated_route = client.routes().update(&route_id, &route_patch).await?;

    info!("Updated API {} (service {}, route {})", api.name, service_id, route_id);
    Ok(to_composite_form(&updated_service, &updated_route))
}

/// Delete the route, then the service
#[instrument(skip(client))]
pub async fn delete_api(client: &GatewayClient, service_id: &str) -> Result<()> {
    let route = find_route_for_service(client, service_id)
        .await?
        .ok_or_else(|| Error::UnknownReference(format!("service {service_id} has no route")))?;
    let route_id = route
        .id
        .ok_or_else(|| Error::UnknownReference(format!("route of service {service_id} has no id")))?;

    client.routes().delete(&route_id).await?;
    client.services().delete(service_id).await?;

    info!("Deleted API (service {}, route {})", service_id, route_id);
    Ok(())
}

/// `None` when the service does not exist or has no route
#[instrument(skip(client))]
pub async fn get_api(client: &GatewayClient, service_id: &str) -> Result<Option<ApiEntity>> {
    let Some(service) = client.services().get(service_id).await? else {
        return Ok(None);
    };
    let route = find_route_for_service(client, service_id).await?;
    Ok(route.map(|r| to_composite_form(&service, &r)))
}

/// All composite APIs on the gateway
///
/// Services and routes are fetched concurrently. Services without a route
/// are not APIs; routes pointing at unknown services are skipped.
#[instrument(skip(client))]
pub async fn list_apis(client: &GatewayClient) -> Result<Vec<ApiEntity>> {
    let services_collection = client.services();
    let routes_collection = client.routes();
    let (services, routes) =
        tokio::try_join!(services_collection.list(), routes_collection.list())?;

    let service_index: HashMap<String, usize> = services
        .iter()
        .enumerate()
        .filter_map(|(i, s)| s.id.clone().map(|id| (id, i)))
        .collect();

    // Group routes by service, keeping the gateway's ordering
    let mut grouped: Vec<(String, Vec<Route>)> = Vec::new();
    let mut group_index: HashMap<String, usize> = HashMap::new();
    for route in routes {
        let Some(service_id) = route.service_id().map(str::to_string) else {
            skip_route(client, &route, "it has no service reference");
            continue;
        };
        if !service_index.contains_key(&service_id) {
            skip_route(client, &route, &format!("service {service_id} does not exist"));
            continue;
        }
        match group_index.get(&service_id) {
            Some(&i) => grouped[i].1.push(route),
            None => {
                group_index.insert(service_id.clone(), grouped.len());
                grouped.push((service_id, vec![route]));
            }
        }
    }

    let statistics = &client.state().statistics;
    let apis: Vec<ApiEntity> = grouped
        .into_iter()
        .filter_map(|(service_id, routes)| {
            let service = &services[service_index[&service_id]];
            pick_route(&service_id, routes, statistics).map(|r| to_composite_form(service, &r))
        })
        .collect();

    debug!(
        "Found {} API(s) across {} service(s)",
        apis.len(),
        services.len()
    );
    Ok(apis)
}

fn skip_route(client: &GatewayClient, route: &Route, reason: &str) {
    let message = format!(
        "skipping route {} because {}",
        route.id.as_deref().unwrap_or("<no id>"),
        reason
    );
    warn!("{}", message);
    client.state().statistics.record_warning(message);
}

/// Whether the gateway already holds what `desired` asks for.
///
/// Failed comparisons are recorded in the statistics while action logging
/// is enabled.
pub fn api_matches(
    client: &GatewayClient,
    desired: &ApiEntity,
    observed: &ApiEntity,
) -> Result<bool> {
    let desired = serde_json::to_value(desired)?;
    let observed = serde_json::to_value(observed)?;
    Ok(matches_recorded(
        &desired,
        &observed,
        &client.state().statistics,
    ))
}
