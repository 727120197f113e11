//! Translation between the composite API view and the gateway's
//! service + route pair

use reqwest::Url;
use tracing::warn;

use super::{ApiEntity, EntityRef, Route, Service};
use crate::error::{Error, Result};
use crate::gateway::Statistics;

/// Split a composite API into the service and route the gateway stores.
///
/// When the entity was read from the gateway, the observed service and route
/// are the starting point, so fields this crate does not model survive.
/// Unset optional fields on `api` leave the observed values alone.
pub fn to_split_form(api: &ApiEntity) -> Result<(Service, Route)> {
    let (mut service, mut route) = api.observed.clone().unwrap_or_default();
    let upstream = parse_upstream(&api.upstream_url)?;

    service.id = api.id.clone().or(service.id);
    service.name = Some(api.name.clone());
    service.protocol = Some(upstream.protocol);
    service.host = Some(upstream.host);
    service.port = Some(upstream.port);
    service.path = upstream.path;
    service.retries = api.retries.or(service.retries);
    service.connect_timeout = api.upstream_connect_timeout.or(service.connect_timeout);
    service.read_timeout = api.upstream_read_timeout.or(service.read_timeout);
    service.write_timeout = api.upstream_send_timeout.or(service.write_timeout);

    route.name = Some(api.name.clone());
    route.hosts = api.hosts.clone().or(route.hosts);
    route.paths = api.uris.clone().or(route.paths);
    route.methods = api.methods.clone().or(route.methods);
    route.protocols = api.protocols.clone().or(route.protocols);
    route.strip_path = api.strip_uri.or(route.strip_path);
    route.preserve_host = api.preserve_host.or(route.preserve_host);
    if let Some(service_id) = &service.id {
        route.service = Some(EntityRef::new(service_id.clone()));
    }

    Ok((service, route))
}

/// Merge a service and its route into the composite view
pub fn to_composite_form(service: &Service, route: &Route) -> ApiEntity {
    ApiEntity {
        id: service.id.clone(),
        name: service
            .name
            .clone()
            .or_else(|| route.name.clone())
            .unwrap_or_default(),
        upstream_url: render_upstream(service),
        hosts: route.hosts.clone(),
        uris: route.paths.clone(),
        methods: route.methods.clone(),
        protocols: route.protocols.clone(),
        strip_uri: route.strip_path,
        preserve_host: route.preserve_host,
        retries: service.retries,
        upstream_connect_timeout: service.connect_timeout,
        upstream_read_timeout: service.read_timeout,
        upstream_send_timeout: service.write_timeout,
        created_at: service.extra.get("created_at").cloned(),
        observed: Some((service.clone(), route.clone())),
    }
}

/// Choose the route backing a service.
///
/// The composite view supports one route per service. When the gateway holds
/// several, the first one wins and a warning is logged and recorded.
pub fn pick_route(service_id: &str, routes: Vec<Route>, statistics: &Statistics) -> Option<Route> {
    if routes.len() > 1 {
        let ignored: Vec<&str> = routes[1..]
            .iter()
            .map(|r| r.id.as_deref().unwrap_or("<no id>"))
            .collect();
        let message = format!(
            "service {} has {} routes, using the first and ignoring {}",
            service_id,
            routes.len(),
            ignored.join(", ")
        );
        warn!("{}", message);
        statistics.record_warning(message);
    }
    routes.into_iter().next()
}

/// Consumer username for one application subscribed to one API
pub fn consumer_username(application_id: &str, api_id: &str) -> String {
    format!("{application_id}${api_id}")
}

/// Inverse of [`consumer_username`]
pub fn split_consumer_username(username: &str) -> Option<(&str, &str)> {
    username
        .split_once('$')
        .filter(|(app, api)| !app.is_empty() && !api.is_empty())
}

struct Upstream {
    protocol: String,
    host: String,
    port: u16,
    path: Option<String>,
}

fn parse_upstream(upstream_url: &str) -> Result<Upstream> {
    let url = Url::parse(upstream_url)
        .map_err(|e| Error::InvalidEntity(format!("upstream URL '{upstream_url}': {e}")))?;
    let host = url
        .host_str()
        .ok_or_else(|| Error::InvalidEntity(format!("upstream URL '{upstream_url}' has no host")))?
        .to_string();
    // the service entity has nowhere to keep these
    if !url.username().is_empty() || url.password().is_some() {
        return Err(Error::InvalidEntity(format!(
            "upstream URL '{upstream_url}' must not carry credentials"
        )));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(Error::InvalidEntity(format!(
            "upstream URL '{upstream_url}' must not carry a query or fragment"
        )));
    }
    let port = url.port_or_known_default().ok_or_else(|| {
        Error::InvalidEntity(format!("upstream URL '{upstream_url}' has no port"))
    })?;
    let path = match url.path() {
        "" | "/" => None,
        p => Some(p.to_string()),
    };

    Ok(Upstream {
        protocol: url.scheme().to_string(),
        host,
        port,
        path,
    })
}

fn default_port(protocol: &str) -> Option<u16> {
    match protocol {
        "http" | "ws" => Some(80),
        "https" | "wss" => Some(443),
        _ => None,
    }
}

fn render_upstream(service: &Service) -> String {
    let protocol = service.protocol.as_deref().unwrap_or("http");
    let host = service.host.as_deref().unwrap_or_default();
    let mut url = format!("{protocol}://{host}");
    if let Some(port) = service.port {
        if default_port(protocol) != Some(port) {
            url.push_str(&format!(":{port}"));
        }
    }
    if let Some(path) = service.path.as_deref().filter(|p| *p != "/") {
        url.push_str(path);
    }
    url
}
