use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    http::{header::CONTENT_TYPE, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use tokio::{net::TcpListener, sync::watch, task::JoinSet};
use tower_http::trace::TraceLayer;
use tracing::info;

use climate_common::{ServerConfig, WELL_KNOWN_CORE};

use crate::{
    control::ThermostatState,
    ports::SensorPort,
    resources::{
        Actuator, ActuatorResource, ClimateControlResource, ContentFormat, Resource, Response,
        ResponseCode, StatusResource, TemperatureResource,
    },
};

impl IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        let status = match self.code {
            ResponseCode::Content => StatusCode::OK,
            ResponseCode::Changed if self.payload.is_empty() => StatusCode::NO_CONTENT,
            ResponseCode::Changed => StatusCode::OK,
            ResponseCode::BadRequest => StatusCode::BAD_REQUEST,
            ResponseCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ResponseCode::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let content_type = match self.format {
            ContentFormat::Text => "text/plain; charset=utf-8",
            ContentFormat::Json => "application/json",
        };

        if status == StatusCode::NO_CONTENT {
            return status.into_response();
        }
        (status, [(CONTENT_TYPE, content_type)], self.payload).into_response()
    }
}

/// Collects resources into a router plus a discovery listing.
#[derive(Default)]
pub struct ResourceRouter {
    router: Router,
    links: Vec<String>,
}

impl ResourceRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<R: Resource>(mut self, resource: R) -> Self {
        let resource = Arc::new(resource);
        self.links.push(format!(
            "</{}>;title=\"{}\"",
            resource.path(),
            resource.title()
        ));

        let path = format!("/{}", resource.path());
        let reader = resource.clone();
        let writer = resource;
        self.router = self.router.route(
            &path,
            get(move || {
                let resource = reader.clone();
                async move { resource.get().await }
            })
            .post(move |payload: String| {
                let resource = writer.clone();
                async move { resource.post(payload).await }
            }),
        );
        self
    }

    pub fn into_router(self) -> Router {
        let links = Arc::new(self.links.join(","));
        self.router
            .route(
                WELL_KNOWN_CORE,
                get(move || {
                    let links = links.clone();
                    async move {
                        (
                            [(CONTENT_TYPE, "application/link-format")],
                            links.as_str().to_owned(),
                        )
                    }
                }),
            )
            .layer(TraceLayer::new_for_http())
    }
}

/// Every thermostat resource, bound to the shared state and sensor.
pub fn build_router<S: SensorPort>(state: ThermostatState, sensor: Arc<S>) -> Router {
    ResourceRouter::new()
        .register(TemperatureResource::new(state.clone(), sensor.clone()))
        .register(ClimateControlResource::new(state.clone()))
        .register(ActuatorResource::new(state.clone(), Actuator::Heater))
        .register(ActuatorResource::new(state.clone(), Actuator::Fan))
        .register(StatusResource::new(state, sensor))
        .into_router()
}

/// One listener per configured address, all on the configured port.
pub async fn bind(config: &ServerConfig) -> anyhow::Result<Vec<TcpListener>> {
    let mut listeners = Vec::with_capacity(config.bind_addresses.len());
    for ip in &config.bind_addresses {
        let addr = SocketAddr::new(*ip, config.port);
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind controller server at {addr}"))?;
        let local = listener
            .local_addr()
            .with_context(|| format!("failed to resolve bound address for {addr}"))?;
        info!("controller listening on http://{local}");
        listeners.push(listener);
    }
    Ok(listeners)
}

/// Serves `router` on every listener until `shutdown` flips to `true`.
pub async fn serve(
    listeners: Vec<TcpListener>,
    router: Router,
    shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let mut servers = JoinSet::new();
    for listener in listeners {
        let router = router.clone();
        let shutdown = shutdown.clone();
        servers.spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(stopped(shutdown))
                .await
        });
    }

    while let Some(result) = servers.join_next().await {
        result
            .context("server task panicked")?
            .context("server failed")?;
    }
    Ok(())
}

async fn stopped(mut shutdown: watch::Receiver<bool>) {
    while !*shutdown.borrow() {
        if shutdown.changed().await.is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request},
    };
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    use climate_common::{ClimateMode, ControlConfig};

    use super::*;
    use crate::testing::FakeSensor;

    fn app(state: &ThermostatState) -> Router {
        build_router(state.clone(), Arc::new(FakeSensor::reading(19.75)))
    }

    async fn call(app: &Router, method: Method, uri: &str, body: &str) -> (StatusCode, String) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn climate_control_round_trip_over_http() {
        let state = ThermostatState::new(ControlConfig::default());
        let app = app(&state);

        assert_eq!(
            call(&app, Method::GET, "/climate-control", "").await,
            (StatusCode::OK, "off".to_string())
        );
        assert_eq!(
            call(&app, Method::POST, "/climate-control", "on").await.0,
            StatusCode::NO_CONTENT
        );
        assert_eq!(
            call(&app, Method::GET, "/climate-control", "").await,
            (StatusCode::OK, "on".to_string())
        );
        assert_eq!(state.snapshot().await.mode, ClimateMode::Auto);
    }

    #[tokio::test]
    async fn rejects_bad_payloads_and_writes_to_read_only_resources() {
        let state = ThermostatState::new(ControlConfig::default());
        let app = app(&state);

        assert_eq!(
            call(&app, Method::POST, "/temperature", "abc").await.0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            call(&app, Method::GET, "/temperature", "").await,
            (StatusCode::OK, "19.75".to_string())
        );
        assert_eq!(
            call(&app, Method::POST, "/heater", "on").await.0,
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            call(&app, Method::PUT, "/fan", "on").await.0,
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            call(&app, Method::GET, "/nope", "").await.0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(state.snapshot().await.goal_temperature, 20.0);
    }

    #[tokio::test]
    async fn status_write_returns_combined_record() {
        let state = ThermostatState::new(ControlConfig::default());
        let app = app(&state);

        let (status, body) = call(&app, Method::POST, "/status", "on,23").await;

        assert_eq!(status, StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["mode"], "on");
        assert_eq!(body["goalTemperature"], 23.0);
        assert_eq!(body["temperature"], 19.75);
    }

    #[tokio::test]
    async fn lists_resources_in_link_format() {
        let state = ThermostatState::new(ControlConfig::default());
        let (status, body) = call(&app(&state), Method::GET, "/.well-known/core", "").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            "</temperature>;title=\"Temperature Resource\",\
             </climate-control>;title=\"Climate Control Resource\",\
             </heater>;title=\"Heater Resource\",\
             </fan>;title=\"Fan Resource\",\
             </status>;title=\"Status Resource\""
        );
    }

    #[tokio::test]
    async fn serve_stops_on_shutdown() {
        let listeners = bind(&ServerConfig {
            bind_addresses: vec!["127.0.0.1".parse().unwrap()],
            port: 0,
        })
        .await
        .unwrap();
        assert_ne!(listeners[0].local_addr().unwrap().port(), 0);
        let state = ThermostatState::new(ControlConfig::default());
        let (stop, shutdown) = watch::channel(false);
        let server = tokio::spawn(serve(listeners, app(&state), shutdown));

        stop.send(true).unwrap();

        server.await.unwrap().unwrap();
    }
}
