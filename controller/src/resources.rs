use std::{future::Future, sync::Arc, time::Duration};

use tracing::{debug, warn};

use climate_common::{
    payload::{parse_integer_goal, parse_status_update, parse_switch},
    StatusPayload, ValidationError, RESOURCE_CLIMATE_CONTROL, RESOURCE_FAN, RESOURCE_HEATER,
    RESOURCE_STATUS, RESOURCE_TEMPERATURE, TITLE_CLIMATE_CONTROL, TITLE_FAN, TITLE_HEATER,
    TITLE_STATUS, TITLE_TEMPERATURE,
};

use crate::{
    control::ThermostatState,
    ports::{read_with_timeout, SensorPort},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    Content,
    Changed,
    BadRequest,
    MethodNotAllowed,
    InternalServerError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub code: ResponseCode,
    pub format: ContentFormat,
    pub payload: String,
}

impl Response {
    pub fn content(payload: impl Into<String>) -> Self {
        Self::text(ResponseCode::Content, payload)
    }

    pub fn changed() -> Self {
        Self::text(ResponseCode::Changed, "")
    }

    pub fn bad_request(err: &ValidationError) -> Self {
        Self::text(ResponseCode::BadRequest, err.to_string())
    }

    pub fn method_not_allowed() -> Self {
        Self::text(ResponseCode::MethodNotAllowed, "")
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::text(ResponseCode::InternalServerError, message)
    }

    fn text(code: ResponseCode, payload: impl Into<String>) -> Self {
        Self {
            code,
            format: ContentFormat::Text,
            payload: payload.into(),
        }
    }

    fn json(code: ResponseCode, payload: String) -> Self {
        Self {
            code,
            format: ContentFormat::Json,
            payload,
        }
    }
}

/// One addressable resource. Writes are rejected unless overridden.
pub trait Resource: Send + Sync + 'static {
    fn path(&self) -> &'static str;

    fn title(&self) -> &'static str;

    fn get(&self) -> impl Future<Output = Response> + Send;

    fn post(&self, payload: String) -> impl Future<Output = Response> + Send {
        let path = self.path();
        async move {
            debug!(path, payload = %payload, "write to read-only resource rejected");
            Response::method_not_allowed()
        }
    }
}

fn on_off(on: bool) -> &'static str {
    if on {
        "on"
    } else {
        "off"
    }
}

pub struct TemperatureResource<S> {
    state: ThermostatState,
    sensor: Arc<S>,
    timeout: Duration,
}

impl<S: SensorPort> TemperatureResource<S> {
    pub fn new(state: ThermostatState, sensor: Arc<S>) -> Self {
        let timeout = Duration::from_millis(state.config().sensor_timeout_ms);
        Self {
            state,
            sensor,
            timeout,
        }
    }
}

impl<S: SensorPort> Resource for TemperatureResource<S> {
    fn path(&self) -> &'static str {
        RESOURCE_TEMPERATURE
    }

    fn title(&self) -> &'static str {
        TITLE_TEMPERATURE
    }

    async fn get(&self) -> Response {
        match read_with_timeout(self.sensor.as_ref(), self.timeout).await {
            Ok(temperature_c) => Response::content(format!("{temperature_c:.2}")),
            Err(err) => {
                warn!("temperature read failed: {err}");
                Response::server_error("temperature sensor unavailable")
            }
        }
    }

    async fn post(&self, payload: String) -> Response {
        debug!(payload = %payload, "goal temperature write");
        let goal_c = match parse_integer_goal(&payload) {
            Ok(goal_c) => goal_c,
            Err(err) => return Response::bad_request(&err),
        };
        match self.state.set_goal(goal_c).await {
            Ok(()) => Response::changed(),
            Err(err) => Response::bad_request(&err),
        }
    }
}

pub struct ClimateControlResource {
    state: ThermostatState,
}

impl ClimateControlResource {
    pub fn new(state: ThermostatState) -> Self {
        Self { state }
    }
}

impl Resource for ClimateControlResource {
    fn path(&self) -> &'static str {
        RESOURCE_CLIMATE_CONTROL
    }

    fn title(&self) -> &'static str {
        TITLE_CLIMATE_CONTROL
    }

    async fn get(&self) -> Response {
        Response::content(self.state.snapshot().await.mode.as_str())
    }

    async fn post(&self, payload: String) -> Response {
        debug!(payload = %payload, "climate-control write");
        match parse_switch(&payload) {
            Ok(mode) => {
                self.state.set_mode(mode).await;
                Response::changed()
            }
            Err(err) => Response::bad_request(&err),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actuator {
    Heater,
    Fan,
}

/// Read-only view of one actuator flag.
pub struct ActuatorResource {
    state: ThermostatState,
    actuator: Actuator,
}

impl ActuatorResource {
    pub fn new(state: ThermostatState, actuator: Actuator) -> Self {
        Self { state, actuator }
    }
}

impl Resource for ActuatorResource {
    fn path(&self) -> &'static str {
        match self.actuator {
            Actuator::Heater => RESOURCE_HEATER,
            Actuator::Fan => RESOURCE_FAN,
        }
    }

    fn title(&self) -> &'static str {
        match self.actuator {
            Actuator::Heater => TITLE_HEATER,
            Actuator::Fan => TITLE_FAN,
        }
    }

    async fn get(&self) -> Response {
        let snapshot = self.state.snapshot().await;
        let on = match self.actuator {
            Actuator::Heater => snapshot.heater_on,
            Actuator::Fan => snapshot.fan_on,
        };
        Response::content(on_off(on))
    }
}

pub struct StatusResource<S> {
    state: ThermostatState,
    sensor: Arc<S>,
    timeout: Duration,
}

impl<S: SensorPort> StatusResource<S> {
    pub fn new(state: ThermostatState, sensor: Arc<S>) -> Self {
        let timeout = Duration::from_millis(state.config().sensor_timeout_ms);
        Self {
            state,
            sensor,
            timeout,
        }
    }

    /// Sampled before any state access so the lock is never held over I/O.
    async fn sample(&self) -> Option<f32> {
        match read_with_timeout(self.sensor.as_ref(), self.timeout).await {
            Ok(temperature_c) => Some(temperature_c),
            Err(err) => {
                warn!("status temperature read failed: {err}");
                None
            }
        }
    }

    fn render(code: ResponseCode, body: &StatusPayload) -> Response {
        match serde_json::to_string(body) {
            Ok(json) => Response::json(code, json),
            Err(err) => {
                warn!("status serialization failed: {err}");
                Response::server_error("status unavailable")
            }
        }
    }
}

impl<S: SensorPort> Resource for StatusResource<S> {
    fn path(&self) -> &'static str {
        RESOURCE_STATUS
    }

    fn title(&self) -> &'static str {
        TITLE_STATUS
    }

    async fn get(&self) -> Response {
        let temperature = self.sample().await;
        let snapshot = self.state.snapshot().await;
        Self::render(ResponseCode::Content, &snapshot.status_payload(temperature))
    }

    async fn post(&self, payload: String) -> Response {
        debug!(payload = %payload, "status write");
        let update = match parse_status_update(&payload) {
            Ok(update) => update,
            Err(err) => return Response::bad_request(&err),
        };
        let snapshot = match self.state.apply_update(update).await {
            Ok(snapshot) => snapshot,
            Err(err) => return Response::bad_request(&err),
        };
        let temperature = self.sample().await;
        Self::render(ResponseCode::Changed, &snapshot.status_payload(temperature))
    }
}
