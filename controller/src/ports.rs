use std::{future::Future, time::Duration};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("no temperature sensor matching {0:?}")]
    DeviceNotFound(String),
    #[error("sensor read timed out after {0:?}")]
    Timeout(Duration),
    #[error("sensor io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("sensor returned malformed data: {0}")]
    Malformed(String),
    #[error("sensor reported a CRC mismatch")]
    CrcMismatch,
}

#[derive(Debug, Error)]
pub enum ActuatorError {
    #[error("{actuator} write timed out after {timeout:?}")]
    Timeout {
        actuator: &'static str,
        timeout: Duration,
    },
    #[error("{actuator} pin write failed: {source}")]
    Io {
        actuator: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Reads the instantaneous temperature in degrees Celsius.
pub trait SensorPort: Send + Sync + 'static {
    fn read_temperature(&self) -> impl Future<Output = Result<f32, SensorError>> + Send;
}

/// Drives the heater and fan outputs.
pub trait ActuatorPort: Send + Sync + 'static {
    fn set_heater(&self, on: bool) -> impl Future<Output = Result<(), ActuatorError>> + Send;

    fn set_fan(&self, on: bool) -> impl Future<Output = Result<(), ActuatorError>> + Send;
}

/// Sensor read bounded by `timeout`.
pub async fn read_with_timeout<S: SensorPort>(
    sensor: &S,
    timeout: Duration,
) -> Result<f32, SensorError> {
    match tokio::time::timeout(timeout, sensor.read_temperature()).await {
        Ok(result) => result,
        Err(_) => Err(SensorError::Timeout(timeout)),
    }
}
