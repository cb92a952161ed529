use std::{future::Future, io::ErrorKind, net::IpAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use tokio::sync::watch;
use tracing::{info, warn};

use climate_common::RuntimeConfig;

use crate::{
    adapters::{GpioActuators, GpioOutputPin, SimulatedPlant, W1TemperatureSensor},
    control::{ControlLoop, ThermostatState},
    ports::{ActuatorPort, SensorPort},
    server,
};

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = load_runtime_config().await?;
    let shutdown = shutdown_signal().context("failed to install signal handlers")?;
    let state = ThermostatState::new(config.control.clone());
    let hardware = &config.hardware;

    if hardware.simulated {
        info!("running against a simulated room");
        let plant = Arc::new(SimulatedPlant::new(config.control.default_goal_c - 2.0));
        return serve(&config, state, plant.clone(), plant, shutdown).await;
    }

    let sensor = W1TemperatureSensor::discover(&hardware.w1_root, &hardware.sensor_id)
        .await
        .with_context(|| format!("failed to find temperature sensor {}", hardware.sensor_id))?;
    info!(path = %sensor.slave_path().display(), "temperature sensor found");

    let heater = GpioOutputPin::provision(&hardware.gpio_root, hardware.heater_pin, "heater")
        .await
        .with_context(|| format!("failed to provision heater pin {}", hardware.heater_pin))?;
    let fan = GpioOutputPin::provision(&hardware.gpio_root, hardware.fan_pin, "fan")
        .await
        .with_context(|| format!("failed to provision fan pin {}", hardware.fan_pin))?;

    serve(
        &config,
        state,
        Arc::new(sensor),
        Arc::new(GpioActuators::new(heater, fan)),
        shutdown,
    )
    .await
}

async fn serve<S: SensorPort, A: ActuatorPort>(
    config: &RuntimeConfig,
    state: ThermostatState,
    sensor: Arc<S>,
    actuators: Arc<A>,
    shutdown_requested: impl Future<Output = &'static str>,
) -> anyhow::Result<()> {
    let listeners = server::bind(&config.server).await?;
    let router = server::build_router(state.clone(), sensor.clone());

    let (stop, shutdown) = watch::channel(false);
    let control = ControlLoop::new(state, sensor, actuators);
    let control_task = tokio::spawn(control.run(shutdown.clone()));

    let server = server::serve(listeners, router, shutdown);
    tokio::pin!(server);

    let served = tokio::select! {
        result = &mut server => result,
        signal = shutdown_requested => {
            info!(signal, "shutdown requested");
            let _ = stop.send(true);
            server.await
        }
    };

    // Reached on a server failure too; the loop must still switch everything off.
    let _ = stop.send(true);
    control_task.await.context("control loop panicked")?;
    served
}

/// Listens for SIGINT and SIGTERM. Handlers are installed before this
/// returns, so no signal is missed once it has.
#[cfg(unix)]
fn shutdown_signal() -> std::io::Result<impl Future<Output = &'static str>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => "SIGINT",
            _ = terminate.recv() => "SIGTERM",
        }
    })
}

#[cfg(not(unix))]
fn shutdown_signal() -> std::io::Result<impl Future<Output = &'static str>> {
    Ok(async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
        "ctrl-c"
    })
}

async fn load_runtime_config() -> anyhow::Result<RuntimeConfig> {
    let mut config = match std::env::var("CLIMATE_CONFIG") {
        Ok(path) => read_config_file(PathBuf::from(path)).await?,
        Err(_) => RuntimeConfig::default(),
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config.control.sanitize();
    Ok(config)
}

async fn read_config_file(path: PathBuf) -> anyhow::Result<RuntimeConfig> {
    match tokio::fs::read(&path).await {
        Ok(raw) => serde_json::from_slice::<RuntimeConfig>(&raw)
            .with_context(|| format!("invalid config file {}", path.display())),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            warn!("config file {} not found, using defaults", path.display());
            Ok(RuntimeConfig::default())
        }
        Err(err) => Err(err).with_context(|| format!("failed to read {}", path.display())),
    }
}

fn apply_env_overrides(config: &mut RuntimeConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(port) = var("CLIMATE_PORT").and_then(|value| value.parse::<u16>().ok()) {
        config.server.port = port;
    }
    if let Some(bind) = var("CLIMATE_BIND") {
        let addresses: Vec<IpAddr> = bind
            .split(',')
            .filter_map(|value| value.trim().parse().ok())
            .collect();
        if addresses.is_empty() {
            warn!("ignoring CLIMATE_BIND={bind:?}, no valid addresses");
        } else {
            config.server.bind_addresses = addresses;
        }
    }
    if let Some(sensor_id) = var("CLIMATE_SENSOR_ID").filter(|value| !value.trim().is_empty()) {
        config.hardware.sensor_id = sensor_id.trim().to_string();
    }
    if let Some(pin) = var("CLIMATE_HEATER_PIN").and_then(|value| value.parse::<u32>().ok()) {
        config.hardware.heater_pin = pin;
    }
    if let Some(pin) = var("CLIMATE_FAN_PIN").and_then(|value| value.parse::<u32>().ok()) {
        config.hardware.fan_pin = pin;
    }
    if let Some(simulated) = var("CLIMATE_SIMULATED") {
        config.hardware.simulated = matches!(
            simulated.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes"
        );
    }
}
