mod state;

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{watch, Mutex},
    time::MissedTickBehavior,
};
use tracing::{debug, info, warn};

use climate_common::{
    ActuatorAction, ActuatorCommand, ControlState, HysteresisPolicy, SensorReading,
};

use crate::ports::{read_with_timeout, ActuatorError, ActuatorPort, SensorPort};

pub use state::ThermostatState;

/// Periodic hysteresis controller. The only writer of the actuator flags in
/// [`ThermostatState`].
pub struct ControlLoop<S, A> {
    state: ThermostatState,
    sensor: Arc<S>,
    actuators: Arc<A>,
    policy: HysteresisPolicy,
    period: Duration,
    sensor_timeout: Duration,
    actuator_timeout: Duration,
    heater_lane: Arc<Mutex<()>>,
    fan_lane: Arc<Mutex<()>>,
    last_state: Option<ControlState>,
}

impl<S: SensorPort, A: ActuatorPort> ControlLoop<S, A> {
    pub fn new(state: ThermostatState, sensor: Arc<S>, actuators: Arc<A>) -> Self {
        let config = state.config().clone();
        Self {
            state,
            sensor,
            actuators,
            policy: HysteresisPolicy::from_config(&config),
            period: Duration::from_millis(config.period_ms),
            sensor_timeout: Duration::from_millis(config.sensor_timeout_ms),
            actuator_timeout: Duration::from_millis(config.actuator_timeout_ms),
            heater_lane: Arc::new(Mutex::new(())),
            fan_lane: Arc::new(Mutex::new(())),
            last_state: None,
        }
    }

    /// Runs until `shutdown` flips to `true` (or its sender is dropped), then
    /// forces both actuators off.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(period_ms = self.period.as_millis() as u64, "control loop started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                _ = interval.tick() => {}
                _ = self.state.changed() => {
                    debug!("settings changed, re-evaluating");
                    interval.reset();
                }
            }

            self.tick().await;
        }

        self.fail_safe().await;
        info!("control loop stopped");
    }

    /// One evaluation: sample, decide, drive, record.
    pub async fn tick(&mut self) -> ActuatorCommand {
        let snapshot = self.state.snapshot().await;

        let reading = match read_with_timeout(self.sensor.as_ref(), self.sensor_timeout).await {
            Ok(temperature_c) => Some(SensorReading::now(temperature_c)),
            Err(err) => {
                warn!("sensor read failed, holding actuators off: {err}");
                None
            }
        };

        let decided = self.policy.decide(
            snapshot.mode,
            snapshot.goal_temperature,
            reading.map(|reading| reading.temperature_c),
        );
        let command = self.drive(decided).await;
        self.state.apply_actuator_result(command).await;

        let control_state = ControlState::derive(snapshot.mode, command);
        if self.last_state != Some(control_state) {
            info!(
                state = control_state.as_str(),
                goal = snapshot.goal_temperature,
                temperature = reading.map(|reading| reading.temperature_c),
                "control state changed"
            );
            self.last_state = Some(control_state);
        }
        if let Some(reading) = reading {
            debug!(
                temperature = reading.temperature_c,
                read_at = %reading.read_at,
                ?command,
                "tick"
            );
        }

        command
    }

    /// Forces both outputs off and records it.
    pub async fn fail_safe(&mut self) {
        warn!("forcing heater and fan off");
        let command = self.drive(ActuatorCommand::AllOff).await;
        self.state.apply_actuator_result(command).await;
        self.last_state = None;
    }

    /// Issues the pin writes for `command` and returns what was effectively
    /// commanded. After a failed write only switch-off writes are attempted.
    /// A switch-on that timed out may still land, so it is reported as on.
    async fn drive(&self, command: ActuatorCommand) -> ActuatorCommand {
        let mut failed = false;
        let mut unsettled = None;

        for action in command.actions() {
            let switching_on = matches!(
                action,
                ActuatorAction::Heater(true) | ActuatorAction::Fan(true)
            );
            if failed && switching_on {
                debug!(?action, "skipped after failed write");
                continue;
            }
            if let Err(err) = self.write(action).await {
                warn!("actuator write failed, retrying next cycle: {err}");
                if switching_on && matches!(err, ActuatorError::Timeout { .. }) {
                    unsettled = Some(action);
                }
                failed = true;
            }
        }

        match unsettled {
            Some(ActuatorAction::Heater(_)) => ActuatorCommand::Heat,
            Some(ActuatorAction::Fan(_)) => ActuatorCommand::Cool,
            None if failed => ActuatorCommand::AllOff,
            None => command,
        }
    }

    /// Each write runs in its own task holding the pin's lane until the port
    /// returns, so a write that outlives its timeout still lands before the
    /// next write to the same pin.
    async fn write(&self, action: ActuatorAction) -> Result<(), ActuatorError> {
        let (actuator, lane) = match action {
            ActuatorAction::Heater(_) => ("heater", &self.heater_lane),
            ActuatorAction::Fan(_) => ("fan", &self.fan_lane),
        };
        let lane = Arc::clone(lane);
        let actuators = Arc::clone(&self.actuators);

        let write = async move {
            let guard = lane.lock_owned().await;
            tokio::spawn(async move {
                let _guard = guard;
                match action {
                    ActuatorAction::Heater(on) => actuators.set_heater(on).await,
                    ActuatorAction::Fan(on) => actuators.set_fan(on).await,
                }
            })
            .await
        };

        match tokio::time::timeout(self.actuator_timeout, write).await {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => Err(ActuatorError::Io {
                actuator,
                source: std::io::Error::other(err),
            }),
            Err(_) => Err(ActuatorError::Timeout {
                actuator,
                timeout: self.actuator_timeout,
            }),
        }
    }
}
