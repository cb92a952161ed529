use std::sync::Arc;

use tokio::sync::{Mutex, Notify};

use climate_common::{
    ActuatorCommand, ClimateMode, ControlConfig, Snapshot, StatusUpdate, ValidationError,
};

#[derive(Debug)]
struct Record {
    goal_temperature: f32,
    mode: ClimateMode,
    command: ActuatorCommand,
}

impl Record {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            goal_temperature: self.goal_temperature,
            mode: self.mode,
            heater_on: self.command.heater_on(),
            fan_on: self.command.fan_on(),
        }
    }
}

/// The single shared thermostat record.
///
/// Every operation takes the one lock exactly once, so callers only ever see
/// whole-record states. Goal and mode are written by request handlers; the
/// actuator command is written only by the control loop.
#[derive(Debug, Clone)]
pub struct ThermostatState {
    record: Arc<Mutex<Record>>,
    changed: Arc<Notify>,
    config: Arc<ControlConfig>,
}

impl ThermostatState {
    pub fn new(config: ControlConfig) -> Self {
        let record = Record {
            goal_temperature: config.default_goal_c,
            mode: config.default_mode,
            command: ActuatorCommand::AllOff,
        };
        Self {
            record: Arc::new(Mutex::new(record)),
            changed: Arc::new(Notify::new()),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.record.lock().await.snapshot()
    }

    pub async fn set_goal(&self, goal_c: f32) -> Result<(), ValidationError> {
        let goal_c = self.config.check_goal(goal_c)?;
        self.record.lock().await.goal_temperature = goal_c;
        self.changed.notify_one();
        Ok(())
    }

    pub async fn set_mode(&self, mode: ClimateMode) {
        self.record.lock().await.mode = mode;
        self.changed.notify_one();
    }

    /// Replaces mode and goal together, or neither.
    pub async fn apply_update(&self, update: StatusUpdate) -> Result<Snapshot, ValidationError> {
        let goal_c = self.config.check_goal(update.goal_temperature)?;
        let snapshot = {
            let mut record = self.record.lock().await;
            record.mode = update.mode;
            record.goal_temperature = goal_c;
            record.snapshot()
        };
        self.changed.notify_one();
        Ok(snapshot)
    }

    /// Records what the control loop commanded. Returns the snapshot the
    /// command was applied against.
    pub(super) async fn apply_actuator_result(&self, command: ActuatorCommand) -> Snapshot {
        let mut record = self.record.lock().await;
        record.command = command;
        record.snapshot()
    }

    /// Resolves after the next goal or mode write.
    pub(super) async fn changed(&self) {
        self.changed.notified().await;
    }
}
