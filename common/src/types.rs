use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClimateMode {
    #[serde(rename = "off")]
    Off,
    #[serde(rename = "on")]
    Auto,
}

impl ClimateMode {
    /// Wire token used by the climate-control and status resources.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Auto => "on",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlState {
    Off,
    Idle,
    Heating,
    Cooling,
}

impl ControlState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Idle => "IDLE",
            Self::Heating => "HEATING",
            Self::Cooling => "COOLING",
        }
    }

    pub fn derive(mode: ClimateMode, command: ActuatorCommand) -> Self {
        match (mode, command) {
            (ClimateMode::Off, _) => Self::Off,
            (ClimateMode::Auto, ActuatorCommand::AllOff) => Self::Idle,
            (ClimateMode::Auto, ActuatorCommand::Heat) => Self::Heating,
            (ClimateMode::Auto, ActuatorCommand::Cool) => Self::Cooling,
        }
    }
}

/// What the control loop commands on a tick. Heater and fan are never both on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActuatorCommand {
    #[default]
    AllOff,
    Heat,
    Cool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorAction {
    Heater(bool),
    Fan(bool),
}

impl ActuatorCommand {
    pub fn heater_on(self) -> bool {
        matches!(self, Self::Heat)
    }

    pub fn fan_on(self) -> bool {
        matches!(self, Self::Cool)
    }

    /// Pin writes for this command, ordered so that whatever goes off is
    /// switched before whatever goes on.
    pub fn actions(self) -> [ActuatorAction; 2] {
        match self {
            Self::AllOff => [ActuatorAction::Heater(false), ActuatorAction::Fan(false)],
            Self::Heat => [ActuatorAction::Fan(false), ActuatorAction::Heater(true)],
            Self::Cool => [ActuatorAction::Heater(false), ActuatorAction::Fan(true)],
        }
    }
}

/// Point-in-time copy of the shared thermostat record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub goal_temperature: f32,
    pub mode: ClimateMode,
    pub heater_on: bool,
    pub fan_on: bool,
}

impl Snapshot {
    pub fn control_state(&self) -> ControlState {
        let command = match (self.heater_on, self.fan_on) {
            (true, _) => ActuatorCommand::Heat,
            (false, true) => ActuatorCommand::Cool,
            (false, false) => ActuatorCommand::AllOff,
        };
        ControlState::derive(self.mode, command)
    }

    pub fn status_payload(&self, temperature: Option<f32>) -> StatusPayload {
        StatusPayload {
            heater_on: self.heater_on,
            fan_on: self.fan_on,
            temperature,
            mode: self.mode,
            goal_temperature: self.goal_temperature,
            state: self.control_state().as_str(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    pub temperature_c: f32,
    pub read_at: DateTime<Utc>,
}

impl SensorReading {
    pub fn now(temperature_c: f32) -> Self {
        Self {
            temperature_c,
            read_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusPayload {
    #[serde(rename = "heaterOn")]
    pub heater_on: bool,
    #[serde(rename = "fanOn")]
    pub fan_on: bool,
    pub temperature: Option<f32>,
    pub mode: ClimateMode,
    #[serde(rename = "goalTemperature")]
    pub goal_temperature: f32,
    pub state: &'static str,
}

/// Combined write accepted by the status resource.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct StatusUpdate {
    pub mode: ClimateMode,
    #[serde(rename = "goalTemperature")]
    pub goal_temperature: f32,
}
