use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

use crate::{error::ValidationError, types::ClimateMode};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ControlConfig {
    pub period_ms: u64,
    pub sensor_timeout_ms: u64,
    pub actuator_timeout_ms: u64,
    pub dead_band_c: f32,
    pub min_goal_c: f32,
    pub max_goal_c: f32,
    pub default_goal_c: f32,
    pub default_mode: ClimateMode,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            period_ms: 1_000,
            sensor_timeout_ms: 750,
            actuator_timeout_ms: 250,
            dead_band_c: 0.5,
            min_goal_c: 0.0,
            max_goal_c: 40.0,
            default_goal_c: 20.0,
            default_mode: ClimateMode::Off,
        }
    }
}

impl ControlConfig {
    pub fn sanitize(&mut self) {
        let defaults = Self::default();

        if self.period_ms == 0 {
            self.period_ms = defaults.period_ms;
        }
        if self.sensor_timeout_ms == 0 {
            self.sensor_timeout_ms = defaults.sensor_timeout_ms;
        }
        if self.actuator_timeout_ms == 0 {
            self.actuator_timeout_ms = defaults.actuator_timeout_ms;
        }
        if !self.dead_band_c.is_finite() || self.dead_band_c < 0.0 {
            self.dead_band_c = defaults.dead_band_c;
        }
        if !self.min_goal_c.is_finite()
            || !self.max_goal_c.is_finite()
            || self.min_goal_c > self.max_goal_c
        {
            self.min_goal_c = defaults.min_goal_c;
            self.max_goal_c = defaults.max_goal_c;
        }
        if self.check_goal(self.default_goal_c).is_err() {
            self.default_goal_c = defaults
                .default_goal_c
                .clamp(self.min_goal_c, self.max_goal_c);
        }
    }

    /// Accepts a goal only if it is finite and inside the operating band.
    pub fn check_goal(&self, value: f32) -> Result<f32, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteGoal);
        }
        if !(self.min_goal_c..=self.max_goal_c).contains(&value) {
            return Err(ValidationError::GoalOutOfBand {
                value,
                min: self.min_goal_c,
                max: self.max_goal_c,
            });
        }
        Ok(value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HardwareConfig {
    pub simulated: bool,
    pub sensor_id: String,
    pub w1_root: String,
    pub gpio_root: String,
    pub heater_pin: u32,
    pub fan_pin: u32,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            simulated: false,
            sensor_id: "28-0000075565ad".to_string(),
            w1_root: "/sys/bus/w1/devices".to_string(),
            gpio_root: "/sys/class/gpio".to_string(),
            heater_pin: 25,
            fan_pin: 27,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addresses: Vec<IpAddr>,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addresses: vec![IpAddr::V4(Ipv4Addr::UNSPECIFIED)],
            port: 5683,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RuntimeConfig {
    pub control: ControlConfig,
    pub hardware: HardwareConfig,
    pub server: ServerConfig,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: RuntimeConfig =
            serde_json::from_str(r#"{"hardware": {"heater_pin": 5}, "server": {"port": 8080}}"#)
                .unwrap();

        assert_eq!(config.hardware.heater_pin, 5);
        assert_eq!(config.hardware.fan_pin, 27);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.control, ControlConfig::default());
    }

    #[test]
    fn sanitize_repairs_nonsense() {
        let mut config = ControlConfig {
            period_ms: 0,
            dead_band_c: -1.0,
            min_goal_c: 30.0,
            max_goal_c: 10.0,
            default_goal_c: 55.0,
            ..ControlConfig::default()
        };
        config.sanitize();

        assert_eq!(config.period_ms, 1_000);
        assert_eq!(config.dead_band_c, 0.5);
        assert_eq!((config.min_goal_c, config.max_goal_c), (0.0, 40.0));
        assert_eq!(config.default_goal_c, 20.0);
    }

    #[test]
    fn goal_band_is_inclusive_and_rejects_nan() {
        let config = ControlConfig::default();

        assert_eq!(config.check_goal(0.0), Ok(0.0));
        assert_eq!(config.check_goal(40.0), Ok(40.0));
        assert_eq!(config.check_goal(f32::NAN), Err(ValidationError::NonFiniteGoal));
        assert!(matches!(
            config.check_goal(40.5),
            Err(ValidationError::GoalOutOfBand { .. })
        ));
    }
}
