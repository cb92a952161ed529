use crate::{
    config::ControlConfig,
    types::{ActuatorCommand, ClimateMode},
};

/// Hysteresis policy. The decision depends only on `(mode, goal, temperature)`,
/// never on what was commanded previously.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HysteresisPolicy {
    dead_band_c: f32,
}

impl Default for HysteresisPolicy {
    fn default() -> Self {
        Self::new(ControlConfig::default().dead_band_c)
    }
}

impl HysteresisPolicy {
    pub fn new(dead_band_c: f32) -> Self {
        Self { dead_band_c }
    }

    pub fn from_config(config: &ControlConfig) -> Self {
        Self::new(config.dead_band_c)
    }

    pub fn dead_band_c(&self) -> f32 {
        self.dead_band_c
    }

    /// `temperature` is `None` when the sensor could not be read; that is
    /// treated the same as mode Off.
    pub fn decide(
        &self,
        mode: ClimateMode,
        goal_c: f32,
        temperature_c: Option<f32>,
    ) -> ActuatorCommand {
        if mode == ClimateMode::Off {
            return ActuatorCommand::AllOff;
        }

        let Some(temperature_c) = temperature_c.filter(|t| t.is_finite()) else {
            return ActuatorCommand::AllOff;
        };

        let lower_bound = goal_c - self.dead_band_c;
        let upper_bound = goal_c + self.dead_band_c;

        if temperature_c < lower_bound {
            ActuatorCommand::Heat
        } else if temperature_c > upper_bound {
            ActuatorCommand::Cool
        } else {
            ActuatorCommand::AllOff
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auto(policy: &HysteresisPolicy, goal: f32, temp: f32) -> ActuatorCommand {
        policy.decide(ClimateMode::Auto, goal, Some(temp))
    }

    #[test]
    fn heats_below_and_cools_above_the_band() {
        let policy = HysteresisPolicy::default();

        assert_eq!(auto(&policy, 20.0, 19.0), ActuatorCommand::Heat);
        assert_eq!(auto(&policy, 20.0, 21.0), ActuatorCommand::Cool);
        assert_eq!(auto(&policy, 20.0, 20.2), ActuatorCommand::AllOff);
    }

    #[test]
    fn band_edges_are_idle() {
        let policy = HysteresisPolicy::default();

        assert_eq!(auto(&policy, 20.0, 19.5), ActuatorCommand::AllOff);
        assert_eq!(auto(&policy, 20.0, 20.5), ActuatorCommand::AllOff);
        assert_eq!(auto(&policy, 20.0, 19.49), ActuatorCommand::Heat);
        assert_eq!(auto(&policy, 20.0, 20.51), ActuatorCommand::Cool);
    }

    #[test]
    fn off_mode_ignores_temperature() {
        let policy = HysteresisPolicy::default();

        for temp in [-10.0, 0.0, 19.0, 20.0, 21.0, 60.0] {
            for goal in [0.0, 20.0, 40.0] {
                assert_eq!(
                    policy.decide(ClimateMode::Off, goal, Some(temp)),
                    ActuatorCommand::AllOff
                );
            }
        }
    }

    #[test]
    fn missing_or_bogus_reading_fails_safe() {
        let policy = HysteresisPolicy::default();

        assert_eq!(
            policy.decide(ClimateMode::Auto, 20.0, None),
            ActuatorCommand::AllOff
        );
        assert_eq!(
            policy.decide(ClimateMode::Auto, 20.0, Some(f32::NAN)),
            ActuatorCommand::AllOff
        );
    }

    #[test]
    fn matches_table_across_a_sweep() {
        let policy = HysteresisPolicy::default();

        for goal in 0..=40 {
            let goal = goal as f32;
            for step in -40..=40 {
                let temp = goal + step as f32 * 0.05;
                let expected = if temp < goal - 0.5 {
                    ActuatorCommand::Heat
                } else if temp > goal + 0.5 {
                    ActuatorCommand::Cool
                } else {
                    ActuatorCommand::AllOff
                };
                assert_eq!(auto(&policy, goal, temp), expected, "goal {goal} temp {temp}");
            }
        }
    }

    #[test]
    fn repeated_decisions_do_not_flap() {
        let policy = HysteresisPolicy::default();
        let first = auto(&policy, 22.0, 21.2);

        for _ in 0..10 {
            assert_eq!(auto(&policy, 22.0, 21.2), first);
        }
    }
}
