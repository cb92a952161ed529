use tokio::{sync::Mutex, time::Instant};
use tracing::debug;

use crate::ports::{ActuatorError, ActuatorPort, SensorError, SensorPort};

const AMBIENT_C: f32 = 17.0;
const LEAK_PER_SEC: f32 = 0.002;
const HEATER_C_PER_SEC: f32 = 0.05;
const FAN_C_PER_SEC: f32 = 0.04;

#[derive(Debug)]
struct Room {
    temperature_c: f32,
    heater_on: bool,
    fan_on: bool,
    updated_at: Instant,
}

/// In-memory room for running without hardware: the heater warms it, the fan
/// cools it, and it drifts toward ambient otherwise.
#[derive(Debug)]
pub struct SimulatedPlant {
    room: Mutex<Room>,
}

impl SimulatedPlant {
    pub fn new(initial_c: f32) -> Self {
        Self {
            room: Mutex::new(Room {
                temperature_c: initial_c,
                heater_on: false,
                fan_on: false,
                updated_at: Instant::now(),
            }),
        }
    }

    #[cfg(test)]
    pub async fn outputs(&self) -> (bool, bool) {
        let room = self.room.lock().await;
        (room.heater_on, room.fan_on)
    }
}

impl Room {
    fn advance(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.updated_at).as_secs_f32();
        self.updated_at = now;

        let mut delta = (AMBIENT_C - self.temperature_c) * LEAK_PER_SEC * elapsed;
        if self.heater_on {
            delta += HEATER_C_PER_SEC * elapsed;
        }
        if self.fan_on {
            delta -= FAN_C_PER_SEC * elapsed;
        }
        self.temperature_c += delta;
    }
}

impl SensorPort for SimulatedPlant {
    async fn read_temperature(&self) -> Result<f32, SensorError> {
        let mut room = self.room.lock().await;
        room.advance();
        Ok(room.temperature_c)
    }
}

impl ActuatorPort for SimulatedPlant {
    async fn set_heater(&self, on: bool) -> Result<(), ActuatorError> {
        let mut room = self.room.lock().await;
        room.advance();
        room.heater_on = on;
        debug!(on, "simulated heater");
        Ok(())
    }

    async fn set_fan(&self, on: bool) -> Result<(), ActuatorError> {
        let mut room = self.room.lock().await;
        room.advance();
        room.fan_on = on;
        debug!(on, "simulated fan");
        Ok(())
    }
}
