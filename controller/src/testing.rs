//! Fake ports shared by the unit tests.

use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use crate::ports::{ActuatorError, ActuatorPort, SensorError, SensorPort};

/// Sensor whose next value is set by the test. `None` makes reads fail.
#[derive(Debug, Default)]
pub struct FakeSensor {
    value: Mutex<Option<f32>>,
    reads: AtomicUsize,
}

impl FakeSensor {
    pub fn reading(value: f32) -> Self {
        let sensor = Self::default();
        sensor.set(Some(value));
        sensor
    }

    pub fn set(&self, value: Option<f32>) {
        *self.value.lock().unwrap() = value;
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl SensorPort for FakeSensor {
    async fn read_temperature(&self) -> Result<f32, SensorError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let value = *self.value.lock().unwrap();
        value.ok_or_else(|| SensorError::DeviceNotFound("fake".to_string()))
    }
}

/// Records every pin write and mirrors the resulting outputs.
#[derive(Debug, Default)]
pub struct FakeActuators {
    writes: Mutex<Vec<(&'static str, bool)>>,
    outputs: Mutex<(bool, bool)>,
    fail_fan: Mutex<bool>,
}

impl FakeActuators {
    pub fn writes(&self) -> Vec<(&'static str, bool)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.writes.lock().unwrap().clear();
    }

    /// Current `(heater, fan)` outputs.
    pub fn outputs(&self) -> (bool, bool) {
        *self.outputs.lock().unwrap()
    }

    pub fn fail_fan(&self, fail: bool) {
        *self.fail_fan.lock().unwrap() = fail;
    }

    fn record(&self, name: &'static str, on: bool) {
        self.writes.lock().unwrap().push((name, on));
        let mut outputs = self.outputs.lock().unwrap();
        match name {
            "heater" => outputs.0 = on,
            _ => outputs.1 = on,
        }
        assert!(
            !(outputs.0 && outputs.1),
            "heater and fan energised together"
        );
    }
}

impl ActuatorPort for FakeActuators {
    async fn set_heater(&self, on: bool) -> Result<(), ActuatorError> {
        self.record("heater", on);
        Ok(())
    }

    async fn set_fan(&self, on: bool) -> Result<(), ActuatorError> {
        if *self.fail_fan.lock().unwrap() {
            return Err(ActuatorError::Io {
                actuator: "fan",
                source: std::io::Error::other("stuck pin"),
            });
        }
        self.record("fan", on);
        Ok(())
    }
}

/// Fresh, empty directory under the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let unique = COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!(
        "climate-controller-{name}-{}-{unique}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
