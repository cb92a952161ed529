mod gpio;
mod simulated;
mod w1;

pub use gpio::{GpioActuators, GpioOutputPin};
pub use simulated::SimulatedPlant;
pub use w1::W1TemperatureSensor;
