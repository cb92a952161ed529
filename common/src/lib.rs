pub mod config;
pub mod error;
pub mod payload;
pub mod policy;
pub mod resources;
pub mod types;

pub use config::{ControlConfig, HardwareConfig, RuntimeConfig, ServerConfig};
pub use error::ValidationError;
pub use policy::HysteresisPolicy;
pub use resources::*;
pub use types::{
    ActuatorAction, ActuatorCommand, ClimateMode, ControlState, SensorReading, Snapshot,
    StatusPayload, StatusUpdate,
};
