use thiserror::Error;

/// A request payload that cannot be applied. Never mutates state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("expected an integer temperature, got {0:?}")]
    NotAnInteger(String),
    #[error("expected a temperature, got {0:?}")]
    NotANumber(String),
    #[error("goal temperature must be finite")]
    NonFiniteGoal,
    #[error("goal temperature {value} outside {min}..={max}")]
    GoalOutOfBand { value: f32, min: f32, max: f32 },
    #[error("unrecognised token {0:?}, expected \"on\" or \"off\"")]
    UnknownToken(String),
    #[error("malformed status update {0:?}")]
    MalformedStatus(String),
}
