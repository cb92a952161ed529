use crate::{
    error::ValidationError,
    types::{ClimateMode, StatusUpdate},
};

/// `"on"` or `"off"`, ASCII case-insensitive, surrounding whitespace ignored.
pub fn parse_switch(payload: &str) -> Result<ClimateMode, ValidationError> {
    let token = payload.trim();
    if token.eq_ignore_ascii_case("on") {
        Ok(ClimateMode::Auto)
    } else if token.eq_ignore_ascii_case("off") {
        Ok(ClimateMode::Off)
    } else {
        Err(ValidationError::UnknownToken(token.to_string()))
    }
}

/// Integer goal temperature as accepted by the temperature resource.
pub fn parse_integer_goal(payload: &str) -> Result<f32, ValidationError> {
    let token = payload.trim();
    token
        .parse::<i32>()
        .map(|value| value as f32)
        .map_err(|_| ValidationError::NotAnInteger(token.to_string()))
}

/// Combined mode + goal write for the status resource.
///
/// Accepts either a JSON object (`{"mode": "on", "goalTemperature": 21}`) or
/// a two-field pair `<mode> <goal>` separated by whitespace, `,` or `;`.
/// The goal range is not checked here.
pub fn parse_status_update(payload: &str) -> Result<StatusUpdate, ValidationError> {
    let trimmed = payload.trim();

    if trimmed.starts_with('{') {
        return serde_json::from_str::<StatusUpdate>(trimmed)
            .map_err(|_| ValidationError::MalformedStatus(trimmed.to_string()));
    }

    let fields: Vec<&str> = trimmed
        .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .filter(|field| !field.is_empty())
        .collect();

    let [mode, goal] = fields.as_slice() else {
        return Err(ValidationError::MalformedStatus(trimmed.to_string()));
    };

    let mode = parse_switch(mode)?;
    let goal_temperature = goal
        .parse::<f32>()
        .map_err(|_| ValidationError::NotANumber((*goal).to_string()))?;

    Ok(StatusUpdate {
        mode,
        goal_temperature,
    })
}
