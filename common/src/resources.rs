pub const RESOURCE_TEMPERATURE: &str = "temperature";
pub const RESOURCE_CLIMATE_CONTROL: &str = "climate-control";
pub const RESOURCE_HEATER: &str = "heater";
pub const RESOURCE_FAN: &str = "fan";
pub const RESOURCE_STATUS: &str = "status";

pub const TITLE_TEMPERATURE: &str = "Temperature Resource";
pub const TITLE_CLIMATE_CONTROL: &str = "Climate Control Resource";
pub const TITLE_HEATER: &str = "Heater Resource";
pub const TITLE_FAN: &str = "Fan Resource";
pub const TITLE_STATUS: &str = "Status Resource";

pub const WELL_KNOWN_CORE: &str = "/.well-known/core";
