use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::ports::{ActuatorError, ActuatorPort};

/// Output pin driven through the sysfs GPIO interface.
#[derive(Debug, Clone)]
pub struct GpioOutputPin {
    label: &'static str,
    value_path: PathBuf,
}

impl GpioOutputPin {
    /// Exports `pin` if needed and configures it as an output that starts low.
    pub async fn provision(
        root: impl AsRef<Path>,
        pin: u32,
        label: &'static str,
    ) -> std::io::Result<Self> {
        let root = root.as_ref();
        let pin_dir = root.join(format!("gpio{pin}"));

        if !tokio::fs::try_exists(&pin_dir).await? {
            tokio::fs::write(root.join("export"), pin.to_string()).await?;
        }
        // "low" sets the direction to output and drives the line low in one write.
        tokio::fs::write(pin_dir.join("direction"), "low").await?;

        info!(pin, label, "output pin provisioned low");
        Ok(Self {
            label,
            value_path: pin_dir.join("value"),
        })
    }

    pub async fn set(&self, on: bool) -> std::io::Result<()> {
        debug!(label = self.label, on, "pin write");
        tokio::fs::write(&self.value_path, if on { "1" } else { "0" }).await
    }
}

#[derive(Debug, Clone)]
pub struct GpioActuators {
    heater: GpioOutputPin,
    fan: GpioOutputPin,
}

impl GpioActuators {
    pub fn new(heater: GpioOutputPin, fan: GpioOutputPin) -> Self {
        Self { heater, fan }
    }

    async fn write(&self, pin: &GpioOutputPin, on: bool) -> Result<(), ActuatorError> {
        pin.set(on).await.map_err(|source| ActuatorError::Io {
            actuator: pin.label,
            source,
        })
    }
}

impl ActuatorPort for GpioActuators {
    async fn set_heater(&self, on: bool) -> Result<(), ActuatorError> {
        self.write(&self.heater, on).await
    }

    async fn set_fan(&self, on: bool) -> Result<(), ActuatorError> {
        self.write(&self.fan, on).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::scratch_dir;

    fn read(path: PathBuf) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[tokio::test]
    async fn provisioning_exports_and_drives_low() {
        let root = scratch_dir("gpio-provision");
        std::fs::create_dir_all(&root).unwrap();
        // Kernel creates the pin directory on export; pre-create it for the fake tree.
        std::fs::create_dir_all(root.join("gpio27")).unwrap();

        let pin = GpioOutputPin::provision(&root, 27, "fan").await.unwrap();

        assert_eq!(read(root.join("gpio27/direction")), "low");
        assert!(!root.join("export").exists());

        pin.set(true).await.unwrap();
        assert_eq!(read(root.join("gpio27/value")), "1");
        pin.set(false).await.unwrap();
        assert_eq!(read(root.join("gpio27/value")), "0");
    }

    #[tokio::test]
    async fn missing_pin_reports_io_error() {
        let root = scratch_dir("gpio-missing");
        std::fs::create_dir_all(root.join("gpio25")).unwrap();
        let heater = GpioOutputPin::provision(&root, 25, "heater").await.unwrap();
        let fan = GpioOutputPin {
            label: "fan",
            value_path: root.join("gpio99/value"),
        };
        let actuators = GpioActuators::new(heater, fan);

        actuators.set_heater(true).await.unwrap();
        let err = actuators.set_fan(true).await.unwrap_err();

        assert!(matches!(err, ActuatorError::Io { actuator: "fan", .. }));
    }
}
