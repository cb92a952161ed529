use std::path::{Path, PathBuf};

use crate::ports::{SensorError, SensorPort};

/// DS18B20-style sensor exposed by the Linux 1-Wire sysfs driver.
#[derive(Debug, Clone)]
pub struct W1TemperatureSensor {
    slave_path: PathBuf,
}

impl W1TemperatureSensor {
    /// Finds the first device under `root` whose directory name contains `id`.
    pub async fn discover(root: impl AsRef<Path>, id: &str) -> Result<Self, SensorError> {
        let root = root.as_ref();
        let mut entries = tokio::fs::read_dir(root).await?;

        while let Some(entry) = entries.next_entry().await? {
            if entry.file_name().to_string_lossy().contains(id) {
                return Ok(Self {
                    slave_path: entry.path().join("w1_slave"),
                });
            }
        }

        Err(SensorError::DeviceNotFound(id.to_string()))
    }

    pub fn slave_path(&self) -> &Path {
        &self.slave_path
    }
}

impl SensorPort for W1TemperatureSensor {
    async fn read_temperature(&self) -> Result<f32, SensorError> {
        let raw = tokio::fs::read_to_string(&self.slave_path).await?;
        parse_w1_slave(&raw)
    }
}

/// Parses the two-line `w1_slave` report, e.g.
///
/// ```text
/// 72 01 4b 46 7f ff 0e 10 57 : crc=57 YES
/// 72 01 4b 46 7f ff 0e 10 57 t=23125
/// ```
pub fn parse_w1_slave(raw: &str) -> Result<f32, SensorError> {
    let mut lines = raw.lines();
    let (Some(crc_line), Some(data_line)) = (lines.next(), lines.next()) else {
        return Err(SensorError::Malformed(raw.trim().to_string()));
    };

    if !crc_line.trim_end().ends_with("YES") {
        return Err(SensorError::CrcMismatch);
    }

    let Some((_, millidegrees)) = data_line.rsplit_once("t=") else {
        return Err(SensorError::Malformed(data_line.to_string()));
    };

    millidegrees
        .trim()
        .parse::<i32>()
        .map(|value| value as f32 / 1000.0)
        .map_err(|_| SensorError::Malformed(data_line.to_string()))
}
