// SPDX-License-Identifier: GPL-3.0-only

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::backends::BackendType;
use crate::constants::{
    FRAME_CHANNEL_CAPACITY_DEFAULT, PPG_MEASUREMENT_HEIGHT_DEFAULT,
    PPG_MEASUREMENT_TIME_DEFAULT, PPG_MEASUREMENT_WIDTH_DEFAULT,
};
use crate::errors::{Error, Result};
use crate::pipelines::ppg::Size;

/// Application directory under the user config dir
const CONFIG_DIR: &str = "yuv2rgba";
const CONFIG_FILE: &str = "config.json";

/// User configuration, stored as JSON
///
/// Fields missing from the file take their default value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Converter backend (auto, cpu or gpu)
    pub backend: BackendType,
    /// PPG measurement length in seconds
    pub measurement_seconds: u64,
    /// Preferred PPG capture width
    pub measurement_width: u32,
    /// Preferred PPG capture height
    pub measurement_height: u32,
    /// Frames buffered between reader and converter
    pub channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendType::default(),
            measurement_seconds: PPG_MEASUREMENT_TIME_DEFAULT.as_secs(),
            measurement_width: PPG_MEASUREMENT_WIDTH_DEFAULT,
            measurement_height: PPG_MEASUREMENT_HEIGHT_DEFAULT,
            channel_capacity: FRAME_CHANNEL_CAPACITY_DEFAULT,
        }
    }
}

impl Config {
    /// `$XDG_CONFIG_HOME/yuv2rgba/config.json` or the platform equivalent
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Read a config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&text)?;
        config.validate()?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Read `path`, or the default path when `None`; a missing file yields defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    /// Write the config, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        info!(path = %path.display(), "Saved config");
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.measurement_seconds == 0 {
            return Err(Error::config("measurement_seconds must be positive"));
        }
        if self.measurement_width == 0 || self.measurement_height == 0 {
            return Err(Error::config(format!(
                "measurement size must be non-empty, got {}x{}",
                self.measurement_width, self.measurement_height
            )));
        }
        if self.channel_capacity == 0 {
            return Err(Error::config("channel_capacity must be at least 1"));
        }
        Ok(())
    }

    pub fn measurement_time(&self) -> Duration {
        Duration::from_secs(self.measurement_seconds)
    }

    /// Preferred capture size for PPG measurements
    pub fn measurement_size(&self) -> Size {
        Size::new(self.measurement_width, self.measurement_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{ "backend": "cpu" }"#).unwrap();
        assert_eq!(config.backend, BackendType::Cpu);
        assert_eq!(config.measurement_seconds, 60);
        assert_eq!(config.channel_capacity, 4);
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_ok());
        let config = Config {
            channel_capacity: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_measurement_accessors() {
        let config = Config::default();
        assert_eq!(config.measurement_time(), Duration::from_secs(60));
        assert_eq!(config.measurement_size(), Size::new(200, 200));
    }
}
