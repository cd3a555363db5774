//! User configuration for LittleNPCs, read from a RON file.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::shared::{is_valid_time, LATE_EVENING_BEDTIME};

pub const CONFIG_FILE_NAME: &str = "littlenpcs.ron";

#[derive(Resource, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LittleNpcConfig {
    /// Children at least this many days old are converted each morning.
    pub age_when_kids_are_modified: u32,
    pub do_children_have_curfew: bool,
    /// HHMM time after which converted children head to bed.
    pub curfew_time: u32,
    pub do_children_wander: bool,
    /// One-second ticks between day start and conversion, so that the
    /// host's asset pipeline has loaded everything the actor needs.
    pub conversion_delay_ticks: u32,
}

impl Default for LittleNpcConfig {
    fn default() -> Self {
        Self {
            age_when_kids_are_modified: 83,
            do_children_have_curfew: true,
            curfew_time: 1900,
            do_children_wander: true,
            conversion_delay_ticks: 2,
        }
    }
}

impl LittleNpcConfig {
    /// Time at which an actor at home is sent to bed.
    pub fn bedtime(&self) -> u32 {
        if self.do_children_have_curfew {
            self.curfew_time
        } else {
            LATE_EVENING_BEDTIME
        }
    }

    pub fn from_ron_str(text: &str, path: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::de::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })?;
        Ok(config.validated())
    }

    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron_str(&text, &path.display().to_string())
    }

    /// Read the config at `path`, falling back to defaults when the file is
    /// missing or malformed.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            info!(
                "[LittleNPCs] No config at {}, using defaults.",
                path.display()
            );
            return Self::default();
        }
        match Self::read(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("[LittleNPCs] {}. Using defaults.", e);
                Self::default()
            }
        }
    }

    /// Replace out-of-range values with their defaults.
    fn validated(mut self) -> Self {
        let defaults = Self::default();
        if !is_valid_time(self.curfew_time) {
            warn!(
                "[LittleNPCs] curfew_time {} is not a valid time of day, using {}.",
                self.curfew_time, defaults.curfew_time
            );
            self.curfew_time = defaults.curfew_time;
        }
        if self.conversion_delay_ticks == 0 {
            self.conversion_delay_ticks = 1;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let text = r#"(
            age_when_kids_are_modified: 56,
            do_children_have_curfew: false,
            curfew_time: 2100,
            do_children_wander: false,
            conversion_delay_ticks: 3,
        )"#;
        let config = LittleNpcConfig::from_ron_str(text, "test.ron").unwrap();
        assert_eq!(config.age_when_kids_are_modified, 56);
        assert!(!config.do_children_have_curfew);
        assert_eq!(config.curfew_time, 2100);
        assert!(!config.do_children_wander);
        assert_eq!(config.conversion_delay_ticks, 3);
        assert_eq!(config.bedtime(), LATE_EVENING_BEDTIME);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config = LittleNpcConfig::from_ron_str("(curfew_time: 2000)", "test.ron").unwrap();
        assert_eq!(config.curfew_time, 2000);
        assert_eq!(config.age_when_kids_are_modified, 83);
        assert_eq!(config.bedtime(), 2000);
    }

    #[test]
    fn test_invalid_curfew_replaced() {
        let config = LittleNpcConfig::from_ron_str("(curfew_time: 1975)", "test.ron").unwrap();
        assert_eq!(config.curfew_time, 1900);
    }

    #[test]
    fn test_malformed_config_is_error() {
        assert!(matches!(
            LittleNpcConfig::from_ron_str("(curfew_time: \"late\")", "test.ron"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = LittleNpcConfig::load_or_default(Path::new("definitely/not/here.ron"));
        assert_eq!(config, LittleNpcConfig::default());
    }
}
