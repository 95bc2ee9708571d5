//! Configuration file support for Taperplan.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/taperplan/config.toml`.

use crate::catalog::Drug;
use crate::types::{DEFAULT_FREQUENCY_LABEL, DEFAULT_GRANULARITY};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub allocation: AllocationConfig,

    #[serde(default)]
    pub drugs: DrugsConfig,
}

/// Defaults applied when the CLI flags are omitted
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_step_days")]
    pub default_step_days: u32,

    #[serde(default = "default_frequency_label")]
    pub frequency_label: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            default_step_days: default_step_days(),
            frequency_label: default_frequency_label(),
        }
    }
}

/// Allocation parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AllocationConfig {
    /// Tablet-count granularity. 0.5 means half tablets; 0.25 allows
    /// quarters. Non-positive values fall back to 0.5 at allocation time.
    #[serde(default = "default_granularity")]
    pub granularity: f64,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            granularity: default_granularity(),
        }
    }
}

/// Custom drug entries merged over the built-in catalog
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct DrugsConfig {
    #[serde(default)]
    pub custom: Vec<Drug>,
}

// Default value functions
fn default_step_days() -> u32 {
    7
}

fn default_frequency_label() -> String {
    DEFAULT_FREQUENCY_LABEL.to_string()
}

fn default_granularity() -> f64 {
    DEFAULT_GRANULARITY
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            let home = std::env::var("HOME")
                .expect("HOME environment variable not set");
            PathBuf::from(home).join(".config")
        });
        base.join("taperplan").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.schedule.default_step_days, 7);
        assert_eq!(config.schedule.frequency_label, "Once daily");
        assert_eq!(config.allocation.granularity, 0.5);
        assert!(config.drugs.custom.is_empty());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(
            config.schedule.default_step_days,
            parsed.schedule.default_step_days
        );
        assert_eq!(config.allocation.granularity, parsed.allocation.granularity);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[allocation]
granularity = 0.25
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.allocation.granularity, 0.25);
        assert_eq!(config.schedule.default_step_days, 7); // default
    }

    #[test]
    fn test_custom_drug_config() {
        let toml_str = r#"
[[drugs.custom]]
id = "hydrocortisone"
name = "Hydrocortisone"
strengths_mg = [20.0, 10.0]
frequency_label = "Morning dose"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.drugs.custom.len(), 1);
        assert_eq!(config.drugs.custom[0].id, "hydrocortisone");
        assert_eq!(config.drugs.custom[0].strengths_mg, vec![20.0, 10.0]);
    }

    #[test]
    fn test_save_and_load_from_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.schedule.default_step_days = 3;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.schedule.default_step_days, 3);
    }
}
