//! Configuration file support for FitFlow.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/fitflow/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub workout: WorkoutConfig,

    #[serde(default)]
    pub nutrition: NutritionGoalsConfig,

    #[serde(default)]
    pub trends: TrendConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Active workout behaviour
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkoutConfig {
    /// Rest used when a template exercise carries no rest duration
    #[serde(default = "default_rest_seconds")]
    pub default_rest_seconds: u32,

    /// Ring the terminal bell on start/rest/finish cues
    #[serde(default = "default_true")]
    pub cue_bell: bool,
}

impl Default for WorkoutConfig {
    fn default() -> Self {
        Self {
            default_rest_seconds: default_rest_seconds(),
            cue_bell: true,
        }
    }
}

/// Default daily nutrition goals for a fresh nutrition log
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NutritionGoalsConfig {
    #[serde(default = "default_calories")]
    pub calories: u32,
    #[serde(default = "default_protein")]
    pub protein: u32,
    #[serde(default = "default_carbs")]
    pub carbs: u32,
    #[serde(default = "default_fat")]
    pub fat: u32,
}

impl Default for NutritionGoalsConfig {
    fn default() -> Self {
        Self {
            calories: default_calories(),
            protein: default_protein(),
            carbs: default_carbs(),
            fat: default_fat(),
        }
    }
}

/// Thresholds for the bioimpedance trend classification
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrendConfig {
    #[serde(default = "default_fat_threshold")]
    pub fat_threshold: f64,

    #[serde(default = "default_muscle_decline_threshold")]
    pub muscle_decline_threshold: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            fat_threshold: default_fat_threshold(),
            muscle_decline_threshold: default_muscle_decline_threshold(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        PathBuf::from(home).join(".local/share")
    });
    base.join("fitflow")
}

fn default_rest_seconds() -> u32 {
    60
}

fn default_true() -> bool {
    true
}

fn default_calories() -> u32 {
    2200
}

fn default_protein() -> u32 {
    120
}

fn default_carbs() -> u32 {
    200
}

fn default_fat() -> u32 {
    80
}

fn default_fat_threshold() -> f64 {
    1.0
}

fn default_muscle_decline_threshold() -> f64 {
    0.5
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
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".config")
        });
        base.join("fitflow").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.trends.fat_threshold < 0.0 || self.trends.muscle_decline_threshold < 0.0 {
            return Err(Error::Config("trend thresholds must be non-negative".into()));
        }
        Ok(())
    }
}
