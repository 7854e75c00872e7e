//! Application configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. `config/default.toml` (version controlled)
//! 2. `config/user.toml` (gitignored, user overrides)
//! 3. Environment variables (`JAZZ_SECTION__KEY`)

use figment::{Figment, providers::{Format, Toml, Env}};
use jazz2d_physics::{LayerMask, PhysicsConfig};
use serde::{Serialize, Deserialize};
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Collision engine configuration
    #[serde(default)]
    pub physics: PhysicsConfig,
    /// Fixed-step simulation configuration
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Scene configuration
    #[serde(default)]
    pub scene: SceneConfig,
    /// Debug configuration
    #[serde(default)]
    pub debug: DebugConfig,
}

impl AppConfig {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. `config/default.toml`
    /// 2. `config/user.toml`
    /// 3. Environment variables (`JAZZ_*`)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::new();

        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }

        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }

        // JAZZ_PHYSICS__CELL_SIZE=64 -> physics.cell_size = 64
        figment = figment.merge(Env::prefixed("JAZZ_").split("__"));

        let config: AppConfig = figment.extract().map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.physics.cell_size.is_nan() || self.physics.cell_size <= 0.0 {
            return Err(ConfigError::new(format!(
                "physics.cell_size must be positive, got {}",
                self.physics.cell_size
            )));
        }
        if self.physics.layer_count == 0 || self.physics.layer_count > LayerMask::MAX_LAYERS {
            return Err(ConfigError::new(format!(
                "physics.layer_count must be between 1 and {}, got {}",
                LayerMask::MAX_LAYERS,
                self.physics.layer_count
            )));
        }
        if self.simulation.fixed_dt.is_nan() || self.simulation.fixed_dt <= 0.0 {
            return Err(ConfigError::new(format!(
                "simulation.fixed_dt must be positive, got {}",
                self.simulation.fixed_dt
            )));
        }
        Ok(())
    }
}

/// Fixed-step simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seconds per tick
    pub fixed_dt: f32,
    /// Number of ticks the headless runner simulates
    pub ticks: u32,
    /// Speed dynamic bodies fall at, in units per second along +Y
    pub fall_speed: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            ticks: 120,
            fall_speed: 120.0,
        }
    }
}

/// Scene configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Path to the RON scene template
    pub path: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            path: "scenes/demo.ron".to_string(),
        }
    }
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
    /// Build the collider debug lines after the run and report their size
    pub export_debug_lines: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            export_debug_lines: false,
        }
    }
}

/// Configuration error
#[derive(Debug)]
pub struct ConfigError {
    message: String,
}

impl ConfigError {
    fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError {
            message: e.to_string(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.physics.cell_size, 50.0);
        assert_eq!(config.physics.layer_count, 4);
        assert_eq!(config.simulation.ticks, 120);
        assert_eq!(config.debug.log_level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml = toml::to_string(&config).unwrap();
        assert!(toml.contains("cell_size"));
        assert!(toml.contains("fixed_dt"));
        assert!(toml.contains("log_level"));
    }

    #[test]
    fn test_partial_section() {
        let config: AppConfig = toml::from_str("[physics]\ncell_size = 32.0\n").unwrap();
        assert_eq!(config.physics.cell_size, 32.0);
        assert_eq!(config.physics.max_push_depth, 8);
        assert_eq!(config.scene.path, "scenes/demo.ron");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.physics.cell_size = 0.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.physics.layer_count = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.simulation.fixed_dt = -1.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("fixed_dt"));
    }
}
