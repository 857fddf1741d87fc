//! Configuration loading and config file resolution
//!
//! Configuration is a single TOML file. Missing files are never fatal: the
//! loader warns and falls back to compiled defaults. A file that exists but
//! does not parse is an error.
//!
//! # Config File Priority
//!
//! 1. Command-line argument (highest priority)
//! 2. `MCAP_CONFIG` environment variable
//! 3. `<config_dir>/mcap/config.toml`
//! 4. Compiled defaults (fallback)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::geo::{Coordinate, FALLBACK_LATITUDE, FALLBACK_LONGITUDE};
use crate::{Error, Result};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "MCAP_CONFIG";

/// Highest zoom level the tile servers serve
pub const MAX_ZOOM: u8 = 19;

/// Full configuration loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub map: MapConfig,

    #[serde(default)]
    pub settings: AppSettings,

    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Map viewport configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Latitude used when the viewer's location is unavailable
    #[serde(default = "default_fallback_latitude")]
    pub fallback_latitude: f64,

    /// Longitude used when the viewer's location is unavailable
    #[serde(default = "default_fallback_longitude")]
    pub fallback_longitude: f64,

    /// Zoom level applied on every recenter
    #[serde(default = "default_zoom")]
    pub zoom: u8,
}

/// User-facing toggles from the settings screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    /// When false the viewer's own marker is never drawn
    #[serde(default = "default_true")]
    pub location_sharing: bool,

    /// Start capsule embeds playing as soon as they open
    #[serde(default)]
    pub auto_play: bool,
}

/// Data source configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// JSON catalog to load instead of the built-in demo data
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_fallback_latitude() -> f64 {
    FALLBACK_LATITUDE
}

fn default_fallback_longitude() -> f64 {
    FALLBACK_LONGITUDE
}

fn default_zoom() -> u8 {
    13
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            fallback_latitude: default_fallback_latitude(),
            fallback_longitude: default_fallback_longitude(),
            zoom: default_zoom(),
        }
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            location_sharing: true,
            auto_play: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl MapConfig {
    pub fn fallback_center(&self) -> Coordinate {
        Coordinate::new(self.fallback_latitude, self.fallback_longitude)
    }
}

impl TomlConfig {
    /// Parse and validate a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TomlConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that deserialize fine but make no sense
    pub fn validate(&self) -> Result<()> {
        self.map
            .fallback_center()
            .validate()
            .map_err(|e| Error::Config(format!("map fallback center: {}", e)))?;
        if self.map.zoom > MAX_ZOOM {
            return Err(Error::Config(format!(
                "map zoom {} exceeds maximum {}",
                self.map.zoom, MAX_ZOOM
            )));
        }
        Ok(())
    }
}

/// Pick the config file to read, without touching its contents
///
/// Returns `None` when neither an explicit path nor a user config file exists.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: user config directory, only if the file is there
    default_config_path().filter(|p| p.exists())
}

/// `<config_dir>/mcap/config.toml` for the current platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mcap").join("config.toml"))
}

/// Load configuration following the priority order
///
/// A missing file logs a warning and yields defaults.
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = resolve_config_path(cli_arg) else {
        info!("No config file found, using compiled defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!(
            "Config file {} not found, using compiled defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let config = TomlConfig::from_file(&path)?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}
