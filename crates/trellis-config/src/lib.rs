//! # trellis-config
//!
//! Configuration management for Trellis.
//!
//! Loads configuration from:
//! 1. `~/.trellis/config.toml` (global)
//! 2. `.trellis/config.toml` (project-local, overrides global)
//! 3. Environment variables (highest priority)
//!
//! There is no process-wide config instance. Callers load a [`Config`] once
//! and hand it to whatever needs it.

pub mod logging;
pub mod path;
pub mod testing;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable overriding `presets.dir`
pub const ENV_PRESETS_DIR: &str = "TRELLIS_PRESETS_DIR";
/// Environment variable overriding `mask.brush_radius`
pub const ENV_BRUSH_RADIUS: &str = "TRELLIS_BRUSH_RADIUS";

/// File name of the default preset inside a presets directory
pub const DEFAULT_PRESET_FILE: &str = "#.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub presets: PresetsConfig,
    pub mask: MaskConfig,
}

impl Config {
    /// Load config from standard locations
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        // 1. Global config (~/.trellis/config.toml)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                debug!("Loading global config from {:?}", global_path);
                config = Self::load_file(&global_path)?;
            }
        }

        // 2. Project config (.trellis/config.toml) - overrides global
        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("Loading project config from {:?}", project_path);
            let project_config = Self::load_file(&project_path)?;
            config.merge(project_config);
        }

        // 3. Environment overrides
        config.apply_env_overrides();

        Ok(config)
    }

    /// Parse a single TOML config file
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Global config path: ~/.trellis/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".trellis/config.toml"))
    }

    /// Project config path, relative to the working directory
    pub fn project_config_path() -> PathBuf {
        PathBuf::from(".trellis/config.toml")
    }

    /// Merge another config over this one (project overrides global).
    ///
    /// Only values that differ from the defaults replace ours.
    pub fn merge(&mut self, other: Config) {
        let defaults = Config::default();

        if other.logging.level != defaults.logging.level {
            self.logging.level = other.logging.level;
        }
        if other.presets.dir != defaults.presets.dir {
            self.presets.dir = other.presets.dir;
        }
        if other.presets.include_default != defaults.presets.include_default {
            self.presets.include_default = other.presets.include_default;
        }
        if other.mask.brush_radius != defaults.mask.brush_radius {
            self.mask.brush_radius = other.mask.brush_radius;
        }
        if other.mask.paint_value != defaults.mask.paint_value {
            self.mask.paint_value = other.mask.paint_value;
        }
        if other.mask.erase_value != defaults.mask.erase_value {
            self.mask.erase_value = other.mask.erase_value;
        }
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(std::env::vars());
    }

    /// Apply overrides from an arbitrary set of `(name, value)` pairs.
    pub fn apply_overrides<I, K, V>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let value = value.as_ref();
            match key.as_ref() {
                ENV_PRESETS_DIR => self.presets.dir = PathBuf::from(value),
                ENV_BRUSH_RADIUS => match value.parse() {
                    Ok(radius) => self.mask.brush_radius = radius,
                    Err(_) => debug!("Ignoring invalid {}={:?}", ENV_BRUSH_RADIUS, value),
                },
                _ => {}
            }
        }
    }

    /// Generate default config TOML string
    pub fn default_toml() -> String {
        Config::default().to_toml()
    }

    /// Render this config as TOML
    pub fn to_toml(&self) -> String {
        // Plain structs with string/number/bool leaves always serialize.
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when neither TRELLIS_LOG nor RUST_LOG is set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Preset discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PresetsConfig {
    /// Directory holding `*.json` presets
    pub dir: PathBuf,
    /// Whether the `#.json` default preset is listed first
    pub include_default: bool,
}

impl Default for PresetsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("training_presets"),
            include_default: true,
        }
    }
}

impl PresetsConfig {
    /// Path of the default preset in the configured directory
    pub fn default_preset_path(&self) -> PathBuf {
        path::canonical_join(&self.dir, DEFAULT_PRESET_FILE)
    }
}

/// Mask editor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskConfig {
    /// Brush radius used when a stroke does not name one
    pub brush_radius: u32,
    /// Value written by painting (and restored for set bits on undo/redo)
    pub paint_value: u8,
    /// Value written by erasing
    pub erase_value: u8,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            brush_radius: 8,
            paint_value: 255,
            erase_value: 0,
        }
    }
}
