// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Editor configuration.
//!
//! Settings are read from a YAML file. Every section falls back to its
//! defaults, so a partial file (or no file at all) is valid.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "OVERLAY_EDITOR_CONFIG";

/// Config file looked up in the working directory when the variable is unset.
pub const DEFAULT_CONFIG_FILE: &str = "overlay-editor.yaml";

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Playback-side settings used by the activation scheduler and canvas fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Maximum tolerated offset between host time and overlay media time
    pub drift_threshold_secs: f64,
    /// Letterbox the canvas to the video aspect ratio
    pub fullscreen_fit: bool,
    /// Use a fixed 16:9 ratio instead of the player's reported ratio
    pub use_fixed_ratio: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            drift_threshold_secs: 0.5,
            fullscreen_fit: false,
            use_fixed_ratio: false,
        }
    }
}

/// Layout and geometry settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Quiet period before a viewport resize triggers a relayout
    pub resize_debounce_ms: u64,
    /// Lowest z-index of overlay items
    pub baseline_z: i32,
    /// Pixels moved per arrow key press
    pub nudge_step_px: f64,
    /// Canvas width divided by this gives the base font size
    pub font_divisor: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            resize_debounce_ms: 100,
            baseline_z: 5,
            nudge_step_px: 1.0,
            font_divisor: 75.0,
        }
    }
}

/// Editing session settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Delay before a duplicate is finalized into history
    pub duplicate_settle_ms: u64,
    /// Interval length given to newly added items
    pub default_item_duration: f64,
    /// Upper bound of the random pixel offset of newly added items
    pub new_item_jitter_px: f64,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            duplicate_settle_ms: 500,
            default_item_duration: 5.0,
            new_item_jitter_px: 100.0,
        }
    }
}

/// Complete editor configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub playback: PlaybackConfig,
    pub layout: LayoutConfig,
    pub editor: EditorSettings,
    pub log_level: LogLevel,
}

impl EditorConfig {
    /// Parse a configuration from YAML text.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config = serde_yaml::from_str(yaml).context("Failed to parse editor config")?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_yaml(&yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Locate the config file: explicit env var first, then the default file.
    pub fn locate() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        let default = PathBuf::from(DEFAULT_CONFIG_FILE);
        default.exists().then_some(default)
    }

    /// Load the located config file, if there is one.
    pub fn load_located() -> Option<Result<Self>> {
        Self::locate().map(|path| Self::load(&path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = EditorConfig::from_yaml("playback:\n  drift_threshold_secs: 0.25\n").unwrap();
        assert_eq!(config.playback.drift_threshold_secs, 0.25);
        assert!(!config.playback.fullscreen_fit);
        assert_eq!(config.layout, LayoutConfig::default());
        assert_eq!(config.editor.duplicate_settle_ms, 500);
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let mut config = EditorConfig::default();
        config.layout.baseline_z = 10;
        config.log_level = LogLevel::Debug;
        let yaml = config.to_yaml().unwrap();
        assert_eq!(EditorConfig::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        assert!(EditorConfig::from_yaml("layout: [1, 2").is_err());
    }
}
