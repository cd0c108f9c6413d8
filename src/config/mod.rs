//! Configuration management
//!
//! Handles loading, validation, and merging of configuration from:
//! - TOML files
//! - CLI arguments
//!
//! Every section is optional; missing sections and fields take the
//! defaults below.
//!
//! ```toml
//! [input]
//! poll_timeout_ms = 5000
//!
//! [orientation]
//! mode = "auto"            # or "fixed"
//! fixed_degrees = 0
//! poll_interval_ms = 1000
//!
//! [devices]
//! auto_detect = true
//!
//! [[devices.profiles]]
//! name = "PinePhone"
//! touchscreen = "Goodix Capacitive TouchScreen"
//! volume_up = "1c21800.lradc"
//!
//! [actions.volume_up]
//! click = "emit-volume-up"
//! short_hold = "enable-touchpad"
//! long_hold = "close"
//!
//! [keyboard]
//! manage_on_screen_keyboard = true
//! ```
//!
//! Gesture timing (tap window, hold delays, scroll threshold) is fixed and
//! not configurable.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod types;

// Use types from types.rs
use types::*;

pub use types::{DeviceConfig, DeviceProfile, OrientationMode};

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "/etc/touchpad-emulator/config.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Input loop configuration
    #[serde(default)]
    pub input: InputConfig,
    /// Orientation configuration
    #[serde(default)]
    pub orientation: OrientationConfig,
    /// Device discovery configuration
    #[serde(default)]
    pub devices: DeviceConfig,
    /// Button action configuration
    #[serde(default)]
    pub actions: ActionsConfig,
    /// On-screen keyboard configuration
    #[serde(default)]
    pub keyboard: KeyboardConfig,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Create default configuration
    pub fn default_config() -> Self {
        Self::default()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.input.poll_timeout_ms == 0 {
            anyhow::bail!("input.poll_timeout_ms must be greater than 0");
        }

        if self.orientation.mode == OrientationMode::Fixed
            && self.orientation.fixed_rotation().is_none()
        {
            anyhow::bail!(
                "Invalid orientation.fixed_degrees: {} (expected 0, 90, 180 or 270)",
                self.orientation.fixed_degrees
            );
        }

        if self.orientation.poll_interval_ms == 0 {
            anyhow::bail!("orientation.poll_interval_ms must be greater than 0");
        }

        for profile in &self.devices.profiles {
            if profile.touchscreen.is_empty() {
                anyhow::bail!("Device profile '{}' has no touchscreen name", profile.name);
            }
        }

        if self.devices.profiles.is_empty() && !self.devices.auto_detect {
            anyhow::bail!("No device profiles and auto_detect disabled: nothing can match");
        }

        Ok(())
    }

    /// Override config with CLI arguments
    ///
    /// A rotation given on the command line pins the orientation.
    pub fn with_overrides(mut self, rotation: Option<u16>) -> Self {
        if let Some(degrees) = rotation {
            self.orientation.mode = OrientationMode::Fixed;
            self.orientation.fixed_degrees = degrees;
        }

        self
    }
}
