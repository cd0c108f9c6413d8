//! Configuration type definitions

use crate::engine::{ActionTable, ButtonActions, Rotation};
use serde::{Deserialize, Serialize};

/// Input loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Upper bound on one poll wait in milliseconds
    pub poll_timeout_ms: u16,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            poll_timeout_ms: 5000,
        }
    }
}

/// Where the rotation comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrientationMode {
    /// Follow iio-sensor-proxy, falling back to manual rotation
    Auto,
    /// Use `fixed_degrees` for the whole run
    Fixed,
}

/// Orientation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientationConfig {
    /// Rotation source
    pub mode: OrientationMode,

    /// Rotation in degrees when `mode = "fixed"` (0, 90, 180, 270)
    pub fixed_degrees: u16,

    /// Sensor polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl OrientationConfig {
    /// Fixed rotation, if configured
    pub fn fixed_rotation(&self) -> Option<Rotation> {
        match self.mode {
            OrientationMode::Fixed => Rotation::from_degrees(self.fixed_degrees),
            OrientationMode::Auto => None,
        }
    }
}

impl Default for OrientationConfig {
    fn default() -> Self {
        Self {
            mode: OrientationMode::Auto,
            fixed_degrees: 0,
            poll_interval_ms: 1000,
        }
    }
}

/// Devices of one supported phone or tablet, matched by name prefix
///
/// Empty names are not required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    /// Label used in logs
    pub name: String,

    /// Touchscreen device name
    pub touchscreen: String,

    /// Device carrying the volume-up key (may carry volume-down too)
    #[serde(default)]
    pub volume_up: String,

    /// Device carrying the volume-down key
    #[serde(default)]
    pub volume_down: String,

    /// Alert slider device name
    #[serde(default)]
    pub slider: String,
}

impl DeviceProfile {
    fn new(name: &str, touchscreen: &str, volume_up: &str, volume_down: &str, slider: &str) -> Self {
        Self {
            name: name.to_string(),
            touchscreen: touchscreen.to_string(),
            volume_up: volume_up.to_string(),
            volume_down: volume_down.to_string(),
            slider: slider.to_string(),
        }
    }

    /// Profiles of the hardware known to work
    pub fn known_devices() -> Vec<Self> {
        vec![
            Self::new("PinePhone", "Goodix Capacitive TouchScreen", "1c21800.lradc", "", ""),
            Self::new("PinePhone Pro", "Goodix Capacitive TouchScreen", "adc-keys", "", ""),
            Self::new("OnePlus 6T", "Synaptics S3706B", "", "", "Alert slider"),
            Self::new(
                "Xiaomi Pad 5 Pro",
                "NVTCapacitiveTouchScreen",
                "gpio-keys",
                "pm8941_resin",
                "",
            ),
            Self::new("Pixel 3a", "Synaptics S3706B", "gpio-keys", "pm8941_resin", ""),
            Self::new("Poco F1", "nvt-ts", "gpio-keys", "pm8941_resin", ""),
            Self::new("Nexus 5", "Synaptics PLG218", "gpio-keys", "", ""),
        ]
    }
}

/// Device discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Fall back to a capability scan when no profile matches
    pub auto_detect: bool,

    /// Named profiles, tried in order
    pub profiles: Vec<DeviceProfile>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            auto_detect: true,
            profiles: DeviceProfile::known_devices(),
        }
    }
}

/// Button action configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionsConfig {
    /// Volume-up key
    pub volume_up: ButtonActions,

    /// Volume-down key
    pub volume_down: ButtonActions,
}

impl ActionsConfig {
    /// Engine action table
    pub fn table(&self) -> ActionTable {
        ActionTable {
            volume_up: self.volume_up,
            volume_down: self.volume_down,
        }
    }
}

impl Default for ActionsConfig {
    fn default() -> Self {
        let table = ActionTable::default();
        Self {
            volume_up: table.volume_up,
            volume_down: table.volume_down,
        }
    }
}

/// On-screen keyboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardConfig {
    /// Switch the GNOME screen keyboard with touchpad mode
    pub manage_on_screen_keyboard: bool,
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            manage_on_screen_keyboard: true,
        }
    }
}
