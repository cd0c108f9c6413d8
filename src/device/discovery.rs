//! Input Device Discovery
//!
//! Finds the touchscreen, the volume key devices and the optional alert
//! slider among `/dev/input/event*`.
//!
//! # Strategy
//!
//! 1. **Named profiles**, in order. A profile names each device by prefix;
//!    empty names are not required. The first profile whose required
//!    devices are all present wins.
//! 2. **Capability scan** (when `auto_detect` is on): the first multitouch
//!    screen plus the first devices carrying `KEY_VOLUMEUP` and
//!    `KEY_VOLUMEDOWN`. All three are required; no slider is looked for.
//!
//! Matching works on [`DeviceSummary`] snapshots so it can be exercised
//! without hardware.

use crate::config::types::{DeviceConfig, DeviceProfile};
use crate::device::error::{DeviceError, Result};
use crate::engine::codes::abs;
use crate::engine::{Capabilities, PositionSource, SurfaceGeometry};
use evdev::{AbsoluteAxisCode, Device, EventType, KeyCode};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Three-position alert slider; a vendor axis evdev has no name for
pub const ABS_SLIDER: AbsoluteAxisCode = AbsoluteAxisCode(abs::ABS_SLIDER);

/// Capability snapshot of one input device
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSummary {
    /// Device node
    pub path: PathBuf,
    /// Kernel-reported name
    pub name: String,
    /// Supports `EV_SYN`
    pub syn: bool,
    /// Supported key codes
    pub keys: BTreeSet<u16>,
    /// Supported absolute axes
    pub abs_axes: BTreeSet<u16>,
}

impl DeviceSummary {
    /// Snapshot an opened evdev device
    pub fn from_device(path: PathBuf, device: &Device) -> Self {
        let events = device.supported_events();
        Self {
            path,
            name: device.name().unwrap_or("unknown").to_string(),
            syn: events.contains(EventType::SYNCHRONIZATION),
            keys: device
                .supported_keys()
                .map(|keys| keys.iter().map(|k| k.code()).collect())
                .unwrap_or_default(),
            abs_axes: device
                .supported_absolute_axes()
                .map(|axes| axes.iter().map(|a| a.0).collect())
                .unwrap_or_default(),
        }
    }

    /// Whether the device reports `key`
    pub fn has_key(&self, key: KeyCode) -> bool {
        self.keys.contains(&key.code())
    }

    /// Whether the device reports `axis`
    pub fn has_abs(&self, axis: AbsoluteAxisCode) -> bool {
        self.abs_axes.contains(&axis.0)
    }

    /// Multitouch screen per the capability rules
    pub fn is_touchscreen(&self) -> bool {
        self.syn
            && self.has_key(KeyCode::BTN_TOUCH)
            && self.has_abs(AbsoluteAxisCode::ABS_MT_SLOT)
            && ((self.has_abs(AbsoluteAxisCode::ABS_X) && self.has_abs(AbsoluteAxisCode::ABS_Y))
                || self.has_multitouch_positions())
    }

    /// Reports per-slot positions
    pub fn has_multitouch_positions(&self) -> bool {
        self.has_abs(AbsoluteAxisCode::ABS_MT_POSITION_X) && self.has_abs(AbsoluteAxisCode::ABS_MT_POSITION_Y)
    }

    /// Carries the given volume key
    pub fn has_volume_key(&self, key: KeyCode) -> bool {
        self.syn && self.has_key(key)
    }

    /// Position axes this device should be read from
    pub fn position_source(&self) -> PositionSource {
        if self.has_multitouch_positions() {
            PositionSource::Multitouch
        } else {
            PositionSource::SingleTouch
        }
    }
}

/// Which scanned devices play which role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSelection {
    /// Label of the profile that matched, or `"auto"`
    pub profile: String,
    /// Index of the touchscreen
    pub touchscreen: usize,
    /// Indices of the volume key devices, deduplicated
    pub buttons: Vec<usize>,
    /// Index of the alert slider
    pub slider: Option<usize>,
}

impl DeviceSelection {
    /// Optional sources this selection provides
    pub fn capabilities(&self, devices: &[DeviceSummary]) -> Capabilities {
        let carries = |key: KeyCode| {
            self.buttons
                .iter()
                .any(|&i| devices.get(i).is_some_and(|d| d.has_key(key)))
        };
        Capabilities {
            volume_up: carries(KeyCode::KEY_VOLUMEUP),
            volume_down: carries(KeyCode::KEY_VOLUMEDOWN),
            slider: self.slider.is_some(),
        }
    }
}

fn find_by_prefix(devices: &[DeviceSummary], prefix: &str) -> Option<usize> {
    devices.iter().position(|d| d.name.starts_with(prefix))
}

fn push_unique(indices: &mut Vec<usize>, index: usize) {
    if !indices.contains(&index) {
        indices.push(index);
    }
}

/// Match one named profile
pub fn match_profile(profile: &DeviceProfile, devices: &[DeviceSummary]) -> Option<DeviceSelection> {
    if profile.touchscreen.is_empty() {
        return None;
    }

    let lookup = |name: &str| -> Option<Option<usize>> {
        if name.is_empty() {
            Some(None)
        } else {
            find_by_prefix(devices, name).map(Some)
        }
    };

    let touchscreen = find_by_prefix(devices, &profile.touchscreen)?;
    let volume_up = lookup(&profile.volume_up)?;
    let volume_down = lookup(&profile.volume_down)?;
    let slider = lookup(&profile.slider)?;

    let mut buttons = Vec::new();
    for index in [volume_up, volume_down].into_iter().flatten() {
        push_unique(&mut buttons, index);
    }

    Some(DeviceSelection {
        profile: profile.name.clone(),
        touchscreen,
        buttons,
        slider,
    })
}

/// Fall back to capability matching
pub fn match_capabilities(devices: &[DeviceSummary]) -> Option<DeviceSelection> {
    let touchscreen = devices.iter().position(DeviceSummary::is_touchscreen)?;
    let volume_up = devices
        .iter()
        .position(|d| d.has_volume_key(KeyCode::KEY_VOLUMEUP))?;
    let volume_down = devices
        .iter()
        .position(|d| d.has_volume_key(KeyCode::KEY_VOLUMEDOWN))?;

    let mut buttons = vec![volume_up];
    push_unique(&mut buttons, volume_down);

    Some(DeviceSelection {
        profile: "auto".to_string(),
        touchscreen,
        buttons,
        slider: None,
    })
}

/// Pick devices: profiles first, then the capability scan if enabled
pub fn select_devices(config: &DeviceConfig, devices: &[DeviceSummary]) -> Option<DeviceSelection> {
    for profile in &config.profiles {
        if let Some(selection) = match_profile(profile, devices) {
            return Some(selection);
        }
        debug!("Device profile '{}' does not match", profile.name);
    }

    if config.auto_detect {
        debug!("No device profile matched, scanning capabilities");
        return match_capabilities(devices);
    }

    None
}

/// A physical input device kept open for the whole run
pub struct OpenDevice {
    /// Capability snapshot
    pub summary: DeviceSummary,
    /// evdev handle
    pub device: Device,
}

/// Every physical device the emulator reads
pub struct InputDevices {
    /// Profile that matched
    pub profile: String,
    /// Touch surface
    pub touchscreen: OpenDevice,
    /// Volume key devices
    pub buttons: Vec<OpenDevice>,
    /// Alert slider
    pub slider: Option<OpenDevice>,
    /// Optional sources present
    pub capabilities: Capabilities,
}

impl InputDevices {
    /// Scan `/dev/input` and claim the matching devices
    pub fn discover(config: &DeviceConfig) -> Result<Self> {
        let mut scanned: Vec<(DeviceSummary, Option<Device>)> = evdev::enumerate()
            .map(|(path, device)| {
                let summary = DeviceSummary::from_device(path, &device);
                debug!("Input device {}: {}", summary.path.display(), summary.name);
                (summary, Some(device))
            })
            .collect();
        // Stable order: event0, event1, ...
        scanned.sort_by(|a, b| a.0.path.cmp(&b.0.path));

        let summaries: Vec<DeviceSummary> = scanned.iter().map(|(s, _)| s.clone()).collect();
        let selection =
            select_devices(config, &summaries).ok_or(DeviceError::NoSupportedDevices)?;
        let capabilities = selection.capabilities(&summaries);

        info!("Using device profile: {}", selection.profile);

        let mut claim = |index: usize| -> Result<OpenDevice> {
            let (summary, device) = &mut scanned[index];
            let device = match device.take() {
                Some(device) => device,
                None => Device::open(&summary.path).map_err(|source| DeviceError::Open {
                    path: summary.path.clone(),
                    source,
                })?,
            };
            info!("  {} -> {}", summary.path.display(), summary.name);
            Ok(OpenDevice {
                summary: summary.clone(),
                device,
            })
        };

        let touchscreen = claim(selection.touchscreen)?;
        let buttons = selection
            .buttons
            .iter()
            .map(|&i| claim(i))
            .collect::<Result<Vec<_>>>()?;
        let slider = selection.slider.map(&mut claim).transpose()?;

        if !capabilities.volume_up && !capabilities.volume_down {
            warn!("No volume keys found; mode can only be changed with the slider");
        }

        Ok(Self {
            profile: selection.profile,
            touchscreen,
            buttons,
            slider,
            capabilities,
        })
    }
}

/// Read the touch surface maxima
pub fn surface_geometry(touchscreen: &OpenDevice) -> Result<SurfaceGeometry> {
    let (x_axis, y_axis) = match touchscreen.summary.position_source() {
        PositionSource::Multitouch => (
            AbsoluteAxisCode::ABS_MT_POSITION_X,
            AbsoluteAxisCode::ABS_MT_POSITION_Y,
        ),
        PositionSource::SingleTouch => (AbsoluteAxisCode::ABS_X, AbsoluteAxisCode::ABS_Y),
    };

    let mut max_x = None;
    let mut max_y = None;
    let info = touchscreen.device.get_absinfo().map_err(|source| DeviceError::Read {
        name: touchscreen.summary.name.clone(),
        source,
    })?;
    for (code, axis) in info {
        if code == x_axis {
            max_x = Some(axis.maximum());
        } else if code == y_axis {
            max_y = Some(axis.maximum());
        }
    }

    match (max_x, max_y) {
        (Some(max_x), Some(max_y)) => Ok(SurfaceGeometry::new(max_x, max_y)),
        _ => Err(DeviceError::MissingAxes(touchscreen.summary.name.clone())),
    }
}

/// Current alert slider position
pub fn slider_position(slider: &OpenDevice) -> Option<i32> {
    slider
        .device
        .get_absinfo()
        .ok()?
        .find(|(code, _)| *code == ABS_SLIDER)
        .map(|(_, info)| info.value())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(name: &str, keys: &[KeyCode], abs_axes: &[AbsoluteAxisCode]) -> DeviceSummary {
        DeviceSummary {
            path: PathBuf::from(format!("/dev/input/{}", name.replace(' ', "_"))),
            name: name.to_string(),
            syn: true,
            keys: keys.iter().map(|k| k.code()).collect(),
            abs_axes: abs_axes.iter().map(|a| a.0).collect(),
        }
    }

    fn goodix() -> DeviceSummary {
        device(
            "Goodix Capacitive TouchScreen",
            &[KeyCode::BTN_TOUCH],
            &[
                AbsoluteAxisCode::ABS_X,
                AbsoluteAxisCode::ABS_Y,
                AbsoluteAxisCode::ABS_MT_SLOT,
                AbsoluteAxisCode::ABS_MT_POSITION_X,
                AbsoluteAxisCode::ABS_MT_POSITION_Y,
                AbsoluteAxisCode::ABS_MT_TRACKING_ID,
            ],
        )
    }

    fn profile(name: &str, touchscreen: &str, up: &str, down: &str, slider: &str) -> DeviceProfile {
        DeviceProfile {
            name: name.to_string(),
            touchscreen: touchscreen.to_string(),
            volume_up: up.to_string(),
            volume_down: down.to_string(),
            slider: slider.to_string(),
        }
    }

    fn pinephone_devices() -> Vec<DeviceSummary> {
        vec![
            device("axp20x-pek", &[KeyCode::KEY_POWER], &[]),
            goodix(),
            device(
                "1c21800.lradc",
                &[KeyCode::KEY_VOLUMEDOWN, KeyCode::KEY_VOLUMEUP],
                &[],
            ),
        ]
    }

    #[test]
    fn test_profile_prefix_match() {
        let devices = pinephone_devices();
        let selection = match_profile(
            &profile("PinePhone", "Goodix Capacitive TouchScreen", "1c21800.lradc", "", ""),
            &devices,
        )
        .unwrap();

        assert_eq!(selection.touchscreen, 1);
        assert_eq!(selection.buttons, vec![2]);
        assert_eq!(selection.slider, None);

        let caps = selection.capabilities(&devices);
        assert!(caps.volume_up && caps.volume_down && !caps.slider);
    }

    #[test]
    fn test_profile_requires_every_named_device() {
        let devices = pinephone_devices();
        assert!(match_profile(
            &profile("Pad", "Goodix", "1c21800.lradc", "pm8941_resin", ""),
            &devices
        )
        .is_none());
        assert!(match_profile(&profile("Empty", "", "", "", ""), &devices).is_none());
    }

    #[test]
    fn test_first_matching_profile_wins() {
        let devices = pinephone_devices();
        let config = DeviceConfig {
            auto_detect: true,
            profiles: vec![
                profile("Nexus 5", "Synaptics PLG218", "gpio-keys", "", ""),
                profile("PinePhone", "Goodix Capacitive TouchScreen", "1c21800.lradc", "", ""),
                profile("PinePhone Pro", "Goodix Capacitive TouchScreen", "adc-keys", "", ""),
            ],
        };
        assert_eq!(select_devices(&config, &devices).unwrap().profile, "PinePhone");
    }

    #[test]
    fn test_slider_only_profile() {
        let devices = vec![
            device(
                "Synaptics S3706B",
                &[KeyCode::BTN_TOUCH],
                &[AbsoluteAxisCode::ABS_MT_SLOT, AbsoluteAxisCode::ABS_MT_POSITION_X, AbsoluteAxisCode::ABS_MT_POSITION_Y],
            ),
            device("Alert slider", &[], &[ABS_SLIDER]),
        ];
        let selection = match_profile(
            &profile("OnePlus 6T", "Synaptics S3706B", "", "", "Alert slider"),
            &devices,
        )
        .unwrap();

        assert_eq!(selection.slider, Some(1));
        assert!(selection.buttons.is_empty());
        let caps = selection.capabilities(&devices);
        assert!(caps.slider && !caps.volume_up && !caps.volume_down);
    }

    #[test]
    fn test_capability_scan() {
        let devices = vec![
            device("gpio-keys", &[KeyCode::KEY_VOLUMEUP], &[]),
            goodix(),
            device("pm8941_resin", &[KeyCode::KEY_VOLUMEDOWN], &[]),
        ];
        let selection = match_capabilities(&devices).unwrap();
        assert_eq!(selection.profile, "auto");
        assert_eq!(selection.touchscreen, 1);
        assert_eq!(selection.buttons, vec![0, 2]);
    }

    #[test]
    fn test_capability_scan_shares_one_button_device() {
        let selection = match_capabilities(&pinephone_devices()).unwrap();
        assert_eq!(selection.buttons, vec![2]);
    }

    #[test]
    fn test_capability_scan_needs_both_keys() {
        let devices = vec![goodix(), device("gpio-keys", &[KeyCode::KEY_VOLUMEUP], &[])];
        assert!(match_capabilities(&devices).is_none());

        let config = DeviceConfig {
            auto_detect: false,
            profiles: vec![],
        };
        assert!(select_devices(&config, &pinephone_devices()).is_none());
    }

    #[test]
    fn test_touchscreen_capabilities() {
        assert!(goodix().is_touchscreen());
        assert_eq!(goodix().position_source(), PositionSource::Multitouch);

        let single = device(
            "single",
            &[KeyCode::BTN_TOUCH],
            &[AbsoluteAxisCode::ABS_X, AbsoluteAxisCode::ABS_Y, AbsoluteAxisCode::ABS_MT_SLOT],
        );
        assert!(single.is_touchscreen());
        assert_eq!(single.position_source(), PositionSource::SingleTouch);

        let no_slot = device("tablet", &[KeyCode::BTN_TOUCH], &[AbsoluteAxisCode::ABS_X, AbsoluteAxisCode::ABS_Y]);
        assert!(!no_slot.is_touchscreen());
    }
}
