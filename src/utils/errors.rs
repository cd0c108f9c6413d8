//! User-Friendly Error Formatting
//!
//! Provides user-friendly error messages with troubleshooting hints
//! for common error scenarios.

use crate::config::DEFAULT_CONFIG_PATH;
use crate::device::DeviceError;
use std::fmt::Write;

/// What went wrong, as far as the hints are concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorCategory {
    InputPermission,
    Uinput,
    NoDevices,
    Sensor,
    Config,
    Generic,
}

fn categorize(error: &anyhow::Error) -> ErrorCategory {
    let device_error = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<DeviceError>());

    match device_error {
        Some(DeviceError::NoSupportedDevices) | Some(DeviceError::MissingAxes(_)) => {
            return ErrorCategory::NoDevices
        }
        Some(DeviceError::VirtualDevice { .. }) => return ErrorCategory::Uinput,
        Some(e) if e.is_permission_denied() => return ErrorCategory::InputPermission,
        _ => {}
    }

    let error_msg = format!("{:#}", error);
    if error_msg.contains("uinput") {
        ErrorCategory::Uinput
    } else if error_msg.contains("/dev/input") || error_msg.contains("Permission denied") {
        ErrorCategory::InputPermission
    } else if error_msg.contains("SensorProxy") || error_msg.contains("D-Bus") {
        ErrorCategory::Sensor
    } else if error_msg.contains("config") {
        ErrorCategory::Config
    } else {
        ErrorCategory::Generic
    }
}

/// Format error for user consumption
///
/// Takes technical error and produces user-friendly message with
/// troubleshooting steps and context.
pub fn format_user_error(error: &anyhow::Error) -> String {
    let mut output = String::new();

    // Header
    writeln!(&mut output).ok();
    writeln!(
        &mut output,
        "╔════════════════════════════════════════════════════════════╗"
    )
    .ok();
    writeln!(
        &mut output,
        "║                     ERROR                                  ║"
    )
    .ok();
    writeln!(
        &mut output,
        "╚════════════════════════════════════════════════════════════╝"
    )
    .ok();
    writeln!(&mut output).ok();

    match categorize(error) {
        ErrorCategory::InputPermission => format_permission_error(&mut output),
        ErrorCategory::Uinput => format_uinput_error(&mut output),
        ErrorCategory::NoDevices => format_no_devices_error(&mut output),
        ErrorCategory::Sensor => format_sensor_error(&mut output),
        ErrorCategory::Config => format_config_error(&mut output),
        ErrorCategory::Generic => format_generic_error(&mut output, &error.to_string()),
    }

    // Technical details
    writeln!(&mut output).ok();
    writeln!(
        &mut output,
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━"
    )
    .ok();
    writeln!(&mut output, "Technical Details:").ok();
    writeln!(&mut output).ok();
    writeln!(&mut output, "{:#}", error).ok();
    writeln!(&mut output).ok();

    // Footer with help
    writeln!(
        &mut output,
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━"
    )
    .ok();
    writeln!(&mut output, "Need Help?").ok();
    writeln!(
        &mut output,
        "  - Run with --verbose for detailed logs: touchpad-emulator -vv"
    )
    .ok();
    writeln!(
        &mut output,
        "  - List input devices: cat /proc/bus/input/devices"
    )
    .ok();
    writeln!(
        &mut output,
        "╚════════════════════════════════════════════════════════════╝"
    )
    .ok();

    output
}

fn format_permission_error(output: &mut String) {
    writeln!(output, "Input Device Permission Error").ok();
    writeln!(output).ok();
    writeln!(
        output,
        "Could not open or grab a device under /dev/input."
    )
    .ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Not running as root or in the input group").ok();
    writeln!(output, "     → Run: sudo touchpad-emulator").ok();
    writeln!(
        output,
        "     → Or: sudo usermod -aG input $USER (then log in again)"
    )
    .ok();
    writeln!(output).ok();
    writeln!(output, "  2. Another program grabbed the device").ok();
    writeln!(output, "     → Check: sudo fuser -v /dev/input/event*").ok();
    writeln!(output, "     → Stop any other touchpad emulator instance").ok();
}

fn format_uinput_error(output: &mut String) {
    writeln!(output, "Virtual Device Error (uinput)").ok();
    writeln!(output).ok();
    writeln!(
        output,
        "Could not create the virtual pointer or volume buttons."
    )
    .ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. uinput module not loaded").ok();
    writeln!(output, "     → Run: sudo modprobe uinput").ok();
    writeln!(output, "     → Check: ls -l /dev/uinput").ok();
    writeln!(output).ok();
    writeln!(output, "  2. No write access to /dev/uinput").ok();
    writeln!(output, "     → Run as root, or add a udev rule:").ok();
    writeln!(
        output,
        "       KERNEL==\"uinput\", GROUP=\"input\", MODE=\"0660\""
    )
    .ok();
}

fn format_no_devices_error(output: &mut String) {
    writeln!(output, "No Supported Input Devices").ok();
    writeln!(output).ok();
    writeln!(
        output,
        "No device profile matched and the capability scan found no usable"
    )
    .ok();
    writeln!(output, "touchscreen with volume keys.").ok();
    writeln!(output).ok();
    writeln!(output, "What To Try:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Find your device names").ok();
    writeln!(output, "     → Run: cat /proc/bus/input/devices").ok();
    writeln!(output).ok();
    writeln!(output, "  2. Add a profile to {}", DEFAULT_CONFIG_PATH).ok();
    writeln!(output, "       [[devices.profiles]]").ok();
    writeln!(output, "       name = \"My Phone\"").ok();
    writeln!(output, "       touchscreen = \"<touchscreen name>\"").ok();
    writeln!(output, "       volume_up = \"<key device name>\"").ok();
    writeln!(output).ok();
    writeln!(output, "  3. Make sure [devices] auto_detect is not false").ok();
}

fn format_sensor_error(output: &mut String) {
    writeln!(output, "Orientation Sensor Error").ok();
    writeln!(output).ok();
    writeln!(output, "Could not talk to iio-sensor-proxy on the system bus.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. iio-sensor-proxy is not running").ok();
    writeln!(output, "     → Run: systemctl status iio-sensor-proxy").ok();
    writeln!(output, "     → Install it from your distribution").ok();
    writeln!(output).ok();
    writeln!(output, "  2. No accelerometer on this device").ok();
    writeln!(output, "     → Pin the rotation: touchpad-emulator --rotation 0").ok();
}

fn format_config_error(output: &mut String) {
    writeln!(output, "Configuration Error").ok();
    writeln!(output).ok();
    writeln!(output, "Problem with configuration file.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Configuration file not found").ok();
    writeln!(output, "     → Default location: {}", DEFAULT_CONFIG_PATH).ok();
    writeln!(
        output,
        "     → Or specify: touchpad-emulator -c /path/to/config.toml"
    )
    .ok();
    writeln!(output).ok();
    writeln!(output, "  2. Invalid TOML syntax").ok();
    writeln!(output, "     → Check for typos, missing quotes, etc.").ok();
    writeln!(output).ok();
    writeln!(output, "  3. Unknown action name").ok();
    writeln!(
        output,
        "     → Valid: enable-touchpad, disable-touchpad-toggle-keyboard,"
    )
    .ok();
    writeln!(
        output,
        "       disable-touchpad-enable-keyboard, disable-touchpad-disable-keyboard,"
    )
    .ok();
    writeln!(
        output,
        "       close, emit-volume-up, emit-volume-down, change-orientation, do-nothing"
    )
    .ok();
}

fn format_generic_error(output: &mut String, error: &str) {
    writeln!(output, "Touchpad Emulator Error").ok();
    writeln!(output).ok();
    writeln!(output, "An error occurred while running the emulator.").ok();
    writeln!(output).ok();
    writeln!(output, "Error: {}", error).ok();
    writeln!(output).ok();
    writeln!(output, "Troubleshooting:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Check the input devices are still present:").ok();
    writeln!(output, "     → ls -l /dev/input/").ok();
    writeln!(output).ok();
    writeln!(output, "  2. Restore the screen keyboard if it stayed off:").ok();
    writeln!(
        output,
        "     → gsettings set org.gnome.desktop.a11y.applications screen-keyboard-enabled true"
    )
    .ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn test_format_user_error() {
        let error = anyhow::anyhow!("something odd happened");
        let formatted = format_user_error(&error);
        assert!(formatted.contains("ERROR"));
        assert!(formatted.contains("something odd happened"));
        assert!(formatted.contains("Troubleshooting"));
    }

    #[test]
    fn test_permission_error_behind_context() {
        let error = Err::<(), _>(DeviceError::Open {
            path: PathBuf::from("/dev/input/event3"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        })
        .context("Failed to find input devices")
        .unwrap_err();

        assert_eq!(categorize(&error), ErrorCategory::InputPermission);
        let formatted = format_user_error(&error);
        assert!(formatted.contains("input group"));
        assert!(formatted.contains("/dev/input/event3"));
    }

    #[test]
    fn test_no_devices_error_formatting() {
        let error = anyhow::Error::from(DeviceError::NoSupportedDevices);
        let formatted = format_user_error(&error);
        assert!(formatted.contains("[[devices.profiles]]"));
    }

    #[test]
    fn test_uinput_error_formatting() {
        let error = anyhow::Error::from(DeviceError::VirtualDevice {
            name: "Touchpad Emulator".to_string(),
            source: io::Error::from(io::ErrorKind::NotFound),
        });
        assert_eq!(categorize(&error), ErrorCategory::Uinput);
        assert!(format_user_error(&error).contains("modprobe uinput"));
    }

    #[test]
    fn test_config_error_formatting() {
        let error = anyhow::anyhow!("Failed to parse config file");
        assert_eq!(categorize(&error), ErrorCategory::Config);
        assert!(format_user_error(&error).contains("emit-volume-up"));
    }
}
