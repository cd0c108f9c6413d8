//! Device Error Types
//!
//! Failures of the kernel input plumbing: finding, opening and grabbing
//! `/dev/input/event*` nodes and creating uinput devices.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for device operations
pub type Result<T> = std::result::Result<T, DeviceError>;

/// Device module error types
#[derive(Error, Debug)]
pub enum DeviceError {
    /// No profile matched and the capability scan found nothing usable
    #[error("No supported set of input devices found (touchscreen and volume keys)")]
    NoSupportedDevices,

    /// Device node could not be opened
    #[error("Failed to open input device {path}: {source}")]
    Open {
        /// Device node
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Exclusive grab (EVIOCGRAB) failed
    #[error("Failed to grab input device {name}: {source}")]
    Grab {
        /// Device name
        name: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Absolute axis info unavailable
    #[error("Touchscreen {0} reports no usable position axes")]
    MissingAxes(String),

    /// uinput device creation failed
    #[error("Failed to create virtual device {name}: {source}")]
    VirtualDevice {
        /// Virtual device name
        name: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Reading events failed
    #[error("Failed to read events from {name}: {source}")]
    Read {
        /// Device name
        name: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },
}

impl DeviceError {
    /// Whether the failure is a permission problem on a device node
    pub fn is_permission_denied(&self) -> bool {
        let source = match self {
            DeviceError::Open { source, .. }
            | DeviceError::Grab { source, .. }
            | DeviceError::VirtualDevice { source, .. }
            | DeviceError::Read { source, .. } => source,
            DeviceError::NoSupportedDevices | DeviceError::MissingAxes(_) => return false,
        };
        source.kind() == io::ErrorKind::PermissionDenied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_classification() {
        let denied = DeviceError::VirtualDevice {
            name: "Touchpad Emulator".to_string(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert!(denied.is_permission_denied());
        assert!(denied.to_string().contains("Touchpad Emulator"));

        assert!(!DeviceError::NoSupportedDevices.is_permission_denied());
        let missing = DeviceError::Open {
            path: PathBuf::from("/dev/input/event9"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(!missing.is_permission_denied());
    }
}
