//! Virtual volume keys used to pass clicks through while the physical keys
//! are grabbed.

use crate::device::error::{DeviceError, Result};
use crate::device::virtual_pointer::emulator_input_id;
use crate::engine::{ButtonOutput, VolumeKey};
use evdev::uinput::VirtualDevice;
use evdev::{AttributeSet, EventType, InputEvent, KeyCode};
use std::io;
use tracing::trace;

/// Name the virtual key device is registered under
pub const BUTTONS_NAME: &str = "Touchpad Emulator Buttons";

fn key_code(key: VolumeKey) -> KeyCode {
    match key {
        VolumeKey::Up => KeyCode::KEY_VOLUMEUP,
        VolumeKey::Down => KeyCode::KEY_VOLUMEDOWN,
    }
}

/// [`ButtonOutput`] backed by uinput
pub struct VirtualButtons {
    device: VirtualDevice,
}

impl VirtualButtons {
    /// Create the device; it lives for the whole run
    pub fn create() -> Result<Self> {
        let wrap = |source: io::Error| DeviceError::VirtualDevice {
            name: BUTTONS_NAME.to_string(),
            source,
        };

        let mut keys = AttributeSet::<KeyCode>::new();
        keys.insert(key_code(VolumeKey::Up));
        keys.insert(key_code(VolumeKey::Down));

        let device = VirtualDevice::builder()
            .map_err(wrap)?
            .name(BUTTONS_NAME)
            .input_id(emulator_input_id())
            .with_keys(&keys)
            .map_err(wrap)?
            .build()
            .map_err(wrap)?;

        Ok(Self { device })
    }
}

impl ButtonOutput for VirtualButtons {
    fn tap(&mut self, key: VolumeKey) -> io::Result<()> {
        trace!("Passing {:?} through", key);
        let code = key_code(key).code();
        self.device.emit(&[InputEvent::new(EventType::KEY.0, code, 1)])?;
        self.device.emit(&[InputEvent::new(EventType::KEY.0, code, 0)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::codes::key;

    #[test]
    fn test_key_codes_match_input_side() {
        // What the emulator writes must read back as the same key
        for volume in [VolumeKey::Up, VolumeKey::Down] {
            assert_eq!(VolumeKey::from_linux_key(key_code(volume).code()), Some(volume));
        }
        assert_eq!(key_code(VolumeKey::Up).code(), key::KEY_VOLUMEUP);
    }
}
