//! Exclusive access to physical input devices.

use crate::device::error::{DeviceError, Result};
use crate::engine::SurfaceGrab;
use evdev::Device;
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use tracing::debug;

/// An input device shared between the reader loop and the grab owner
pub type SharedDevice = Arc<Mutex<Device>>;

/// Grab a device for the whole run (volume keys, slider)
pub fn grab_for_run(device: &mut Device, name: &str) -> Result<()> {
    device.grab().map_err(|source| DeviceError::Grab {
        name: name.to_string(),
        source,
    })?;
    debug!("Grabbed {}", name);
    Ok(())
}

/// [`SurfaceGrab`] over the touchscreen
///
/// Tracks its own state so repeated grabs or releases never reach the
/// kernel, which would reject them with `EBUSY`/`EINVAL`.
pub struct TouchSurfaceGrab {
    device: SharedDevice,
    name: String,
    grabbed: bool,
}

impl TouchSurfaceGrab {
    /// Wrap the touchscreen handle
    pub fn new(device: SharedDevice, name: impl Into<String>) -> Self {
        Self {
            device,
            name: name.into(),
            grabbed: false,
        }
    }
}

impl SurfaceGrab for TouchSurfaceGrab {
    fn grab(&mut self) -> io::Result<()> {
        if self.grabbed {
            return Ok(());
        }
        self.device.lock().grab()?;
        self.grabbed = true;
        debug!("Grabbed touch surface {}", self.name);
        Ok(())
    }

    fn release(&mut self) -> io::Result<()> {
        if !self.grabbed {
            return Ok(());
        }
        self.device.lock().ungrab()?;
        self.grabbed = false;
        debug!("Released touch surface {}", self.name);
        Ok(())
    }
}
