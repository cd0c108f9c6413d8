//! Kernel Input Plumbing
//!
//! Everything that talks to `/dev/input` and `/dev/uinput`:
//!
//! - [`discovery`] - find the touchscreen, volume keys and slider
//! - [`surface`] - exclusive grabs
//! - [`virtual_pointer`] - the emulated mouse
//! - [`virtual_buttons`] - volume key pass-through
//! - [`keyboard`] - on-screen keyboard switch
//!
//! Failures here are setup failures. Once the devices are open nothing is
//! retried.

pub mod discovery;
pub mod error;
pub mod keyboard;
pub mod surface;
pub mod virtual_buttons;
pub mod virtual_pointer;

pub use discovery::{
    select_devices, slider_position, surface_geometry, DeviceSelection, DeviceSummary,
    InputDevices, OpenDevice,
};
pub use error::{DeviceError, Result};
pub use keyboard::{GsettingsKeyboard, UnmanagedKeyboard};
pub use surface::{grab_for_run, SharedDevice, TouchSurfaceGrab};
pub use virtual_buttons::VirtualButtons;
pub use virtual_pointer::VirtualPointer;
