//! Output Devices
//!
//! What the engine writes: relative pointer motion, wheel, left/right
//! buttons and frame syncs on a virtual pointer, plus volume key taps on a
//! separate virtual button device.

use crate::engine::event::VolumeKey;
use std::io;

/// Pointer button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    /// Primary button
    Left,
    /// Secondary button
    Right,
}

/// Relative axis on the virtual pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelAxis {
    /// `REL_X`
    X,
    /// `REL_Y`
    Y,
    /// `REL_WHEEL`
    Wheel,
}


/// Event written to the virtual pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    /// Button edge
    Button {
        /// Which button
        button: PointerButton,
        /// `true` for press
        pressed: bool,
    },
    /// Relative motion or wheel
    Relative {
        /// Axis
        axis: RelAxis,
        /// Signed delta
        delta: i32,
    },
    /// Frame boundary (`SYN_REPORT`)
    Sync,
}

impl PointerEvent {
    /// Button press
    pub fn press(button: PointerButton) -> Self {
        PointerEvent::Button {
            button,
            pressed: true,
        }
    }

    /// Button release
    pub fn release(button: PointerButton) -> Self {
        PointerEvent::Button {
            button,
            pressed: false,
        }
    }

    /// Relative delta
    pub fn relative(axis: RelAxis, delta: i32) -> Self {
        PointerEvent::Relative { axis, delta }
    }
}

/// Virtual pointer the gesture machine drives
///
/// Opening an open device and closing a closed one are no-ops. Events sent
/// while closed are discarded.
pub trait PointerOutput: Send {
    /// Create the device
    fn open(&mut self) -> io::Result<()>;

    /// Destroy the device
    fn close(&mut self);

    /// Whether the device exists
    fn is_open(&self) -> bool;

    /// Write one event
    fn emit(&mut self, event: PointerEvent);
}

/// Virtual volume keys used for pass-through while the real keys are grabbed
#[cfg_attr(test, mockall::automock)]
pub trait ButtonOutput: Send {
    /// Emit a full press + release of `key`
    fn tap(&mut self, key: VolumeKey) -> io::Result<()>;
}
