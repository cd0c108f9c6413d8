//! Linux input event codes
//!
//! The subset of `linux/input-event-codes.h` the engine reads. Kept as plain
//! integers so the engine can be driven without a kernel device; the device
//! layer writes through evdev's typed codes.

#![allow(missing_docs)]

/// Event types
pub mod ev {
    pub const EV_SYN: u16 = 0x00;
    pub const EV_KEY: u16 = 0x01;
    pub const EV_REL: u16 = 0x02;
    pub const EV_ABS: u16 = 0x03;
}

/// Synchronization codes
pub mod syn {
    pub const SYN_REPORT: u16 = 0;
}

/// Key and button codes
pub mod key {
    pub const KEY_VOLUMEDOWN: u16 = 114;
    pub const KEY_VOLUMEUP: u16 = 115;
    pub const BTN_TOUCH: u16 = 0x14a;
}

/// Absolute axes
pub mod abs {
    pub const ABS_X: u16 = 0x00;
    pub const ABS_Y: u16 = 0x01;
    /// Three-position alert slider (vendor code, not in the upstream header)
    pub const ABS_SLIDER: u16 = 34;
    pub const ABS_MT_SLOT: u16 = 0x2f;
    pub const ABS_MT_POSITION_X: u16 = 0x35;
    pub const ABS_MT_POSITION_Y: u16 = 0x36;
    pub const ABS_MT_TRACKING_ID: u16 = 0x39;
}
