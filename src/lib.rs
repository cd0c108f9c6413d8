//! # touchpad-emulator
//!
//! Turns a phone or tablet touchscreen into a laptop-style touchpad.
//!
//! Touch input is grabbed from the kernel, interpreted as touchpad gestures
//! and replayed through a uinput relative pointer. Volume keys (and the
//! alert slider where present) switch between touchpad and normal touch
//! mode.
//!
//! # Architecture
//!
//! ```text
//! touchpad-emulator
//!   ├─> Device discovery (profiles, capability scan)
//!   ├─> Orientation monitor (iio-sensor-proxy over D-Bus)
//!   ├─> Input loop (poll over touch surface, keys, slider)
//!   ├─> Engine (gestures, hold classification, actions)
//!   └─> Virtual devices (pointer, volume key pass-through)
//! ```
//!
//! # Gestures
//!
//! | Input                           | Output                 |
//! |---------------------------------|------------------------|
//! | one finger moving               | pointer motion         |
//! | one-finger tap                  | left click             |
//! | two-finger tap                  | right click            |
//! | two fingers moving              | wheel scroll           |
//! | tap then touch again            | drag                   |
//! | press and hold still for 1 s    | drag                   |
//!
//! # Data Flow
//!
//! **Touch Path:** evdev → TouchTranslator → GestureMachine → VirtualPointer
//!
//! **Button Path:** evdev → ButtonHoldClassifier → ActionTable → ActionDispatcher

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Configuration loading
pub mod config;

/// Kernel input devices and uinput outputs
pub mod device;

/// Gesture and mode engine
///
/// Pure state machines plus the collaborator traits they drive. Nothing in
/// here touches a device node.
pub mod engine;

/// Screen orientation tracking
pub mod orientation;

/// Process lifecycle and the input loop
pub mod runtime;

/// Utility functions
pub mod utils;

pub use config::Config;
pub use runtime::TouchpadEmulator;
