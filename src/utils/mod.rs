//! Utility Functions and Diagnostics
//!
//! System diagnostics and user-friendly error formatting.
//!
//! ## Diagnostics
//!
//! The [`diagnostics`] module logs what the emulator is running on:
//!
//! ```rust
//! use touchpad_emulator::utils::{uinput_available, SystemInfo};
//!
//! let sys_info = SystemInfo::gather();
//! sys_info.log();  // Logs: OS, kernel, hostname
//!
//! if !uinput_available() {
//!     eprintln!("load the uinput module first");
//! }
//! ```
//!
//! ## Error Formatting
//!
//! The [`errors`] module turns setup failures into troubleshooting hints:
//!
//! ```rust
//! use touchpad_emulator::utils::format_user_error;
//!
//! let error = anyhow::anyhow!("Failed to parse config file");
//! eprintln!("{}", format_user_error(&error));
//! ```
//!
//! Error categories with context-aware help:
//! - Input device permissions → root or the `input` group
//! - uinput → module loading, udev rule
//! - No devices → writing a device profile
//! - Orientation sensor → iio-sensor-proxy, `--rotation`
//! - Config errors → syntax, action names

pub mod diagnostics;
pub mod errors;

// Re-export key types
pub use diagnostics::{
    detect_desktop, log_startup_diagnostics, uinput_available, RuntimeStats, SystemInfo,
};
pub use errors::format_user_error;
