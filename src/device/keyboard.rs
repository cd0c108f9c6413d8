//! On-Screen Keyboard Control
//!
//! The GNOME screen keyboard pops up whenever a text field gets touch focus,
//! which covers half the screen in touchpad mode. It is switched through
//! `gsettings`.

use crate::engine::KeyboardControl;
use std::io;
use std::process::Command;
use tracing::trace;

const SCHEMA: &str = "org.gnome.desktop.a11y.applications";
const KEY: &str = "screen-keyboard-enabled";

/// [`KeyboardControl`] through `gsettings`
#[derive(Debug, Clone)]
pub struct GsettingsKeyboard {
    program: String,
}

impl GsettingsKeyboard {
    /// Use `gsettings` from `PATH`
    pub fn new() -> Self {
        Self::with_program("gsettings")
    }

    /// Use a specific executable
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn args(enabled: bool) -> [&'static str; 4] {
        ["set", SCHEMA, KEY, if enabled { "true" } else { "false" }]
    }
}

impl Default for GsettingsKeyboard {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyboardControl for GsettingsKeyboard {
    fn set_enabled(&mut self, enabled: bool) -> io::Result<()> {
        let args = Self::args(enabled);
        trace!("Running {} {}", self.program, args.join(" "));

        let status = Command::new(&self.program).args(args).status()?;
        if status.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!(
                "{} exited with {}",
                self.program, status
            )))
        }
    }
}

/// [`KeyboardControl`] that leaves the keyboard alone
#[derive(Debug, Clone, Copy, Default)]
pub struct UnmanagedKeyboard;

impl KeyboardControl for UnmanagedKeyboard {
    fn set_enabled(&mut self, _enabled: bool) -> io::Result<()> {
        Ok(())
    }
}
