//! Action Dispatcher
//!
//! Discrete commands triggered by the volume keys and the alert slider, and
//! the collaborator seams they act on.
//!
//! # Mode switching
//!
//! | Action                              | Touch surface | Pointer | Keyboard                      |
//! |-------------------------------------|---------------|---------|-------------------------------|
//! | `enable-touchpad`                   | grabbed       | open    | disabled                      |
//! | `disable-touchpad-toggle-keyboard`  | released      | closed  | toggled if already disabled   |
//! | `disable-touchpad-enable-keyboard`  | released      | closed  | enabled if already disabled   |
//! | `disable-touchpad-disable-keyboard` | released      | closed  | disabled if already disabled  |
//!
//! The first disable from touchpad mode only leaves touchpad mode; the
//! keyboard is changed by a disable issued while already out of it.

use crate::engine::buttons::PressKind;
use crate::engine::event::VolumeKey;
use crate::engine::output::{ButtonOutput, PointerOutput};
use crate::engine::rotation::RotationHandle;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Command a button or slider can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    /// Enter touchpad mode
    EnableTouchpad,
    /// Leave touchpad mode; toggle the on-screen keyboard
    DisableTouchpadToggleKeyboard,
    /// Leave touchpad mode; enable the on-screen keyboard
    DisableTouchpadEnableKeyboard,
    /// Leave touchpad mode; disable the on-screen keyboard
    DisableTouchpadDisableKeyboard,
    /// Terminate the process
    Close,
    /// Pass a volume-up tap through to the system
    EmitVolumeUp,
    /// Pass a volume-down tap through to the system
    EmitVolumeDown,
    /// Advance the rotation by 90°
    ChangeOrientation,
    /// Ignore the press
    DoNothing,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionKind::EnableTouchpad => "enable-touchpad",
            ActionKind::DisableTouchpadToggleKeyboard => "disable-touchpad-toggle-keyboard",
            ActionKind::DisableTouchpadEnableKeyboard => "disable-touchpad-enable-keyboard",
            ActionKind::DisableTouchpadDisableKeyboard => "disable-touchpad-disable-keyboard",
            ActionKind::Close => "close",
            ActionKind::EmitVolumeUp => "emit-volume-up",
            ActionKind::EmitVolumeDown => "emit-volume-down",
            ActionKind::ChangeOrientation => "change-orientation",
            ActionKind::DoNothing => "do-nothing",
        };
        f.write_str(name)
    }
}

/// Actions for one physical button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonActions {
    /// Quick press
    pub click: ActionKind,
    /// Held past the short threshold
    pub short_hold: ActionKind,
    /// Held past the long threshold
    pub long_hold: ActionKind,
}

impl ButtonActions {
    /// Action for a classified press
    pub fn action(&self, kind: PressKind) -> ActionKind {
        match kind {
            PressKind::Click => self.click,
            PressKind::ShortHold => self.short_hold,
            PressKind::LongHold => self.long_hold,
        }
    }

    /// Default wiring of the volume-up key
    pub fn volume_up_defaults() -> Self {
        Self {
            click: ActionKind::EmitVolumeUp,
            short_hold: ActionKind::EnableTouchpad,
            long_hold: ActionKind::Close,
        }
    }

    /// Default wiring of the volume-down key
    pub fn volume_down_defaults() -> Self {
        Self {
            click: ActionKind::EmitVolumeDown,
            short_hold: ActionKind::DisableTouchpadToggleKeyboard,
            long_hold: ActionKind::Close,
        }
    }
}

/// Button → action wiring, fixed after startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTable {
    /// Volume-up key
    pub volume_up: ButtonActions,
    /// Volume-down key
    pub volume_down: ButtonActions,
}

impl Default for ActionTable {
    fn default() -> Self {
        Self {
            volume_up: ButtonActions::volume_up_defaults(),
            volume_down: ButtonActions::volume_down_defaults(),
        }
    }
}

impl ActionTable {
    /// Action for a classified press of `key`
    pub fn lookup(&self, key: VolumeKey, kind: PressKind) -> ActionKind {
        match key {
            VolumeKey::Up => self.volume_up.action(kind),
            VolumeKey::Down => self.volume_down.action(kind),
        }
    }

    /// Rewire for manual rotation when no orientation sensor is available
    ///
    /// The volume-up long hold becomes [`ActionKind::ChangeOrientation`].
    /// Without a volume-up key the table is left alone.
    pub fn with_manual_rotation(mut self, capabilities: &Capabilities) -> Self {
        if capabilities.has_key(VolumeKey::Up) {
            self.volume_up.long_hold = ActionKind::ChangeOrientation;
        }
        self
    }
}

/// Optional input sources present on this device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// A volume-up key was found
    pub volume_up: bool,
    /// A volume-down key was found
    pub volume_down: bool,
    /// An alert slider was found
    pub slider: bool,
}

impl Capabilities {
    /// Whether `key` exists on this device
    pub fn has_key(&self, key: VolumeKey) -> bool {
        match key {
            VolumeKey::Up => self.volume_up,
            VolumeKey::Down => self.volume_down,
        }
    }
}

/// Exclusive access to the physical touch surface
#[cfg_attr(test, mockall::automock)]
pub trait SurfaceGrab: Send {
    /// Take exclusive access so the compositor stops seeing touches
    fn grab(&mut self) -> io::Result<()>;

    /// Hand the surface back
    fn release(&mut self) -> io::Result<()>;
}

/// On-screen keyboard switch
#[cfg_attr(test, mockall::automock)]
pub trait KeyboardControl: Send {
    /// Enable or disable the on-screen keyboard
    fn set_enabled(&mut self, enabled: bool) -> io::Result<()>;
}

/// Process-wide termination request
#[derive(Debug, Clone, Default)]
pub struct CloseSignal(Arc<AtomicBool>);

impl CloseSignal {
    /// Create an unset signal
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the main loop to exit
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether termination was requested
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Executes [`ActionKind`]s against the collaborators
pub struct ActionDispatcher {
    buttons: Box<dyn ButtonOutput>,
    surface: Box<dyn SurfaceGrab>,
    keyboard: Box<dyn KeyboardControl>,
    rotation: RotationHandle,
    close: CloseSignal,
    touchpad_enabled: bool,
    keyboard_enabled: bool,
}

impl ActionDispatcher {
    /// Create a dispatcher in keyboard mode (touchpad off, keyboard on)
    pub fn new(
        buttons: Box<dyn ButtonOutput>,
        surface: Box<dyn SurfaceGrab>,
        keyboard: Box<dyn KeyboardControl>,
        rotation: RotationHandle,
        close: CloseSignal,
    ) -> Self {
        Self {
            buttons,
            surface,
            keyboard,
            rotation,
            close,
            touchpad_enabled: false,
            keyboard_enabled: true,
        }
    }

    /// Whether touch input is being turned into pointer output
    pub fn touchpad_enabled(&self) -> bool {
        self.touchpad_enabled
    }

    /// Last state requested of the on-screen keyboard
    pub fn keyboard_enabled(&self) -> bool {
        self.keyboard_enabled
    }

    /// Shared rotation state
    pub fn rotation(&self) -> &RotationHandle {
        &self.rotation
    }

    /// Termination flag
    pub fn close_signal(&self) -> &CloseSignal {
        &self.close
    }

    /// Run one action
    pub fn execute(&mut self, action: ActionKind, pointer: &mut dyn PointerOutput) {
        debug!("Dispatching action: {}", action);

        match action {
            ActionKind::EnableTouchpad => self.enable_touchpad(pointer),
            ActionKind::DisableTouchpadToggleKeyboard => {
                self.disable_touchpad(Some(!self.keyboard_enabled), pointer)
            }
            ActionKind::DisableTouchpadEnableKeyboard => self.disable_touchpad(Some(true), pointer),
            ActionKind::DisableTouchpadDisableKeyboard => {
                self.disable_touchpad(Some(false), pointer)
            }
            ActionKind::Close => {
                info!("Close requested");
                self.close.request();
            }
            ActionKind::EmitVolumeUp => self.tap(VolumeKey::Up),
            ActionKind::EmitVolumeDown => self.tap(VolumeKey::Down),
            ActionKind::ChangeOrientation => {
                let rotation = self.rotation.advance();
                info!("Orientation changed to {}", rotation);
            }
            ActionKind::DoNothing => {}
        }
    }

    /// Leave touchpad mode and hand the keyboard back
    ///
    /// Used on exit so the device is left the way it was found.
    pub fn shutdown(&mut self, pointer: &mut dyn PointerOutput) {
        if self.touchpad_enabled {
            self.disable_touchpad(None, pointer);
        } else {
            pointer.close();
        }
        self.set_keyboard(true);
    }

    fn enable_touchpad(&mut self, pointer: &mut dyn PointerOutput) {
        if self.touchpad_enabled {
            return;
        }

        if let Err(e) = self.surface.grab() {
            error!("Failed to grab touch surface: {}", e);
        }
        self.touchpad_enabled = true;
        if let Err(e) = pointer.open() {
            error!("Failed to create virtual pointer: {}", e);
        }
        self.set_keyboard(false);

        info!("Touchpad mode enabled");
    }

    fn disable_touchpad(&mut self, keyboard: Option<bool>, pointer: &mut dyn PointerOutput) {
        if !self.touchpad_enabled {
            if let Some(enabled) = keyboard {
                self.set_keyboard(enabled);
            }
        }

        if let Err(e) = self.surface.release() {
            warn!("Failed to release touch surface: {}", e);
        }
        let was_enabled = std::mem::replace(&mut self.touchpad_enabled, false);
        pointer.close();

        if was_enabled {
            info!("Touchpad mode disabled");
        }
    }

    fn set_keyboard(&mut self, enabled: bool) {
        match self.keyboard.set_enabled(enabled) {
            Ok(()) => debug!(
                "On-screen keyboard {}",
                if enabled { "enabled" } else { "disabled" }
            ),
            Err(e) => warn!("Failed to switch on-screen keyboard: {}", e),
        }
        self.keyboard_enabled = enabled;
    }

    fn tap(&mut self, key: VolumeKey) {
        if let Err(e) = self.buttons.tap(key) {
            warn!("Failed to pass {:?} through: {}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::output::testing::RecordingPointer;
    use crate::engine::output::MockButtonOutput;
    use crate::engine::rotation::{Rotation, RotationSource};
    use mockall::predicate::eq;
    use mockall::Sequence;

    fn permissive_surface() -> Box<dyn SurfaceGrab> {
        let mut surface = MockSurfaceGrab::new();
        surface.expect_grab().returning(|| Ok(()));
        surface.expect_release().returning(|| Ok(()));
        Box::new(surface)
    }

    fn permissive_keyboard() -> Box<dyn KeyboardControl> {
        let mut keyboard = MockKeyboardControl::new();
        keyboard.expect_set_enabled().returning(|_| Ok(()));
        Box::new(keyboard)
    }

    fn dispatcher_with(
        buttons: Box<dyn ButtonOutput>,
        surface: Box<dyn SurfaceGrab>,
        keyboard: Box<dyn KeyboardControl>,
    ) -> ActionDispatcher {
        ActionDispatcher::new(
            buttons,
            surface,
            keyboard,
            RotationHandle::new(Rotation::Deg0, RotationSource::Manual),
            CloseSignal::new(),
        )
    }

    #[test]
    fn test_action_kind_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            action: ActionKind,
        }

        let parsed: Wrapper =
            toml::from_str("action = \"disable-touchpad-toggle-keyboard\"").unwrap();
        assert_eq!(parsed.action, ActionKind::DisableTouchpadToggleKeyboard);
        assert_eq!(
            ActionKind::DisableTouchpadToggleKeyboard.to_string(),
            "disable-touchpad-toggle-keyboard"
        );
        assert_eq!(ActionKind::ChangeOrientation.to_string(), "change-orientation");
    }

    #[test]
    fn test_default_table() {
        let table = ActionTable::default();
        assert_eq!(
            table.lookup(VolumeKey::Up, PressKind::Click),
            ActionKind::EmitVolumeUp
        );
        assert_eq!(
            table.lookup(VolumeKey::Up, PressKind::ShortHold),
            ActionKind::EnableTouchpad
        );
        assert_eq!(
            table.lookup(VolumeKey::Down, PressKind::ShortHold),
            ActionKind::DisableTouchpadToggleKeyboard
        );
        assert_eq!(
            table.lookup(VolumeKey::Down, PressKind::LongHold),
            ActionKind::Close
        );
    }

    #[test]
    fn test_manual_rotation_rewires_volume_up_long_hold() {
        let caps = Capabilities {
            volume_up: true,
            volume_down: true,
            slider: false,
        };
        let table = ActionTable::default().with_manual_rotation(&caps);
        assert_eq!(
            table.lookup(VolumeKey::Up, PressKind::LongHold),
            ActionKind::ChangeOrientation
        );
        assert_eq!(
            table.lookup(VolumeKey::Down, PressKind::LongHold),
            ActionKind::Close
        );

        let no_up = Capabilities {
            volume_up: false,
            ..caps
        };
        assert_eq!(ActionTable::default().with_manual_rotation(&no_up), ActionTable::default());
    }

    #[test]
    fn test_enable_grabs_opens_and_hides_keyboard() {
        let mut seq = Sequence::new();
        let mut surface = MockSurfaceGrab::new();
        surface
            .expect_grab()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        let mut keyboard = MockKeyboardControl::new();
        keyboard
            .expect_set_enabled()
            .with(eq(false))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let mut dispatcher = dispatcher_with(
            Box::new(MockButtonOutput::new()),
            Box::new(surface),
            Box::new(keyboard),
        );
        let mut pointer = RecordingPointer::default();

        dispatcher.execute(ActionKind::EnableTouchpad, &mut pointer);
        assert!(dispatcher.touchpad_enabled());
        assert!(!dispatcher.keyboard_enabled());
        assert!(pointer.is_open());

        // Already enabled: no second grab
        dispatcher.execute(ActionKind::EnableTouchpad, &mut pointer);
    }

    #[test]
    fn test_first_disable_only_leaves_touchpad_mode() {
        let mut keyboard = MockKeyboardControl::new();
        // Only the enable call touches the keyboard
        keyboard
            .expect_set_enabled()
            .with(eq(false))
            .times(1)
            .returning(|_| Ok(()));

        let mut dispatcher = dispatcher_with(
            Box::new(MockButtonOutput::new()),
            permissive_surface(),
            Box::new(keyboard),
        );
        let mut pointer = RecordingPointer::default();

        dispatcher.execute(ActionKind::EnableTouchpad, &mut pointer);
        dispatcher.execute(ActionKind::DisableTouchpadEnableKeyboard, &mut pointer);

        assert!(!dispatcher.touchpad_enabled());
        assert!(!dispatcher.keyboard_enabled());
        assert!(!pointer.is_open());
    }

    #[test]
    fn test_toggle_while_disabled_flips_keyboard() {
        let mut seq = Sequence::new();
        let mut keyboard = MockKeyboardControl::new();
        keyboard
            .expect_set_enabled()
            .with(eq(false))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        keyboard
            .expect_set_enabled()
            .with(eq(true))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let mut dispatcher = dispatcher_with(
            Box::new(MockButtonOutput::new()),
            permissive_surface(),
            Box::new(keyboard),
        );
        let mut pointer = RecordingPointer::default();

        // Starts in keyboard mode with the keyboard on
        dispatcher.execute(ActionKind::DisableTouchpadToggleKeyboard, &mut pointer);
        assert!(!dispatcher.keyboard_enabled());
        dispatcher.execute(ActionKind::DisableTouchpadToggleKeyboard, &mut pointer);
        assert!(dispatcher.keyboard_enabled());
    }

    #[test]
    fn test_volume_pass_through() {
        let mut buttons = MockButtonOutput::new();
        buttons
            .expect_tap()
            .with(eq(VolumeKey::Up))
            .times(1)
            .returning(|_| Ok(()));
        buttons
            .expect_tap()
            .with(eq(VolumeKey::Down))
            .times(1)
            .returning(|_| Err(io::Error::new(io::ErrorKind::Other, "gone")));

        let mut dispatcher =
            dispatcher_with(Box::new(buttons), permissive_surface(), permissive_keyboard());
        let mut pointer = RecordingPointer::default();

        dispatcher.execute(ActionKind::EmitVolumeUp, &mut pointer);
        // Errors are logged, not propagated
        dispatcher.execute(ActionKind::EmitVolumeDown, &mut pointer);
    }

    #[test]
    fn test_close_and_orientation() {
        let mut dispatcher = dispatcher_with(
            Box::new(MockButtonOutput::new()),
            permissive_surface(),
            permissive_keyboard(),
        );
        let mut pointer = RecordingPointer::default();
        let close = dispatcher.close_signal().clone();

        for expected in [
            Rotation::Deg90,
            Rotation::Deg180,
            Rotation::Deg270,
            Rotation::Deg0,
        ] {
            dispatcher.execute(ActionKind::ChangeOrientation, &mut pointer);
            assert_eq!(dispatcher.rotation().get(), expected);
        }

        assert!(!close.is_requested());
        dispatcher.execute(ActionKind::Close, &mut pointer);
        assert!(close.is_requested());

        dispatcher.execute(ActionKind::DoNothing, &mut pointer);
        assert!(!dispatcher.touchpad_enabled());
    }

    #[test]
    fn test_shutdown_restores_keyboard() {
        let mut dispatcher = dispatcher_with(
            Box::new(MockButtonOutput::new()),
            permissive_surface(),
            permissive_keyboard(),
        );
        let mut pointer = RecordingPointer::default();

        dispatcher.execute(ActionKind::EnableTouchpad, &mut pointer);
        dispatcher.shutdown(&mut pointer);

        assert!(!dispatcher.touchpad_enabled());
        assert!(dispatcher.keyboard_enabled());
        assert!(!pointer.is_open());
    }
}
