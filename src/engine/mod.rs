//! Touchpad Emulation Engine
//!
//! The stateful core: consumes normalized touch, button and slider events
//! and produces virtual pointer output and mode changes.
//!
//! # Architecture
//!
//! ```text
//! touch events ──► GestureMachine ──(RotationHandle)──► PointerOutput
//!                       ▲
//!                       │ hold_drag_expired
//!                  HoldDragTimer
//!
//! button events ─► ButtonHoldClassifier ─► ActionTable ─► ActionDispatcher
//! slider events ─► SliderPosition ─────────────────────►      │
//!                                                             ├─► SurfaceGrab
//!                                                             ├─► KeyboardControl
//!                                                             ├─► ButtonOutput
//!                                                             ├─► RotationHandle
//!                                                             └─► CloseSignal
//! ```
//!
//! Everything the engine touches lives in one [`Engine`] value. The main
//! loop and the hold-to-drag timer thread share it as a [`SharedEngine`];
//! both take the same lock, so a timer expiry and a cancellation can never
//! interleave.
//!
//! # Example
//!
//! ```ignore
//! let engine = Engine::shared(settings, collaborators)?;
//! engine.lock().initialize(slider_position);
//!
//! for event in touch_events {
//!     engine.lock().handle_touch(&event);
//! }
//! ```

pub mod actions;
pub mod buttons;
pub mod clock;
pub mod codes;
pub mod contacts;
pub mod event;
pub mod gesture;
pub mod hold_timer;
pub mod output;
pub mod rotation;

pub use actions::{
    ActionDispatcher, ActionKind, ActionTable, ButtonActions, Capabilities, CloseSignal,
    KeyboardControl, SurfaceGrab,
};
pub use buttons::{ButtonHoldClassifier, PressKind, SliderPosition};
pub use clock::Timestamp;
pub use event::{
    Axis, ButtonEvent, EventKind, NormalizedEvent, PositionSource, RawEvent, SliderEvent,
    TouchTranslator, VolumeKey,
};
pub use gesture::{GestureMachine, TouchSession};
pub use hold_timer::{HoldDragTimer, HoldTicket, ThreadHoldTimer};
pub use output::{ButtonOutput, PointerButton, PointerEvent, PointerOutput, RelAxis};
pub use rotation::{Rotation, RotationHandle, RotationSource, SurfaceGeometry};

use parking_lot::Mutex;
use std::sync::{Arc, OnceLock, Weak};
use tracing::{debug, info, warn};

/// Engine shared between the main loop and the hold timer thread
pub type SharedEngine = Arc<Mutex<Engine>>;

/// Fixed parameters of an engine instance
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Touch surface maxima
    pub geometry: SurfaceGeometry,
    /// Button wiring
    pub actions: ActionTable,
    /// Which optional sources exist
    pub capabilities: Capabilities,
    /// Shared rotation state
    pub rotation: RotationHandle,
    /// Termination flag
    pub close: CloseSignal,
}

/// Output and system collaborators
pub struct Collaborators {
    /// Virtual pointer
    pub pointer: Box<dyn PointerOutput>,
    /// Virtual volume keys
    pub buttons: Box<dyn ButtonOutput>,
    /// Touch surface grab
    pub surface: Box<dyn SurfaceGrab>,
    /// On-screen keyboard switch
    pub keyboard: Box<dyn KeyboardControl>,
}

/// Engine context
pub struct Engine {
    gesture: GestureMachine,
    dispatcher: ActionDispatcher,
    classifier: ButtonHoldClassifier,
    actions: ActionTable,
    pointer: Box<dyn PointerOutput>,
}

impl Engine {
    /// Create an engine in keyboard mode
    ///
    /// Without an orientation sensor ([`RotationSource::Manual`]) the
    /// volume-up long hold is rewired to rotate the touchpad.
    ///
    /// Call [`Engine::initialize`] before feeding events.
    pub fn new(
        settings: EngineSettings,
        collaborators: Collaborators,
        timer: Box<dyn HoldDragTimer>,
    ) -> Self {
        let Collaborators {
            pointer,
            buttons,
            surface,
            keyboard,
        } = collaborators;

        let actions = if settings.rotation.source() == RotationSource::Manual {
            let actions = settings.actions.with_manual_rotation(&settings.capabilities);
            if actions != settings.actions {
                info!("Volume-up long hold now rotates the touchpad");
            }
            actions
        } else {
            settings.actions
        };

        Self {
            gesture: GestureMachine::new(settings.geometry, timer),
            dispatcher: ActionDispatcher::new(
                buttons,
                surface,
                keyboard,
                settings.rotation,
                settings.close,
            ),
            classifier: ButtonHoldClassifier::new(),
            actions,
            pointer,
        }
    }

    /// Create a shared engine driven by a [`ThreadHoldTimer`]
    pub fn shared(
        settings: EngineSettings,
        collaborators: Collaborators,
    ) -> std::io::Result<SharedEngine> {
        let slot: Arc<OnceLock<Weak<Mutex<Engine>>>> = Arc::new(OnceLock::new());

        let timer = ThreadHoldTimer::spawn({
            let slot = Arc::clone(&slot);
            Box::new(move |ticket: HoldTicket| {
                if let Some(engine) = slot.get().and_then(Weak::upgrade) {
                    engine.lock().hold_drag_expired(ticket);
                }
            })
        })?;

        let engine = Arc::new(Mutex::new(Engine::new(
            settings,
            collaborators,
            Box::new(timer),
        )));
        // Only fails if already set, and nothing else can see the slot
        let _ = slot.set(Arc::downgrade(&engine));

        Ok(engine)
    }

    /// Establish the starting mode
    ///
    /// With a slider the mode follows its position; without one the engine
    /// starts in touchpad mode.
    pub fn initialize(&mut self, slider: Option<i32>) {
        match slider {
            Some(value) => match SliderPosition::from_value(value) {
                Some(position) => {
                    info!("Initial slider position: {:?}", position);
                    self.dispatch(position.action());
                }
                None => warn!("Unknown slider position {}; staying in keyboard mode", value),
            },
            None => self.dispatch(ActionKind::EnableTouchpad),
        }
    }

    /// Process one touch surface event
    pub fn handle_touch(&mut self, event: &NormalizedEvent) {
        if !self.dispatcher.touchpad_enabled() {
            self.gesture.force_idle();
            return;
        }

        let rotation = self.dispatcher.rotation().get();
        self.gesture.handle(event, rotation, self.pointer.as_mut());
    }

    /// Process one volume key edge
    pub fn handle_button(&mut self, event: &ButtonEvent) {
        if let Some(kind) = self.classifier.handle(event) {
            let action = self.actions.lookup(event.key, kind);
            debug!("{:?} {:?} -> {}", event.key, kind, action);
            self.dispatch(action);
        }
    }

    /// Process a slider position change
    pub fn handle_slider(&mut self, event: &SliderEvent) {
        match SliderPosition::from_value(event.position) {
            Some(position) => {
                debug!("Slider moved to {:?}", position);
                self.dispatch(position.action());
            }
            None => warn!("Ignoring unknown slider position {}", event.position),
        }
    }

    /// Run an action immediately
    pub fn dispatch(&mut self, action: ActionKind) {
        self.dispatcher.execute(action, self.pointer.as_mut());
        if !self.dispatcher.touchpad_enabled() {
            self.gesture.force_idle();
        }
    }

    /// Hold timer expiry; returns whether a drag started
    pub fn hold_drag_expired(&mut self, ticket: HoldTicket) -> bool {
        if !self.dispatcher.touchpad_enabled() {
            return false;
        }
        self.gesture.hold_drag_expired(ticket, self.pointer.as_mut())
    }

    /// Leave touchpad mode and restore the keyboard
    pub fn shutdown(&mut self) {
        info!("Restoring input devices");
        self.gesture.force_idle();
        self.dispatcher.shutdown(self.pointer.as_mut());
    }

    /// Whether touch input drives the pointer
    pub fn touchpad_enabled(&self) -> bool {
        self.dispatcher.touchpad_enabled()
    }

    /// Last requested on-screen keyboard state
    pub fn keyboard_enabled(&self) -> bool {
        self.dispatcher.keyboard_enabled()
    }

    /// Current rotation
    pub fn rotation(&self) -> Rotation {
        self.dispatcher.rotation().get()
    }

    /// Current touch state
    pub fn session(&self) -> &TouchSession {
        self.gesture.session()
    }

    /// Fingers as seen by gesture classification
    pub fn finger_count(&self) -> usize {
        self.gesture.finger_count()
    }

    /// Whether termination was requested
    pub fn close_requested(&self) -> bool {
        self.dispatcher.close_signal().is_requested()
    }
}
