//! Button Hold Classifier
//!
//! Turns a press/release pair on a volume key into a [`PressKind`], and the
//! three-position slider into the mode it selects.

use crate::engine::actions::ActionKind;
use crate::engine::clock::Timestamp;
use crate::engine::event::{ButtonEvent, VolumeKey};
use std::collections::HashMap;
use tracing::trace;

/// Hold longer than this (µs) is a short hold
pub const SHORT_HOLD_US: u64 = 500_000;

/// Hold longer than this (µs) is a long hold
pub const LONG_HOLD_US: u64 = 4_000_000;

/// How long a button was held
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PressKind {
    /// Up to [`SHORT_HOLD_US`]
    Click,
    /// Over [`SHORT_HOLD_US`], up to [`LONG_HOLD_US`]
    ShortHold,
    /// Over [`LONG_HOLD_US`]
    LongHold,
}

impl PressKind {
    /// Classify a hold duration in microseconds
    ///
    /// Both boundaries are exclusive: a hold of exactly 500 000 µs is still a
    /// click.
    pub fn classify(held_us: u64) -> Self {
        if held_us > LONG_HOLD_US {
            PressKind::LongHold
        } else if held_us > SHORT_HOLD_US {
            PressKind::ShortHold
        } else {
            PressKind::Click
        }
    }
}

/// Per-key press tracking
#[derive(Debug, Default)]
pub struct ButtonHoldClassifier {
    pressed_at: HashMap<VolumeKey, Timestamp>,
}

impl ButtonHoldClassifier {
    /// Create a classifier with no key held
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a key edge; returns the classification on release
    ///
    /// A release without a recorded press yields nothing.
    pub fn handle(&mut self, event: &ButtonEvent) -> Option<PressKind> {
        if event.pressed {
            self.pressed_at.insert(event.key, event.timestamp);
            return None;
        }

        let pressed_at = self.pressed_at.remove(&event.key)?;
        let held = event.timestamp.micros_since(pressed_at).unwrap_or(0);
        let kind = PressKind::classify(held);
        trace!("{:?} held {} µs -> {:?}", event.key, held, kind);
        Some(kind)
    }

    /// Whether `key` is currently down
    pub fn is_pressed(&self, key: VolumeKey) -> bool {
        self.pressed_at.contains_key(&key)
    }
}

/// Mode selected by the alert slider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliderPosition {
    /// Top: touchpad on
    Top,
    /// Middle: touchpad off, keyboard off
    Middle,
    /// Bottom: touchpad off, keyboard on
    Bottom,
}

impl SliderPosition {
    /// Map a raw `ABS_SLIDER` value
    pub fn from_value(value: i32) -> Option<Self> {
        match value {
            0 => Some(SliderPosition::Top),
            1 => Some(SliderPosition::Middle),
            2 => Some(SliderPosition::Bottom),
            _ => None,
        }
    }

    /// Action establishing this position's mode
    pub fn action(self) -> ActionKind {
        match self {
            SliderPosition::Top => ActionKind::EnableTouchpad,
            SliderPosition::Middle => ActionKind::DisableTouchpadDisableKeyboard,
            SliderPosition::Bottom => ActionKind::DisableTouchpadEnableKeyboard,
        }
    }
}
