//! Input Event Normalization
//!
//! Converts raw evdev records (type, code, value, timestamp) into the small
//! vocabulary the engine works with:
//!
//! - [`NormalizedEvent`] for the touch surface
//! - [`ButtonEvent`] for the volume keys
//! - [`SliderEvent`] for the three-position alert slider
//!
//! Touch translation is stateful: multitouch protocol B only reports
//! `ABS_MT_SLOT` when the slot changes, so the translator remembers which
//! slot subsequent contact and position events belong to.

use crate::engine::clock::Timestamp;
use crate::engine::codes::{abs, ev, key, syn};
use tracing::trace;

/// Surface axis of a positional sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Horizontal axis of the panel in its native orientation
    X,
    /// Vertical axis of the panel in its native orientation
    Y,
}

/// Kind of a normalized touch event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// First contact landed on the surface (`BTN_TOUCH` pressed)
    TouchDown,
    /// Last contact left the surface (`BTN_TOUCH` released)
    TouchUp,
    /// A slot acquired a contact (tracking id >= 0)
    ContactDown,
    /// A slot lost its contact (tracking id -1)
    ContactUp,
    /// Positional sample on `axis`
    ContactMove,
    /// End of an input frame
    Sync,
}

/// Touch event in engine vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedEvent {
    /// What happened
    pub kind: EventKind,
    /// Axis for [`EventKind::ContactMove`], `None` otherwise
    pub axis: Option<Axis>,
    /// Contact slot the event belongs to
    pub slot: i32,
    /// Position for moves, tracking id for contact events, 0 otherwise
    pub value: i32,
    /// Kernel timestamp
    pub timestamp: Timestamp,
}

impl NormalizedEvent {
    /// Surface touched
    pub fn touch_down(timestamp: Timestamp) -> Self {
        Self::bare(EventKind::TouchDown, timestamp)
    }

    /// Surface released
    pub fn touch_up(timestamp: Timestamp) -> Self {
        Self::bare(EventKind::TouchUp, timestamp)
    }

    /// Contact `tracking_id` started on `slot`
    pub fn contact_down(slot: i32, tracking_id: i32, timestamp: Timestamp) -> Self {
        Self {
            kind: EventKind::ContactDown,
            axis: None,
            slot,
            value: tracking_id,
            timestamp,
        }
    }

    /// Contact on `slot` ended
    pub fn contact_up(slot: i32, timestamp: Timestamp) -> Self {
        Self {
            kind: EventKind::ContactUp,
            axis: None,
            slot,
            value: -1,
            timestamp,
        }
    }

    /// Position sample for `slot`
    pub fn moved(slot: i32, axis: Axis, value: i32, timestamp: Timestamp) -> Self {
        Self {
            kind: EventKind::ContactMove,
            axis: Some(axis),
            slot,
            value,
            timestamp,
        }
    }

    /// Frame boundary
    pub fn sync(timestamp: Timestamp) -> Self {
        Self::bare(EventKind::Sync, timestamp)
    }

    fn bare(kind: EventKind, timestamp: Timestamp) -> Self {
        Self {
            kind,
            axis: None,
            slot: 0,
            value: 0,
            timestamp,
        }
    }
}

/// Undecoded evdev record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    /// `EV_*` type
    pub event_type: u16,
    /// Type-specific code
    pub code: u16,
    /// Event value
    pub value: i32,
    /// Kernel timestamp
    pub timestamp: Timestamp,
}

impl RawEvent {
    /// Build a raw record
    pub fn new(event_type: u16, code: u16, value: i32, timestamp: Timestamp) -> Self {
        Self {
            event_type,
            code,
            value,
            timestamp,
        }
    }
}

/// Which absolute axes carry contact positions on a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionSource {
    /// `ABS_MT_POSITION_X/Y`, per slot
    #[default]
    Multitouch,
    /// Legacy `ABS_X/Y`, always attributed to slot 0
    SingleTouch,
}

impl PositionSource {
    fn axis_for(self, code: u16) -> Option<Axis> {
        match (self, code) {
            (Self::Multitouch, abs::ABS_MT_POSITION_X) => Some(Axis::X),
            (Self::Multitouch, abs::ABS_MT_POSITION_Y) => Some(Axis::Y),
            (Self::SingleTouch, abs::ABS_X) => Some(Axis::X),
            (Self::SingleTouch, abs::ABS_Y) => Some(Axis::Y),
            _ => None,
        }
    }
}

/// Stateful translator for one touch surface
#[derive(Debug, Clone, Default)]
pub struct TouchTranslator {
    source: PositionSource,
    current_slot: i32,
}

impl TouchTranslator {
    /// Create a translator reading positions from `source`
    pub fn new(source: PositionSource) -> Self {
        Self {
            source,
            current_slot: 0,
        }
    }

    /// Slot that subsequent MT events refer to
    pub fn current_slot(&self) -> i32 {
        self.current_slot
    }

    /// Translate one raw record; `None` for anything the engine ignores
    pub fn translate(&mut self, raw: &RawEvent) -> Option<NormalizedEvent> {
        let ts = raw.timestamp;

        match (raw.event_type, raw.code) {
            (ev::EV_SYN, syn::SYN_REPORT) => Some(NormalizedEvent::sync(ts)),

            (ev::EV_KEY, key::BTN_TOUCH) => match raw.value {
                1 => Some(NormalizedEvent::touch_down(ts)),
                0 => Some(NormalizedEvent::touch_up(ts)),
                _ => None,
            },

            (ev::EV_ABS, abs::ABS_MT_SLOT) => {
                self.current_slot = raw.value;
                None
            }

            (ev::EV_ABS, abs::ABS_MT_TRACKING_ID) => {
                if raw.value >= 0 {
                    Some(NormalizedEvent::contact_down(
                        self.current_slot,
                        raw.value,
                        ts,
                    ))
                } else {
                    Some(NormalizedEvent::contact_up(self.current_slot, ts))
                }
            }

            (ev::EV_ABS, code) => {
                let axis = self.source.axis_for(code)?;
                let slot = match self.source {
                    PositionSource::Multitouch => self.current_slot,
                    PositionSource::SingleTouch => 0,
                };
                Some(NormalizedEvent::moved(slot, axis, raw.value, ts))
            }

            _ => {
                trace!(
                    "Dropping touch event type={} code={} value={}",
                    raw.event_type,
                    raw.code,
                    raw.value
                );
                None
            }
        }
    }
}

/// Physical volume key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolumeKey {
    /// `KEY_VOLUMEUP`
    Up,
    /// `KEY_VOLUMEDOWN`
    Down,
}

impl VolumeKey {
    /// Map a Linux key code back to a volume key
    pub fn from_linux_key(code: u16) -> Option<Self> {
        match code {
            key::KEY_VOLUMEUP => Some(VolumeKey::Up),
            key::KEY_VOLUMEDOWN => Some(VolumeKey::Down),
            _ => None,
        }
    }
}

/// Press or release of a volume key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent {
    /// Which key
    pub key: VolumeKey,
    /// `true` on press, `false` on release
    pub pressed: bool,
    /// Kernel timestamp
    pub timestamp: Timestamp,
}

impl ButtonEvent {
    /// Decode a raw record; autorepeat (value 2) is dropped
    pub fn from_raw(raw: &RawEvent) -> Option<Self> {
        if raw.event_type != ev::EV_KEY {
            return None;
        }
        let key = VolumeKey::from_linux_key(raw.code)?;
        let pressed = match raw.value {
            1 => true,
            0 => false,
            _ => return None,
        };
        Some(Self {
            key,
            pressed,
            timestamp: raw.timestamp,
        })
    }
}

/// Alert slider moved to a new position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliderEvent {
    /// Reported position (0, 1, 2 on known hardware)
    pub position: i32,
}

impl SliderEvent {
    /// Decode a raw record
    pub fn from_raw(raw: &RawEvent) -> Option<Self> {
        (raw.event_type == ev::EV_ABS && raw.code == abs::ABS_SLIDER).then_some(Self {
            position: raw.value,
        })
    }
}
