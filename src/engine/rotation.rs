//! Rotation Mapping
//!
//! Maps raw panel coordinates into the user's current orientation.
//!
//! # Rules
//!
//! | Degrees | Mirror X | Mirror Y | raw X drives | raw Y drives | scroll axis |
//! |---------|----------|----------|--------------|--------------|-------------|
//! | 0       | no       | no       | `REL_X`      | `REL_Y`      | raw Y       |
//! | 90      | yes      | no       | `REL_Y`      | `REL_X`      | raw X       |
//! | 180     | yes      | yes      | `REL_X`      | `REL_Y`      | raw Y       |
//! | 270     | no       | yes      | `REL_Y`      | `REL_X`      | raw X       |
//!
//! Two-finger scrolling always accumulates on the raw axis that runs
//! vertically on screen, which is the one *not* driving `REL_X`.

use crate::engine::event::Axis;
use crate::engine::output::RelAxis;
use std::fmt;
use std::sync::atomic::{AtomicU16, AtomicU8, Ordering};
use std::sync::Arc;

/// Screen orientation relative to the panel's native orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rotation {
    /// Native orientation
    #[default]
    Deg0,
    /// Rotated a quarter turn
    Deg90,
    /// Upside down
    Deg180,
    /// Rotated three quarter turns
    Deg270,
}

impl Rotation {
    /// All orientations in clockwise order
    pub const ALL: [Rotation; 4] = [
        Rotation::Deg0,
        Rotation::Deg90,
        Rotation::Deg180,
        Rotation::Deg270,
    ];

    /// Parse a degree value; only multiples of 90 below 360 are valid
    pub fn from_degrees(degrees: u16) -> Option<Self> {
        match degrees {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            270 => Some(Rotation::Deg270),
            _ => None,
        }
    }

    /// Degree value
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Next orientation, wrapping 270 back to 0
    pub fn next(self) -> Self {
        match self {
            Rotation::Deg0 => Rotation::Deg90,
            Rotation::Deg90 => Rotation::Deg180,
            Rotation::Deg180 => Rotation::Deg270,
            Rotation::Deg270 => Rotation::Deg0,
        }
    }

    /// Whether raw X is mirrored
    pub fn mirrors_x(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg180)
    }

    /// Whether raw Y is mirrored
    pub fn mirrors_y(self) -> bool {
        matches!(self, Rotation::Deg180 | Rotation::Deg270)
    }

    fn is_quarter_turn(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }

    /// Mirror `value` on `axis` if this orientation requires it
    pub fn remap(self, axis: Axis, value: i32, geometry: &SurfaceGeometry) -> i32 {
        match axis {
            Axis::X if self.mirrors_x() => geometry.max_x - value,
            Axis::Y if self.mirrors_y() => geometry.max_y - value,
            _ => value,
        }
    }

    /// Relative pointer axis driven by single-finger motion on `axis`
    pub fn pointer_axis(self, axis: Axis) -> RelAxis {
        match (axis, self.is_quarter_turn()) {
            (Axis::X, false) | (Axis::Y, true) => RelAxis::X,
            (Axis::Y, false) | (Axis::X, true) => RelAxis::Y,
        }
    }

    /// Raw axis two-finger scrolling accumulates on
    pub fn scroll_axis(self) -> Axis {
        if self.is_quarter_turn() {
            Axis::X
        } else {
            Axis::Y
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Maximum coordinates reported by the touch surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceGeometry {
    /// Largest X value
    pub max_x: i32,
    /// Largest Y value
    pub max_y: i32,
}

impl SurfaceGeometry {
    /// Create geometry from axis maxima
    pub fn new(max_x: i32, max_y: i32) -> Self {
        Self { max_x, max_y }
    }
}

/// Where the current rotation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RotationSource {
    /// Fixed at startup, never changes
    Fixed,
    /// Tracked from the accelerometer service
    Sensor,
    /// Sensor unavailable; changed by the orientation action
    Manual,
}

impl RotationSource {
    fn to_raw(self) -> u8 {
        match self {
            RotationSource::Fixed => 0,
            RotationSource::Sensor => 1,
            RotationSource::Manual => 2,
        }
    }

    fn from_raw(raw: u8) -> Self {
        match raw {
            0 => RotationSource::Fixed,
            1 => RotationSource::Sensor,
            _ => RotationSource::Manual,
        }
    }
}

#[derive(Debug)]
struct RotationCell {
    degrees: AtomicU16,
    source: AtomicU8,
}

/// Shared rotation state
///
/// Read by the gesture machine on every event, written by the orientation
/// monitor or the orientation action. A single scalar replaced atomically,
/// so no lock is involved.
#[derive(Debug, Clone)]
pub struct RotationHandle {
    cell: Arc<RotationCell>,
}

impl RotationHandle {
    /// Create a handle with an initial value
    pub fn new(rotation: Rotation, source: RotationSource) -> Self {
        Self {
            cell: Arc::new(RotationCell {
                degrees: AtomicU16::new(rotation.degrees()),
                source: AtomicU8::new(source.to_raw()),
            }),
        }
    }

    /// Current rotation
    pub fn get(&self) -> Rotation {
        Rotation::from_degrees(self.cell.degrees.load(Ordering::Acquire)).unwrap_or_default()
    }

    /// Replace the current rotation
    pub fn set(&self, rotation: Rotation) {
        self.cell
            .degrees
            .store(rotation.degrees(), Ordering::Release);
    }

    /// Advance by 90°, returning the new rotation
    pub fn advance(&self) -> Rotation {
        let next = self.get().next();
        self.set(next);
        next
    }

    /// Where the rotation comes from
    pub fn source(&self) -> RotationSource {
        RotationSource::from_raw(self.cell.source.load(Ordering::Acquire))
    }
}

impl Default for RotationHandle {
    fn default() -> Self {
        Self::new(Rotation::Deg0, RotationSource::Fixed)
    }
}
