//! Virtual Pointer
//!
//! uinput relative pointer the desktop sees as a mouse. It exists only while
//! touchpad mode is on; destroying it makes the cursor disappear.
//!
//! Button and motion events are buffered and written as one frame when the
//! engine forwards a sync.

use crate::device::error::DeviceError;
use crate::engine::{PointerButton, PointerEvent, PointerOutput, RelAxis};
use evdev::uinput::VirtualDevice;
use evdev::{
    AttributeSet, BusType, EventType, InputEvent, InputId, KeyCode, PropType, RelativeAxisCode,
};
use std::io;
use tracing::{debug, info, warn};

/// Name the virtual pointer is registered under
pub const POINTER_NAME: &str = "Touchpad Emulator";

/// Identity shared by both virtual devices
pub(crate) fn emulator_input_id() -> InputId {
    InputId::new(BusType::BUS_USB, 0x1234, 0x5678, 0)
}

fn button_code(button: PointerButton) -> KeyCode {
    match button {
        PointerButton::Left => KeyCode::BTN_LEFT,
        PointerButton::Right => KeyCode::BTN_RIGHT,
    }
}

fn axis_code(axis: RelAxis) -> RelativeAxisCode {
    match axis {
        RelAxis::X => RelativeAxisCode::REL_X,
        RelAxis::Y => RelativeAxisCode::REL_Y,
        RelAxis::Wheel => RelativeAxisCode::REL_WHEEL,
    }
}

/// [`PointerOutput`] backed by uinput
#[derive(Default)]
pub struct VirtualPointer {
    device: Option<VirtualDevice>,
    frame: Vec<InputEvent>,
}

impl VirtualPointer {
    /// Create a closed pointer
    pub fn new() -> Self {
        Self::default()
    }

    fn build() -> Result<VirtualDevice, DeviceError> {
        let wrap = |source: io::Error| DeviceError::VirtualDevice {
            name: POINTER_NAME.to_string(),
            source,
        };

        let mut keys = AttributeSet::<KeyCode>::new();
        for button in [PointerButton::Left, PointerButton::Right] {
            keys.insert(button_code(button));
        }

        let mut axes = AttributeSet::<RelativeAxisCode>::new();
        for axis in [RelAxis::X, RelAxis::Y, RelAxis::Wheel] {
            axes.insert(axis_code(axis));
        }

        let mut props = AttributeSet::<PropType>::new();
        props.insert(PropType::DIRECT);

        VirtualDevice::builder()
            .map_err(wrap)?
            .name(POINTER_NAME)
            .input_id(emulator_input_id())
            .with_keys(&keys)
            .map_err(wrap)?
            .with_relative_axes(&axes)
            .map_err(wrap)?
            .with_properties(&props)
            .map_err(wrap)?
            .build()
            .map_err(wrap)
    }

    fn flush(&mut self) {
        let Some(device) = self.device.as_mut() else {
            self.frame.clear();
            return;
        };
        // emit() terminates the batch with SYN_REPORT
        if let Err(e) = device.emit(&self.frame) {
            warn!("Failed to write pointer frame: {}", e);
        }
        self.frame.clear();
    }
}

impl PointerOutput for VirtualPointer {
    fn open(&mut self) -> io::Result<()> {
        if self.device.is_some() {
            return Ok(());
        }

        let device = Self::build().map_err(io::Error::other)?;
        info!("Virtual pointer created");
        self.device = Some(device);
        Ok(())
    }

    fn close(&mut self) {
        self.frame.clear();
        if self.device.take().is_some() {
            info!("Virtual pointer destroyed");
        }
    }

    fn is_open(&self) -> bool {
        self.device.is_some()
    }

    fn emit(&mut self, event: PointerEvent) {
        if self.device.is_none() {
            return;
        }

        match event {
            PointerEvent::Button { button, pressed } => {
                debug!("Pointer {:?} {}", button, if pressed { "down" } else { "up" });
                self.frame.push(InputEvent::new(
                    EventType::KEY.0,
                    button_code(button).code(),
                    i32::from(pressed),
                ));
            }
            PointerEvent::Relative { axis, delta } => {
                self.frame.push(InputEvent::new(
                    EventType::RELATIVE.0,
                    axis_code(axis).0,
                    delta,
                ));
            }
            PointerEvent::Sync => self.flush(),
        }
    }
}
