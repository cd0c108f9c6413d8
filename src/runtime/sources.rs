//! Readable event sources for the input loop.

use crate::device::{OpenDevice, SharedDevice};
use crate::engine::{RawEvent, Timestamp};
use evdev::{Device, InputEvent};
use std::io;
use std::os::fd::{AsFd, OwnedFd};

/// What events from a source mean to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceRole {
    /// Touch surface
    Touch,
    /// Volume keys
    Buttons,
    /// Alert slider
    Slider,
}

/// Something the input loop can poll and drain
pub trait EventSource: Send {
    /// Name for logs
    fn name(&self) -> &str;

    /// Descriptor to wait on; a duplicate the loop owns
    fn poll_fd(&self) -> io::Result<OwnedFd>;

    /// Read everything currently queued
    ///
    /// `WouldBlock` and `Interrupted` are treated as "nothing yet".
    fn fetch(&mut self) -> io::Result<Vec<RawEvent>>;
}

/// Convert an evdev record to the engine's raw event
pub fn raw_event(event: &InputEvent) -> RawEvent {
    RawEvent::new(
        event.event_type().0,
        event.code(),
        event.value(),
        Timestamp::from_system_time(event.timestamp()),
    )
}

fn fetch_from(device: &mut Device) -> io::Result<Vec<RawEvent>> {
    Ok(device.fetch_events()?.map(|e| raw_event(&e)).collect())
}

/// Touch surface shared with its [`TouchSurfaceGrab`](crate::device::TouchSurfaceGrab)
pub struct SharedDeviceSource {
    name: String,
    device: SharedDevice,
}

impl SharedDeviceSource {
    /// Wrap a shared device handle
    pub fn new(name: impl Into<String>, device: SharedDevice) -> Self {
        Self {
            name: name.into(),
            device,
        }
    }
}

impl EventSource for SharedDeviceSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn poll_fd(&self) -> io::Result<OwnedFd> {
        self.device.lock().as_fd().try_clone_to_owned()
    }

    fn fetch(&mut self) -> io::Result<Vec<RawEvent>> {
        // The lock is released before the caller touches the engine
        let mut device = self.device.lock();
        fetch_from(&mut device)
    }
}

/// A device owned outright by the loop (buttons, slider)
pub struct OwnedDeviceSource {
    inner: OpenDevice,
}

impl OwnedDeviceSource {
    /// Take ownership of an open device
    pub fn new(inner: OpenDevice) -> Self {
        Self { inner }
    }
}

impl EventSource for OwnedDeviceSource {
    fn name(&self) -> &str {
        &self.inner.summary.name
    }

    fn poll_fd(&self) -> io::Result<OwnedFd> {
        self.inner.device.as_fd().try_clone_to_owned()
    }

    fn fetch(&mut self) -> io::Result<Vec<RawEvent>> {
        fetch_from(&mut self.inner.device)
    }
}

impl Drop for OwnedDeviceSource {
    fn drop(&mut self) {
        // Closing the node drops the grab anyway; be explicit about it
        let _ = self.inner.device.ungrab();
    }
}
