//! Blocking Input Loop
//!
//! Waits on every input source plus a wake socket, then drains the ready
//! sources in registration order (touch surface, buttons, slider) into the
//! engine. Runs on a blocking thread until the close flag is set.

use super::sources::{EventSource, SourceRole};
use crate::device::DeviceError;
use crate::engine::{
    ButtonEvent, CloseSignal, PositionSource, RawEvent, SharedEngine, SliderEvent,
    TouchTranslator,
};
use anyhow::{Context, Result};
use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use std::io::{self, Read};
use std::os::fd::{AsFd, OwnedFd};
use std::os::unix::net::UnixStream;
use tracing::{debug, info, trace};

/// Whether a read error just means "try again later"
pub fn is_transient(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

fn hung_up(revents: PollFlags) -> bool {
    revents.intersects(PollFlags::POLLHUP | PollFlags::POLLERR | PollFlags::POLLNVAL)
}

struct Registered {
    role: SourceRole,
    source: Box<dyn EventSource>,
}

/// Feeds decoded events into the engine
struct Router {
    engine: SharedEngine,
    translator: TouchTranslator,
}

impl Router {
    fn route(&mut self, role: SourceRole, events: &[RawEvent]) {
        let mut engine = self.engine.lock();

        for raw in events {
            match role {
                SourceRole::Touch => {
                    if let Some(event) = self.translator.translate(raw) {
                        engine.handle_touch(&event);
                    }
                }
                SourceRole::Buttons => {
                    if let Some(event) = ButtonEvent::from_raw(raw) {
                        engine.handle_button(&event);
                    }
                }
                SourceRole::Slider => {
                    if let Some(event) = SliderEvent::from_raw(raw) {
                        engine.handle_slider(&event);
                    }
                }
            }
        }
    }
}

/// The main event loop
pub struct InputLoop {
    sources: Vec<Registered>,
    router: Router,
    close: CloseSignal,
    wake: UnixStream,
    timeout: PollTimeout,
}

impl InputLoop {
    /// Create a loop with no sources
    ///
    /// Anything written to the peer of `wake` interrupts a pending poll so
    /// the close flag is seen without waiting for the timeout.
    pub fn new(
        engine: SharedEngine,
        close: CloseSignal,
        touch_positions: PositionSource,
        wake: UnixStream,
        poll_timeout_ms: u16,
    ) -> Self {
        Self {
            sources: Vec::new(),
            router: Router {
                engine,
                translator: TouchTranslator::new(touch_positions),
            },
            close,
            wake,
            timeout: PollTimeout::from(poll_timeout_ms),
        }
    }

    /// Register a source; sources are drained in registration order
    pub fn add_source(&mut self, role: SourceRole, source: Box<dyn EventSource>) {
        debug!("Input source {:?}: {}", role, source.name());
        self.sources.push(Registered { role, source });
    }

    /// Run until the close flag is set
    pub fn run(self) -> Result<()> {
        let InputLoop {
            mut sources,
            mut router,
            close,
            mut wake,
            timeout,
        } = self;

        wake.set_nonblocking(true)
            .context("Failed to configure wake socket")?;

        let owned = sources
            .iter()
            .map(|s| s.source.poll_fd())
            .collect::<io::Result<Vec<OwnedFd>>>()
            .context("Failed to duplicate input descriptors")?;

        let wake_fd = wake.as_fd().try_clone_to_owned()?;
        let mut fds: Vec<PollFd<'_>> = owned
            .iter()
            .chain(std::iter::once(&wake_fd))
            .map(|fd| PollFd::new(fd.as_fd(), PollFlags::POLLIN))
            .collect();
        let mut wake_index = Some(sources.len());

        info!("Input loop running ({} sources)", sources.len());

        while !close.is_requested() {
            match poll(&mut fds, timeout) {
                Ok(0) => {
                    trace!("Poll timeout");
                    continue;
                }
                Ok(_) => {}
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(io::Error::from(e)).context("poll on input devices failed"),
            }

            let ready: Vec<(usize, PollFlags)> = fds
                .iter()
                .enumerate()
                .filter_map(|(index, fd)| {
                    fd.revents()
                        .filter(|r| r.intersects(PollFlags::POLLIN) || hung_up(*r))
                        .map(|r| (index, r))
                })
                .collect();

            for (index, revents) in ready {
                if Some(index) == wake_index {
                    drain_wake(&mut wake);
                    if hung_up(revents) {
                        // Peer gone; keep running on the poll timeout alone
                        debug!("Wake socket closed");
                        fds.pop();
                        wake_index = None;
                    }
                    continue;
                }

                let entry = &mut sources[index];
                let events = match entry.source.fetch() {
                    Ok(events) => events,
                    // A hung-up descriptor stays ready forever
                    Err(e) if is_transient(&e) && !hung_up(revents) => continue,
                    Err(e) if is_transient(&e) => {
                        return Err(DeviceError::Read {
                            name: entry.source.name().to_string(),
                            source: io::Error::from(Errno::ENODEV),
                        }
                        .into())
                    }
                    Err(source) => {
                        return Err(DeviceError::Read {
                            name: entry.source.name().to_string(),
                            source,
                        }
                        .into())
                    }
                };

                trace!("{} events from {}", events.len(), entry.source.name());
                router.route(entry.role, &events);

                if close.is_requested() {
                    break;
                }
            }
        }

        info!("Input loop stopped");
        Ok(())
    }
}

fn drain_wake(wake: &mut UnixStream) {
    let mut buf = [0u8; 64];
    loop {
        match wake.read(&mut buf) {
            Ok(0) => break,
            Ok(_) => continue,
            Err(_) => break,
        }
    }
}
