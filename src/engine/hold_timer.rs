//! Hold-to-Drag Timer
//!
//! Single-shot deferred promotion of a stationary touch into a drag.
//!
//! Every arm carries a fresh [`HoldTicket`]. The gesture machine only honours
//! an expiry whose ticket matches the one it last armed *and* while it is
//! still waiting for a hold. Both checks happen under the engine lock, and
//! cancellation bumps the ticket under that same lock, so a timer that fires
//! concurrently with a cancel can never start a drag.

use crossbeam_channel::{unbounded, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Identifies one arming of the hold timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HoldTicket(u64);

impl HoldTicket {
    /// Ticket following this one
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Raw generation number
    pub fn generation(self) -> u64 {
        self.0
    }
}

/// Deferred-callback scheduler used by the gesture machine
#[cfg_attr(test, mockall::automock)]
pub trait HoldDragTimer: Send {
    /// Schedule expiry of `ticket` after `delay`, replacing any pending one
    fn arm(&mut self, ticket: HoldTicket, delay: Duration);

    /// Drop any pending expiry
    fn cancel(&mut self);
}

/// Callback invoked on the timer thread when a ticket expires
pub type ExpiryCallback = Box<dyn Fn(HoldTicket) + Send + 'static>;

#[derive(Debug)]
enum TimerCommand {
    Arm {
        ticket: HoldTicket,
        deadline: Instant,
    },
    Cancel,
}

/// [`HoldDragTimer`] backed by a dedicated thread
///
/// The thread exits once the timer is dropped.
pub struct ThreadHoldTimer {
    commands: Sender<TimerCommand>,
    thread: Option<JoinHandle<()>>,
}

impl ThreadHoldTimer {
    /// Spawn the timer thread
    pub fn spawn(on_expire: ExpiryCallback) -> std::io::Result<Self> {
        let (commands, rx) = unbounded::<TimerCommand>();

        let thread = thread::Builder::new()
            .name("hold-drag-timer".to_string())
            .spawn(move || {
                let mut pending: Option<(HoldTicket, Instant)> = None;

                loop {
                    let command = match pending {
                        Some((_, deadline)) => match rx.recv_deadline(deadline) {
                            Ok(command) => Some(command),
                            Err(RecvTimeoutError::Timeout) => None,
                            Err(RecvTimeoutError::Disconnected) => break,
                        },
                        None => match rx.recv() {
                            Ok(command) => Some(command),
                            Err(_) => break,
                        },
                    };

                    match command {
                        Some(TimerCommand::Arm { ticket, deadline }) => {
                            pending = Some((ticket, deadline));
                        }
                        Some(TimerCommand::Cancel) => pending = None,
                        None => {
                            if let Some((ticket, _)) = pending.take() {
                                trace!("Hold timer expired for ticket {}", ticket.generation());
                                on_expire(ticket);
                            }
                        }
                    }
                }

                debug!("Hold timer thread exiting");
            })?;

        Ok(Self {
            commands,
            thread: Some(thread),
        })
    }

    fn send(&self, command: TimerCommand) {
        if self.commands.send(command).is_err() {
            warn!("Hold timer thread is gone; hold-to-drag unavailable");
        }
    }
}

impl HoldDragTimer for ThreadHoldTimer {
    fn arm(&mut self, ticket: HoldTicket, delay: Duration) {
        self.send(TimerCommand::Arm {
            ticket,
            deadline: Instant::now() + delay,
        });
    }

    fn cancel(&mut self) {
        self.send(TimerCommand::Cancel);
    }
}

impl Drop for ThreadHoldTimer {
    fn drop(&mut self) {
        // Replacing the sender disconnects the channel and ends the thread
        let (dead, _) = unbounded();
        drop(std::mem::replace(&mut self.commands, dead));
        if let Some(thread) = self.thread.take() {
            // The expiry callback may be what dropped us; never join ourselves
            if thread.thread().id() != thread::current().id() {
                let _ = thread.join();
            }
        }
    }
}
