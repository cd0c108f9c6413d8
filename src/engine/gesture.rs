//! Gesture State Machine
//!
//! Turns touch surface events into pointer output the way a laptop touchpad
//! behaves:
//!
//! - **One finger**: relative pointer motion
//! - **Quick tap**: left click
//! - **Stationary hold** (1 s): left button held until release (drag)
//! - **Tap, then touch again quickly**: drag starts immediately
//! - **Two fingers moving**: scroll wheel
//! - **Quick two-finger tap**: right click
//!
//! # State
//!
//! ```text
//!            touch down                    touch up
//!   Idle  ───────────────►  Touching  ───────────────►  Idle
//!                             │
//!                             ├─ 1 finger  → pointer motion
//!                             ├─ 2 fingers → scroll
//!                             └─ more      → clamped to 2
//! ```
//!
//! All timing uses kernel event timestamps in microseconds, except the
//! hold-to-drag delay which runs on the [`HoldDragTimer`].

use crate::engine::clock::Timestamp;
use crate::engine::contacts::ContactTracker;
use crate::engine::event::{Axis, EventKind, NormalizedEvent};
use crate::engine::hold_timer::{HoldDragTimer, HoldTicket};
use crate::engine::output::{PointerButton, PointerEvent, PointerOutput, RelAxis};
use crate::engine::rotation::{Rotation, SurfaceGeometry};
use std::time::Duration;
use tracing::{debug, trace};

/// Tap, click and tap-drag window in microseconds
pub const TAP_WINDOW_US: u64 = 150_000;

/// Dwell time before a stationary touch becomes a drag
pub const HOLD_DRAG_DELAY: Duration = Duration::from_micros(1_000_000);

/// Two-finger travel (device units) needed before a wheel step is emitted
pub const SCROLL_THRESHOLD: i32 = 15;

/// Device units per wheel detent
pub const SCROLL_DIVISOR: i32 = 10;

/// Transient state of the current touch
#[derive(Debug, Clone, Default)]
pub struct TouchSession {
    touch_active: bool,
    dragging: bool,
    awaiting_hold_drag: bool,
    awaiting_click: bool,
    awaiting_tap_drag: bool,
    prev_x: Option<i32>,
    prev_y: Option<i32>,
    prev_scroll_x: Option<i32>,
    prev_scroll_y: Option<i32>,
    touch_down_at: Timestamp,
    touch_up_at: Timestamp,
    two_finger_down_at: Timestamp,
}

impl TouchSession {
    /// A finger is on the surface
    pub fn touch_active(&self) -> bool {
        self.touch_active
    }

    /// The left button is held by a drag
    pub fn dragging(&self) -> bool {
        self.dragging
    }

    /// The hold-to-drag timer is armed
    pub fn awaiting_hold_drag(&self) -> bool {
        self.awaiting_hold_drag
    }

    /// Releasing now would still produce a click
    pub fn awaiting_click(&self) -> bool {
        self.awaiting_click
    }

    /// A quick re-touch would start a drag
    pub fn awaiting_tap_drag(&self) -> bool {
        self.awaiting_tap_drag
    }

    /// Previous pointer sample on `axis`, `None` until the first sample
    pub fn previous(&self, axis: Axis) -> Option<i32> {
        match axis {
            Axis::X => self.prev_x,
            Axis::Y => self.prev_y,
        }
    }

    /// Scroll reference on `axis`, `None` until the first two-finger sample
    pub fn scroll_reference(&self, axis: Axis) -> Option<i32> {
        match axis {
            Axis::X => self.prev_scroll_x,
            Axis::Y => self.prev_scroll_y,
        }
    }

    fn previous_mut(&mut self, axis: Axis) -> &mut Option<i32> {
        match axis {
            Axis::X => &mut self.prev_x,
            Axis::Y => &mut self.prev_y,
        }
    }

    fn scroll_reference_mut(&mut self, axis: Axis) -> &mut Option<i32> {
        match axis {
            Axis::X => &mut self.prev_scroll_x,
            Axis::Y => &mut self.prev_scroll_y,
        }
    }

    fn reset_pointer_reference(&mut self) {
        self.prev_x = None;
        self.prev_y = None;
    }

    fn reset_scroll_reference(&mut self) {
        self.prev_scroll_x = None;
        self.prev_scroll_y = None;
    }
}

/// Touch gesture interpreter
pub struct GestureMachine {
    session: TouchSession,
    contacts: ContactTracker,
    geometry: SurfaceGeometry,
    timer: Box<dyn HoldDragTimer>,
    hold_ticket: HoldTicket,
}

impl GestureMachine {
    /// Create a machine for a surface of `geometry`
    pub fn new(geometry: SurfaceGeometry, timer: Box<dyn HoldDragTimer>) -> Self {
        Self {
            session: TouchSession::default(),
            contacts: ContactTracker::new(),
            geometry,
            timer,
            hold_ticket: HoldTicket::default(),
        }
    }

    /// Current touch state
    pub fn session(&self) -> &TouchSession {
        &self.session
    }

    /// Fingers as seen by gesture classification (0..=2)
    pub fn finger_count(&self) -> usize {
        self.contacts.finger_count()
    }

    /// Surface maxima
    pub fn geometry(&self) -> SurfaceGeometry {
        self.geometry
    }

    /// Ticket of the most recent hold-timer arming
    pub fn hold_ticket(&self) -> HoldTicket {
        self.hold_ticket
    }

    /// Process one touch event
    pub fn handle(
        &mut self,
        event: &NormalizedEvent,
        rotation: Rotation,
        out: &mut dyn PointerOutput,
    ) {
        match event.kind {
            EventKind::TouchDown => self.touch_down(event.timestamp, out),
            EventKind::TouchUp => self.touch_up(event.timestamp, out),
            EventKind::ContactDown => self.contact_down(event.slot, event.timestamp),
            EventKind::ContactUp => self.contact_up(event.slot, event.timestamp, out),
            EventKind::ContactMove => {
                if let Some(axis) = event.axis {
                    self.motion(event.slot, axis, event.value, rotation, out);
                }
            }
            EventKind::Sync => out.emit(PointerEvent::Sync),
        }
    }

    /// Hold timer fired for `ticket`; returns whether a drag started
    pub fn hold_drag_expired(&mut self, ticket: HoldTicket, out: &mut dyn PointerOutput) -> bool {
        if !self.session.awaiting_hold_drag || ticket != self.hold_ticket {
            trace!(
                "Ignoring stale hold timer ticket {} (current {})",
                ticket.generation(),
                self.hold_ticket.generation()
            );
            return false;
        }

        debug!("Hold-to-drag: stationary touch promoted to drag");
        self.start_drag(out);
        true
    }

    /// Drop every contact and transient flag
    ///
    /// Used while the touchpad is disabled: the finger count is forced to
    /// zero and nothing carries over to the next enable.
    pub fn force_idle(&mut self) {
        self.cancel_hold_drag();
        self.contacts.reset();
        self.session = TouchSession {
            touch_up_at: self.session.touch_up_at,
            ..TouchSession::default()
        };
    }

    fn touch_down(&mut self, timestamp: Timestamp, out: &mut dyn PointerOutput) {
        self.session.touch_active = true;
        self.session.touch_down_at = timestamp;

        if self.session.awaiting_tap_drag
            && timestamp.within(self.session.touch_up_at, TAP_WINDOW_US)
        {
            debug!("Tap-drag: re-touch within tap window");
            self.session.awaiting_tap_drag = false;
            self.start_drag(out);
        } else if self.contacts.contacts() <= 1 {
            self.arm_hold_drag();
        }

        self.session.reset_pointer_reference();
        self.session.awaiting_click = true;
        self.session.awaiting_tap_drag = true;
    }

    fn touch_up(&mut self, timestamp: Timestamp, out: &mut dyn PointerOutput) {
        self.session.touch_active = false;
        self.session.touch_up_at = timestamp;

        let clicked = self.session.awaiting_click
            && timestamp.within(self.session.touch_down_at, TAP_WINDOW_US);

        if clicked {
            debug!("Tap: left click");
            self.session.awaiting_click = false;
            self.click(PointerButton::Left, out);
        }

        if self.session.dragging {
            debug!("Drag released");
            // A click already ended with a release
            if !clicked {
                out.emit(PointerEvent::release(PointerButton::Left));
            }
            self.session.dragging = false;
        }

        self.cancel_hold_drag();
    }

    fn contact_down(&mut self, slot: i32, timestamp: Timestamp) {
        let contacts = self.contacts.contact_down(slot);
        trace!("Contact down on slot {} ({} contacts)", slot, contacts);

        if contacts > 1 {
            self.cancel_hold_drag();
            self.session.awaiting_click = false;
            self.session.awaiting_tap_drag = false;
        }

        if contacts == 2 {
            self.session.two_finger_down_at = timestamp;
            self.session.reset_scroll_reference();
        }
    }

    fn contact_up(&mut self, slot: i32, timestamp: Timestamp, out: &mut dyn PointerOutput) {
        if !self.contacts.is_active(slot) {
            trace!("Contact up on inactive slot {}", slot);
            return;
        }

        let contacts = self.contacts.contacts();

        if contacts == 2 {
            if timestamp.within(self.session.two_finger_down_at, TAP_WINDOW_US) {
                debug!("Two-finger tap: right click");
                self.click(PointerButton::Right, out);
            }
            self.session.reset_pointer_reference();
        }

        self.cancel_hold_drag();

        if contacts > 1 {
            self.session.awaiting_click = false;
            self.session.awaiting_tap_drag = false;
        }

        self.contacts.contact_up(slot);
        trace!(
            "Contact up on slot {} ({} contacts)",
            slot,
            self.contacts.contacts()
        );
    }

    fn motion(
        &mut self,
        slot: i32,
        axis: Axis,
        raw_value: i32,
        rotation: Rotation,
        out: &mut dyn PointerOutput,
    ) {
        if !self.contacts.is_primary(slot) || !self.session.touch_active {
            return;
        }

        let value = rotation.remap(axis, raw_value, &self.geometry);

        match self.contacts.finger_count() {
            1 => self.pointer_motion(axis, value, rotation, out),
            2 => self.scroll_motion(axis, value, rotation, out),
            _ => {}
        }
    }

    fn pointer_motion(
        &mut self,
        axis: Axis,
        value: i32,
        rotation: Rotation,
        out: &mut dyn PointerOutput,
    ) {
        if let Some(previous) = self.session.previous(axis) {
            let delta = value - previous;
            if delta != 0 {
                // Movement rules out click, hold-drag and tap-drag
                self.cancel_hold_drag();
                self.session.awaiting_click = false;
                self.session.awaiting_tap_drag = false;

                out.emit(PointerEvent::relative(rotation.pointer_axis(axis), delta));
            }
        }

        *self.session.previous_mut(axis) = Some(value);
    }

    fn scroll_motion(
        &mut self,
        axis: Axis,
        value: i32,
        rotation: Rotation,
        out: &mut dyn PointerOutput,
    ) {
        let scroll_axis = rotation.scroll_axis();
        let reference = self.session.scroll_reference_mut(axis);

        match *reference {
            None => *reference = Some(value),
            Some(previous) if axis == scroll_axis => {
                let travel = value - previous;
                if travel.abs() > SCROLL_THRESHOLD {
                    let steps = travel / SCROLL_DIVISOR;
                    trace!("Scroll: travel {} -> wheel {}", travel, steps);
                    out.emit(PointerEvent::relative(RelAxis::Wheel, steps));
                    *reference = Some(value);
                }
            }
            Some(_) => {}
        }
    }

    fn click(&mut self, button: PointerButton, out: &mut dyn PointerOutput) {
        out.emit(PointerEvent::press(button));
        out.emit(PointerEvent::Sync);
        out.emit(PointerEvent::release(button));
    }

    fn start_drag(&mut self, out: &mut dyn PointerOutput) {
        self.cancel_hold_drag();
        self.session.dragging = true;
        out.emit(PointerEvent::press(PointerButton::Left));
        out.emit(PointerEvent::Sync);
    }

    fn arm_hold_drag(&mut self) {
        self.hold_ticket = self.hold_ticket.next();
        self.session.awaiting_hold_drag = true;
        self.timer.arm(self.hold_ticket, HOLD_DRAG_DELAY);
    }

    fn cancel_hold_drag(&mut self) {
        if self.session.awaiting_hold_drag {
            self.session.awaiting_hold_drag = false;
            self.hold_ticket = self.hold_ticket.next();
            self.timer.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::hold_timer::MockHoldDragTimer;
    use crate::engine::output::testing::RecordingPointer;

    const GEOMETRY: SurfaceGeometry = SurfaceGeometry {
        max_x: 720,
        max_y: 1440,
    };

    fn ts(micros: u64) -> Timestamp {
        Timestamp::from_micros(micros)
    }

    fn quiet_timer() -> Box<dyn HoldDragTimer> {
        let mut timer = MockHoldDragTimer::new();
        timer.expect_arm().return_const(());
        timer.expect_cancel().return_const(());
        Box::new(timer)
    }

    struct Harness {
        machine: GestureMachine,
        pointer: RecordingPointer,
        rotation: Rotation,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                machine: GestureMachine::new(GEOMETRY, quiet_timer()),
                pointer: RecordingPointer::opened(),
                rotation: Rotation::Deg0,
            }
        }

        fn feed(&mut self, event: NormalizedEvent) {
            self.machine.handle(&event, self.rotation, &mut self.pointer);
        }

        /// First finger lands on slot 0 at (x, y)
        fn finger_down(&mut self, at: u64, x: i32, y: i32) {
            self.feed(NormalizedEvent::contact_down(0, 1, ts(at)));
            self.feed(NormalizedEvent::touch_down(ts(at)));
            self.feed(NormalizedEvent::moved(0, Axis::X, x, ts(at)));
            self.feed(NormalizedEvent::moved(0, Axis::Y, y, ts(at)));
            self.feed(NormalizedEvent::sync(ts(at)));
        }

        fn finger_up(&mut self, at: u64) {
            self.feed(NormalizedEvent::contact_up(0, ts(at)));
            self.feed(NormalizedEvent::touch_up(ts(at)));
            self.feed(NormalizedEvent::sync(ts(at)));
        }

        fn move_to(&mut self, at: u64, slot: i32, axis: Axis, value: i32) {
            self.feed(NormalizedEvent::moved(slot, axis, value, ts(at)));
            self.feed(NormalizedEvent::sync(ts(at)));
        }

        fn output(&self) -> Vec<PointerEvent> {
            self.pointer.take()
        }
    }

    fn without_syncs(events: &[PointerEvent]) -> Vec<PointerEvent> {
        events
            .iter()
            .copied()
            .filter(|e| *e != PointerEvent::Sync)
            .collect()
    }

    fn click_sequence(button: PointerButton) -> Vec<PointerEvent> {
        vec![
            PointerEvent::press(button),
            PointerEvent::Sync,
            PointerEvent::release(button),
        ]
    }

    fn contains_sequence(haystack: &[PointerEvent], needle: &[PointerEvent]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    fn relative_events(events: &[PointerEvent]) -> Vec<PointerEvent> {
        events
            .iter()
            .copied()
            .filter(|e| matches!(e, PointerEvent::Relative { .. }))
            .collect()
    }

    #[test]
    fn test_quick_tap_clicks_once() {
        let mut h = Harness::new();
        h.finger_down(1_000_000, 100, 100);
        h.finger_up(1_100_000);

        let out = h.output();
        assert!(contains_sequence(&out, &click_sequence(PointerButton::Left)));
        assert_eq!(
            without_syncs(&out),
            vec![
                PointerEvent::press(PointerButton::Left),
                PointerEvent::release(PointerButton::Left)
            ]
        );
        assert!(relative_events(&out).is_empty());
    }

    #[test]
    fn test_slow_release_does_not_click() {
        let mut h = Harness::new();
        h.finger_down(1_000_000, 100, 100);
        h.finger_up(1_150_000);

        assert!(without_syncs(&h.output()).is_empty());
    }

    #[test]
    fn test_every_frame_sync_is_forwarded() {
        let mut h = Harness::new();
        h.feed(NormalizedEvent::sync(ts(1)));
        h.feed(NormalizedEvent::sync(ts(2)));
        assert_eq!(h.output(), vec![PointerEvent::Sync, PointerEvent::Sync]);
    }

    #[test]
    fn test_touch_down_arms_hold_timer() {
        let mut timer = MockHoldDragTimer::new();
        timer
            .expect_arm()
            .withf(|_, delay| *delay == HOLD_DRAG_DELAY)
            .times(1)
            .return_const(());
        timer.expect_cancel().return_const(());

        let mut machine = GestureMachine::new(GEOMETRY, Box::new(timer));
        let mut pointer = RecordingPointer::opened();
        machine.handle(
            &NormalizedEvent::contact_down(0, 1, ts(10)),
            Rotation::Deg0,
            &mut pointer,
        );
        machine.handle(&NormalizedEvent::touch_down(ts(10)), Rotation::Deg0, &mut pointer);

        assert!(machine.session().awaiting_hold_drag());
        assert!(!machine.session().dragging());
    }

    #[test]
    fn test_hold_promotes_to_drag_and_release_ends_it() {
        let mut h = Harness::new();
        h.finger_down(1_000_000, 100, 100);
        let ticket = h.machine.hold_ticket();
        h.output();

        assert!(h.machine.hold_drag_expired(ticket, &mut h.pointer));
        assert!(h.machine.session().dragging());
        assert!(!h.machine.session().awaiting_hold_drag());
        assert_eq!(
            h.output(),
            vec![PointerEvent::press(PointerButton::Left), PointerEvent::Sync]
        );

        // Firing again is a no-op
        assert!(!h.machine.hold_drag_expired(ticket, &mut h.pointer));
        assert!(h.output().is_empty());

        h.finger_up(2_500_000);
        assert_eq!(
            without_syncs(&h.output()),
            vec![PointerEvent::release(PointerButton::Left)]
        );
        assert!(!h.machine.session().dragging());
    }

    #[test]
    fn test_movement_cancels_hold_drag() {
        let mut h = Harness::new();
        h.finger_down(1_000_000, 100, 100);
        let ticket = h.machine.hold_ticket();

        h.move_to(1_050_000, 0, Axis::X, 105);
        assert!(!h.machine.session().awaiting_hold_drag());
        assert!(!h.machine.session().awaiting_click());
        assert!(!h.machine.session().awaiting_tap_drag());

        assert!(!h.machine.hold_drag_expired(ticket, &mut h.pointer));
        assert!(!h.machine.session().dragging());
    }

    #[test]
    fn test_stale_ticket_after_rearm_is_ignored() {
        let mut h = Harness::new();
        h.finger_down(1_000_000, 100, 100);
        let old = h.machine.hold_ticket();
        h.finger_up(1_500_000);
        h.finger_down(3_000_000, 100, 100);

        assert!(!h.machine.hold_drag_expired(old, &mut h.pointer));
        let current = h.machine.hold_ticket();
        assert!(h.machine.hold_drag_expired(current, &mut h.pointer));
    }

    #[test]
    fn test_tap_then_quick_retouch_starts_drag() {
        let mut h = Harness::new();
        h.finger_down(1_000_000, 100, 100);
        h.finger_up(1_050_000);
        h.output();

        h.finger_down(1_120_000, 100, 100);
        assert!(h.machine.session().dragging());
        assert!(!h.machine.session().awaiting_hold_drag());
        assert_eq!(
            without_syncs(&h.output()),
            vec![PointerEvent::press(PointerButton::Left)]
        );

        h.move_to(1_400_000, 0, Axis::X, 160);
        h.finger_up(1_600_000);
        let out = h.output();
        assert_eq!(
            without_syncs(&out),
            vec![
                PointerEvent::relative(RelAxis::X, 60),
                PointerEvent::release(PointerButton::Left)
            ]
        );
        assert!(!h.machine.session().dragging());
    }

    #[test]
    fn test_retouch_after_window_does_not_drag() {
        let mut h = Harness::new();
        h.finger_down(1_000_000, 100, 100);
        h.finger_up(1_050_000);
        h.finger_down(1_300_000, 100, 100);

        assert!(!h.machine.session().dragging());
        assert!(h.machine.session().awaiting_hold_drag());
    }

    #[test]
    fn test_pointer_motion_rotation_0() {
        let mut h = Harness::new();
        h.finger_down(1_000_000, 100, 100);
        h.move_to(1_200_000, 0, Axis::X, 130);
        h.move_to(1_210_000, 0, Axis::Y, 100);

        assert_eq!(
            relative_events(&h.output()),
            vec![PointerEvent::relative(RelAxis::X, 30)]
        );
    }

    #[test]
    fn test_pointer_motion_rotation_90_swaps_and_mirrors() {
        let mut h = Harness::new();
        h.rotation = Rotation::Deg90;
        h.finger_down(1_000_000, 100, 100);
        h.move_to(1_200_000, 0, Axis::X, 130);

        // Raw X drives REL_Y and is mirrored
        assert_eq!(
            relative_events(&h.output()),
            vec![PointerEvent::relative(RelAxis::Y, -30)]
        );

        h.move_to(1_300_000, 0, Axis::Y, 140);
        assert_eq!(
            relative_events(&h.output()),
            vec![PointerEvent::relative(RelAxis::X, 40)]
        );
    }

    #[test]
    fn test_first_sample_after_touch_down_emits_nothing() {
        let mut h = Harness::new();
        h.feed(NormalizedEvent::contact_down(0, 1, ts(10)));
        h.feed(NormalizedEvent::touch_down(ts(10)));
        h.move_to(20, 0, Axis::X, 500);

        assert!(relative_events(&h.output()).is_empty());
        assert_eq!(h.machine.session().previous(Axis::X), Some(500));
        assert!(h.machine.session().awaiting_click());
    }

    #[test]
    fn test_non_primary_slot_positions_are_ignored() {
        let mut h = Harness::new();
        h.finger_down(1_000_000, 100, 100);
        h.feed(NormalizedEvent::moved(3, Axis::X, 400, ts(1_100_000)));

        assert!(relative_events(&h.output()).is_empty());
        assert_eq!(h.machine.session().previous(Axis::X), Some(100));
    }

    fn two_finger_scroll_harness(rotation: Rotation) -> Harness {
        let mut h = Harness::new();
        h.rotation = rotation;
        h.finger_down(1_000_000, 300, 300);
        h.feed(NormalizedEvent::contact_down(1, 2, ts(1_010_000)));
        h.feed(NormalizedEvent::sync(ts(1_010_000)));
        h.output();
        h
    }

    #[test]
    fn test_two_finger_scroll_threshold() {
        let mut h = two_finger_scroll_harness(Rotation::Deg0);

        let mut wheel = Vec::new();
        for (i, y) in [0, 8, 20, 5].into_iter().enumerate() {
            h.move_to(1_300_000 + i as u64 * 10_000, 0, Axis::Y, y);
            wheel.push(relative_events(&h.output()));
        }

        assert!(wheel[0].is_empty());
        assert!(wheel[1].is_empty());
        assert_eq!(wheel[2], vec![PointerEvent::relative(RelAxis::Wheel, 2)]);
        assert!(wheel[3].is_empty());
        assert_eq!(h.machine.session().scroll_reference(Axis::Y), Some(20));
    }

    #[test]
    fn test_scroll_truncates_toward_zero() {
        let mut h = two_finger_scroll_harness(Rotation::Deg0);
        h.move_to(1_300_000, 0, Axis::Y, 100);
        h.move_to(1_310_000, 0, Axis::Y, 81);

        assert_eq!(
            relative_events(&h.output()),
            vec![PointerEvent::relative(RelAxis::Wheel, -1)]
        );
    }

    #[test]
    fn test_scroll_ignores_pointer_axis() {
        let mut h = two_finger_scroll_harness(Rotation::Deg0);
        h.move_to(1_300_000, 0, Axis::X, 0);
        h.move_to(1_310_000, 0, Axis::X, 200);

        assert!(relative_events(&h.output()).is_empty());
    }

    #[test]
    fn test_scroll_uses_raw_x_at_quarter_turn() {
        let mut h = two_finger_scroll_harness(Rotation::Deg270);
        h.move_to(1_300_000, 0, Axis::X, 100);
        h.move_to(1_310_000, 0, Axis::X, 150);

        assert_eq!(
            relative_events(&h.output()),
            vec![PointerEvent::relative(RelAxis::Wheel, 5)]
        );
    }

    #[test]
    fn test_second_finger_cancels_click_and_hold() {
        let mut h = Harness::new();
        h.finger_down(1_000_000, 100, 100);
        let ticket = h.machine.hold_ticket();

        h.feed(NormalizedEvent::contact_down(1, 2, ts(1_020_000)));
        assert!(!h.machine.session().awaiting_hold_drag());
        assert!(!h.machine.session().awaiting_click());
        assert!(!h.machine.session().awaiting_tap_drag());
        assert!(!h.machine.hold_drag_expired(ticket, &mut h.pointer));
    }

    #[test]
    fn test_two_finger_tap_right_clicks_once() {
        let mut h = Harness::new();
        h.finger_down(1_000_000, 100, 100);
        h.feed(NormalizedEvent::contact_down(1, 2, ts(1_010_000)));
        h.feed(NormalizedEvent::sync(ts(1_010_000)));

        h.feed(NormalizedEvent::contact_up(1, ts(1_080_000)));
        h.feed(NormalizedEvent::sync(ts(1_080_000)));
        h.finger_up(1_090_000);

        let out = h.output();
        assert!(contains_sequence(&out, &click_sequence(PointerButton::Right)));
        assert_eq!(
            without_syncs(&out),
            vec![
                PointerEvent::press(PointerButton::Right),
                PointerEvent::release(PointerButton::Right)
            ]
        );
    }

    #[test]
    fn test_slow_two_finger_release_does_not_right_click() {
        let mut h = Harness::new();
        h.finger_down(1_000_000, 100, 100);
        h.feed(NormalizedEvent::contact_down(1, 2, ts(1_010_000)));
        h.feed(NormalizedEvent::contact_up(1, ts(1_200_000)));

        assert!(without_syncs(&h.output()).is_empty());
    }

    #[test]
    fn test_back_to_one_finger_resets_pointer_reference() {
        let mut h = Harness::new();
        h.finger_down(1_000_000, 100, 100);
        h.move_to(1_010_000, 0, Axis::X, 110);
        h.feed(NormalizedEvent::contact_down(1, 2, ts(1_020_000)));
        h.feed(NormalizedEvent::contact_up(1, ts(1_500_000)));
        h.output();

        // First one-finger sample after the second finger left: no spike
        h.move_to(1_600_000, 0, Axis::X, 600);
        assert!(relative_events(&h.output()).is_empty());
        h.move_to(1_610_000, 0, Axis::X, 610);
        assert_eq!(
            relative_events(&h.output()),
            vec![PointerEvent::relative(RelAxis::X, 10)]
        );
    }

    #[test]
    fn test_third_finger_is_treated_as_two() {
        let mut h = two_finger_scroll_harness(Rotation::Deg0);
        h.feed(NormalizedEvent::contact_down(2, 3, ts(1_020_000)));
        assert_eq!(h.machine.finger_count(), 2);

        h.move_to(1_300_000, 0, Axis::Y, 0);
        h.move_to(1_310_000, 0, Axis::Y, 30);
        assert_eq!(
            relative_events(&h.output()),
            vec![PointerEvent::relative(RelAxis::Wheel, 3)]
        );

        // Lifting one of three fingers is not a two-finger tap
        h.feed(NormalizedEvent::contact_up(2, ts(1_030_000)));
        assert!(without_syncs(&h.output()).is_empty());
    }

    #[test]
    fn test_force_idle_clears_everything() {
        let mut h = Harness::new();
        h.finger_down(1_000_000, 100, 100);
        h.feed(NormalizedEvent::contact_down(1, 2, ts(1_010_000)));
        let ticket = h.machine.hold_ticket();

        h.machine.force_idle();

        assert_eq!(h.machine.finger_count(), 0);
        assert!(!h.machine.session().touch_active());
        assert!(!h.machine.session().dragging());
        assert!(!h.machine.hold_drag_expired(ticket, &mut h.pointer));
    }

    #[test]
    fn test_dragging_and_awaiting_hold_never_overlap() {
        let mut h = Harness::new();
        h.finger_down(1_000_000, 100, 100);
        h.finger_up(1_050_000);
        h.finger_down(1_100_000, 100, 100);

        let session = h.machine.session();
        assert!(session.dragging());
        assert!(!session.awaiting_hold_drag());
    }
}
