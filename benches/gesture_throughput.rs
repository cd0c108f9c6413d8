//! Gesture Engine Benchmarks
//!
//! Measures the per-event cost of the touch path: translation of raw evdev
//! records and gesture classification, at each rotation.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::io;
use std::time::Duration;
use touchpad_emulator::engine::codes::{abs, ev, key, syn};
use touchpad_emulator::engine::{
    ActionTable, ButtonOutput, Capabilities, CloseSignal, Collaborators, Engine, EngineSettings,
    HoldDragTimer, HoldTicket, KeyboardControl, PointerEvent, PointerOutput, PositionSource,
    RawEvent, Rotation, RotationHandle, RotationSource, SurfaceGeometry, SurfaceGrab, Timestamp,
    TouchTranslator, VolumeKey,
};

struct NullPointer {
    open: bool,
}

impl PointerOutput for NullPointer {
    fn open(&mut self) -> io::Result<()> {
        self.open = true;
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn emit(&mut self, event: PointerEvent) {
        black_box(event);
    }
}

struct Null;

impl ButtonOutput for Null {
    fn tap(&mut self, _key: VolumeKey) -> io::Result<()> {
        Ok(())
    }
}

impl SurfaceGrab for Null {
    fn grab(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn release(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl KeyboardControl for Null {
    fn set_enabled(&mut self, _enabled: bool) -> io::Result<()> {
        Ok(())
    }
}

impl HoldDragTimer for Null {
    fn arm(&mut self, _ticket: HoldTicket, _delay: Duration) {}
    fn cancel(&mut self) {}
}

fn engine(rotation: Rotation) -> Engine {
    let mut engine = Engine::new(
        EngineSettings {
            geometry: SurfaceGeometry::new(1080, 2340),
            actions: ActionTable::default(),
            capabilities: Capabilities {
                volume_up: true,
                volume_down: true,
                slider: false,
            },
            rotation: RotationHandle::new(rotation, RotationSource::Fixed),
            close: CloseSignal::new(),
        },
        Collaborators {
            pointer: Box::new(NullPointer { open: false }),
            buttons: Box::new(Null),
            surface: Box::new(Null),
            keyboard: Box::new(Null),
        },
        Box::new(Null),
    );
    engine.initialize(None);
    engine
}

/// A one-finger swipe: touch down, `steps` motion frames, touch up
fn swipe(steps: usize) -> Vec<RawEvent> {
    let mut events = Vec::with_capacity(steps * 3 + 8);
    let mut at = 1_000_000u64;
    let push = |events: &mut Vec<RawEvent>, t: u16, c: u16, v: i32, at: u64| {
        events.push(RawEvent::new(t, c, v, Timestamp::from_micros(at)));
    };

    push(&mut events, ev::EV_ABS, abs::ABS_MT_SLOT, 0, at);
    push(&mut events, ev::EV_ABS, abs::ABS_MT_TRACKING_ID, 1, at);
    push(&mut events, ev::EV_KEY, key::BTN_TOUCH, 1, at);
    push(&mut events, ev::EV_ABS, abs::ABS_MT_POSITION_X, 100, at);
    push(&mut events, ev::EV_ABS, abs::ABS_MT_POSITION_Y, 100, at);
    push(&mut events, ev::EV_SYN, syn::SYN_REPORT, 0, at);

    for i in 0..steps as i32 {
        at += 8_000;
        push(&mut events, ev::EV_ABS, abs::ABS_MT_POSITION_X, 100 + i * 3, at);
        push(&mut events, ev::EV_ABS, abs::ABS_MT_POSITION_Y, 100 + i * 2, at);
        push(&mut events, ev::EV_SYN, syn::SYN_REPORT, 0, at);
    }

    at += 8_000;
    push(&mut events, ev::EV_ABS, abs::ABS_MT_TRACKING_ID, -1, at);
    push(&mut events, ev::EV_KEY, key::BTN_TOUCH, 0, at);
    push(&mut events, ev::EV_SYN, syn::SYN_REPORT, 0, at);
    events
}

/// Benchmark translating and handling a full swipe at every rotation
fn bench_swipe(c: &mut Criterion) {
    let mut group = c.benchmark_group("gesture_swipe");
    let events = swipe(200);
    group.throughput(Throughput::Elements(events.len() as u64));

    for rotation in Rotation::ALL {
        group.bench_with_input(
            BenchmarkId::from_parameter(rotation.degrees()),
            &events,
            |b, events| {
                let mut engine = engine(rotation);
                let mut translator = TouchTranslator::new(PositionSource::Multitouch);
                b.iter(|| {
                    for raw in events {
                        if let Some(event) = translator.translate(black_box(raw)) {
                            engine.handle_touch(&event);
                        }
                    }
                });
            },
        );
    }

    group.finish();
}

/// Benchmark the translator alone
fn bench_translate(c: &mut Criterion) {
    let events = swipe(200);
    c.bench_function("translate_swipe", |b| {
        let mut translator = TouchTranslator::new(PositionSource::Multitouch);
        b.iter(|| {
            events
                .iter()
                .filter_map(|raw| translator.translate(black_box(raw)))
                .count()
        });
    });
}

criterion_group!(benches, bench_swipe, bench_translate);
criterion_main!(benches);
