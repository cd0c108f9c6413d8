//! Emulator Runtime
//!
//! Wires the devices, the orientation monitor and the engine together and
//! runs the input loop until a close action or a termination signal.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     TouchpadEmulator                         │
//! │                                                              │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐  │
//! │  │ InputDevices │   │ SensorProxy  │   │ Virtual devices  │  │
//! │  │ (discovery)  │   │ (zbus)       │   │ (uinput)         │  │
//! │  └──────┬───────┘   └──────┬───────┘   └────────┬─────────┘  │
//! │         │                  │ RotationHandle     │            │
//! │         ▼                  ▼                    ▼            │
//! │  ┌───────────────────────────────────────────────────────┐   │
//! │  │              InputLoop  ──►  SharedEngine             │   │
//! │  └───────────────────────────────────────────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Threading Model
//!
//! - **Tokio runtime**: signal handling and the orientation monitor.
//! - **Blocking pool**: the input loop, which sleeps in `poll(2)`.
//! - **Hold timer thread**: promotes stationary presses to drags.
//!
//! The loop and the timer share the engine behind one mutex. The rotation is
//! a lock-free atomic written by the monitor and read per event.
//!
//! # Example
//!
//! ```no_run
//! use touchpad_emulator::{config::Config, runtime::TouchpadEmulator};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let emulator = TouchpadEmulator::new(Config::default_config()).await?;
//! emulator.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod input_loop;
pub mod sources;

pub use input_loop::InputLoop;
pub use sources::{EventSource, OwnedDeviceSource, SharedDeviceSource, SourceRole};

use crate::config::types::OrientationConfig;
use crate::config::Config;
use crate::device::{
    grab_for_run, slider_position, surface_geometry, GsettingsKeyboard, InputDevices,
    OpenDevice, SharedDevice, TouchSurfaceGrab, UnmanagedKeyboard, VirtualButtons,
    VirtualPointer,
};
use crate::engine::{
    CloseSignal, Collaborators, Engine, EngineSettings, KeyboardControl, PositionSource,
    Rotation, RotationHandle, RotationSource, SharedEngine,
};
use crate::orientation::{spawn_monitor, SensorProxy};
use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::io::Write;
use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Resolve the starting rotation and start the monitor if one is needed
///
/// A fixed rotation wins. Otherwise the sensor is queried once; when that
/// fails the rotation starts at 0° and is changed by hand.
pub async fn resolve_orientation(
    config: &OrientationConfig,
) -> (RotationHandle, Option<JoinHandle<()>>) {
    if let Some(rotation) = config.fixed_rotation() {
        info!("Using fixed rotation {}", rotation);
        return (RotationHandle::new(rotation, RotationSource::Fixed), None);
    }

    let reading = match SensorProxy::connect().await {
        Ok(proxy) => proxy.orientation().await.map(|rotation| (proxy, rotation)),
        Err(e) => Err(e),
    };

    match reading {
        Ok((proxy, rotation)) => {
            info!("Orientation sensor found, starting at {}", rotation);
            let handle = RotationHandle::new(rotation, RotationSource::Sensor);
            let monitor = spawn_monitor(
                proxy,
                handle.clone(),
                Duration::from_millis(config.poll_interval_ms),
            );
            (handle, Some(monitor))
        }
        Err(e) => {
            warn!("Orientation sensor unavailable ({}); using manual rotation", e);
            (
                RotationHandle::new(Rotation::Deg0, RotationSource::Manual),
                None,
            )
        }
    }
}

/// The running emulator
pub struct TouchpadEmulator {
    config: Arc<Config>,
    engine: SharedEngine,
    close: CloseSignal,
    touchscreen: SharedDevice,
    touch_name: String,
    touch_positions: PositionSource,
    buttons: Vec<OpenDevice>,
    slider: Option<OpenDevice>,
    monitor: Option<JoinHandle<()>>,
}

impl TouchpadEmulator {
    /// Set up devices and the engine
    ///
    /// Returns once the initial mode is established; nothing is read yet.
    pub async fn new(config: Config) -> Result<Self> {
        info!("Initializing touchpad emulator");
        let config = Arc::new(config);
        let close = CloseSignal::new();

        let InputDevices {
            profile,
            touchscreen,
            mut buttons,
            mut slider,
            capabilities,
        } = InputDevices::discover(&config.devices).context("Failed to find input devices")?;
        debug!("Device profile {}: {:?}", profile, capabilities);

        let (rotation, monitor) = resolve_orientation(&config.orientation).await;
        let actions = config.actions.table();

        let virtual_buttons = VirtualButtons::create()?;

        for device in buttons.iter_mut().chain(slider.iter_mut()) {
            grab_for_run(&mut device.device, &device.summary.name)?;
        }

        let geometry = surface_geometry(&touchscreen)?;
        info!(
            "Touch surface {}: {}x{}",
            touchscreen.summary.name, geometry.max_x, geometry.max_y
        );
        let initial_slider = slider.as_ref().and_then(slider_position);

        let touch_name = touchscreen.summary.name.clone();
        let touch_positions = touchscreen.summary.position_source();
        let shared_touch: SharedDevice = Arc::new(Mutex::new(touchscreen.device));

        let keyboard: Box<dyn KeyboardControl> = if config.keyboard.manage_on_screen_keyboard {
            Box::new(GsettingsKeyboard::new())
        } else {
            Box::new(UnmanagedKeyboard)
        };

        let engine = Engine::shared(
            EngineSettings {
                geometry,
                actions,
                capabilities,
                rotation,
                close: close.clone(),
            },
            Collaborators {
                pointer: Box::new(VirtualPointer::new()),
                buttons: Box::new(virtual_buttons),
                surface: Box::new(TouchSurfaceGrab::new(
                    Arc::clone(&shared_touch),
                    touch_name.clone(),
                )),
                keyboard,
            },
        )
        .context("Failed to start hold-to-drag timer")?;

        engine.lock().initialize(initial_slider);

        Ok(Self {
            config,
            engine,
            close,
            touchscreen: shared_touch,
            touch_name,
            touch_positions,
            buttons,
            slider,
            monitor,
        })
    }

    /// Run until closed
    ///
    /// SIGINT and SIGTERM end the run the same way the close action does.
    /// Devices are restored before returning, also on error.
    pub async fn run(self) -> Result<()> {
        let TouchpadEmulator {
            config,
            engine,
            close,
            touchscreen,
            touch_name,
            touch_positions,
            buttons,
            slider,
            monitor,
        } = self;

        info!("╔════════════════════════════════════════════════════════════╗");
        info!("║          Touchpad Emulator is Running                      ║");
        info!("╚════════════════════════════════════════════════════════════╝");
        {
            let engine = engine.lock();
            info!("  Touchpad: {}", if engine.touchpad_enabled() { "on" } else { "off" });
            info!("  Rotation: {}", engine.rotation());
            info!("  Poll timeout: {} ms", config.input.poll_timeout_ms);
        }
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        let (wake, waker) = UnixStream::pair().context("Failed to create wake socket")?;
        let signals = spawn_signal_listener(close.clone(), waker)?;

        let mut input = InputLoop::new(
            Arc::clone(&engine),
            close.clone(),
            touch_positions,
            wake,
            config.input.poll_timeout_ms,
        );
        input.add_source(
            SourceRole::Touch,
            Box::new(SharedDeviceSource::new(touch_name, touchscreen)),
        );
        for device in buttons {
            input.add_source(SourceRole::Buttons, Box::new(OwnedDeviceSource::new(device)));
        }
        if let Some(device) = slider {
            input.add_source(SourceRole::Slider, Box::new(OwnedDeviceSource::new(device)));
        }

        let result = match tokio::task::spawn_blocking(move || input.run()).await {
            Ok(result) => result,
            Err(e) => Err(anyhow::anyhow!("Input loop panicked: {}", e)),
        };

        if let Err(ref e) = result {
            error!("Input loop stopped with error: {:#}", e);
        }

        signals.abort();
        if let Some(monitor) = monitor {
            monitor.abort();
        }
        engine.lock().shutdown();

        info!("Touchpad emulator shutdown complete");
        result
    }
}

/// Request close on SIGINT/SIGTERM and wake the input loop
fn spawn_signal_listener(close: CloseSignal, mut waker: UnixStream) -> Result<JoinHandle<()>> {
    let mut interrupt = signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?;
    let mut terminate =
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;

    Ok(tokio::spawn(async move {
        tokio::select! {
            _ = interrupt.recv() => info!("SIGINT received"),
            _ = terminate.recv() => info!("SIGTERM received"),
        }
        close.request();
        if let Err(e) = waker.write_all(&[1]) {
            debug!("Failed to wake input loop: {}", e);
        }
    }))
}
