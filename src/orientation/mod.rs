//! Orientation Monitor
//!
//! Follows the accelerometer through iio-sensor-proxy on the system bus so
//! the touchpad keeps "up" pointing up when the phone is turned.
//!
//! # D-Bus Interface
//!
//! - Service: `net.hadess.SensorProxy`
//! - Path: `/net/hadess/SensorProxy`
//! - Property: `AccelerometerOrientation` (`s`)
//!
//! | Reported    | Rotation |
//! |-------------|----------|
//! | `normal`    | 0°       |
//! | `right-up`  | 90°      |
//! | `bottom-up` | 180°     |
//! | `left-up`   | 270°     |
//!
//! The property is read with an explicit `Properties.Get` on every poll,
//! never from a cached proxy, so a restarted sensor service is picked up.

use crate::engine::{Rotation, RotationHandle};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use zbus::names::{BusName, InterfaceName};
use zbus::zvariant::OwnedValue;
use zbus::Connection;

const SENSOR_SERVICE: &str = "net.hadess.SensorProxy";
const SENSOR_PATH: &str = "/net/hadess/SensorProxy";
const SENSOR_INTERFACE: &str = "net.hadess.SensorProxy";
const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";
const ORIENTATION_PROPERTY: &str = "AccelerometerOrientation";

/// Orientation lookup failures
#[derive(Error, Debug)]
pub enum OrientationError {
    /// Bus connection or call failed
    #[error("iio-sensor-proxy query failed: {0}")]
    DBus(#[from] zbus::Error),

    /// The property was not a string
    #[error("AccelerometerOrientation has unexpected type: {0}")]
    BadValue(#[from] zbus::zvariant::Error),

    /// The sensor has no reading yet or reported something new
    #[error("Unrecognized accelerometer orientation: {0:?}")]
    Unrecognized(String),
}

/// Map an `AccelerometerOrientation` value to a rotation
pub fn parse_orientation(value: &str) -> Result<Rotation, OrientationError> {
    match value {
        "normal" => Ok(Rotation::Deg0),
        "right-up" => Ok(Rotation::Deg90),
        "bottom-up" => Ok(Rotation::Deg180),
        "left-up" => Ok(Rotation::Deg270),
        other => Err(OrientationError::Unrecognized(other.to_string())),
    }
}

/// Connection to iio-sensor-proxy
#[derive(Debug, Clone)]
pub struct SensorProxy {
    connection: Connection,
}

impl SensorProxy {
    /// Connect to the system bus
    pub async fn connect() -> Result<Self, OrientationError> {
        let connection = Connection::system().await?;
        Ok(Self { connection })
    }

    /// Raw `AccelerometerOrientation` string
    pub async fn raw_orientation(&self) -> Result<String, OrientationError> {
        let bus_name: BusName = SENSOR_SERVICE.try_into().map_err(zbus::Error::from)?;
        let interface: InterfaceName =
            PROPERTIES_INTERFACE.try_into().map_err(zbus::Error::from)?;

        let value: OwnedValue = self
            .connection
            .call_method(
                Some(bus_name),
                SENSOR_PATH,
                Some(interface),
                "Get",
                &(SENSOR_INTERFACE, ORIENTATION_PROPERTY),
            )
            .await?
            .body()
            .deserialize()?;

        Ok(String::try_from(value)?)
    }

    /// Current orientation
    pub async fn orientation(&self) -> Result<Rotation, OrientationError> {
        parse_orientation(&self.raw_orientation().await?)
    }
}

/// Apply one sensor reading; returns whether the rotation changed
///
/// Failed readings keep the last known rotation.
pub fn apply_reading(
    handle: &RotationHandle,
    reading: Result<Rotation, OrientationError>,
) -> bool {
    match reading {
        Ok(rotation) if rotation != handle.get() => {
            info!("Orientation changed: {} -> {}", handle.get(), rotation);
            handle.set(rotation);
            true
        }
        Ok(_) => false,
        Err(e) => {
            debug!("Keeping orientation {}: {}", handle.get(), e);
            false
        }
    }
}

/// Poll the sensor every `interval` until the task is aborted
pub fn spawn_monitor(
    proxy: SensorProxy,
    handle: RotationHandle,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut failing = false;

        loop {
            ticker.tick().await;
            let reading = proxy.orientation().await;

            match (&reading, failing) {
                (Err(e), false) => {
                    warn!("Orientation sensor unavailable: {}", e);
                    failing = true;
                }
                (Ok(_), true) => {
                    info!("Orientation sensor available again");
                    failing = false;
                }
                _ => {}
            }

            apply_reading(&handle, reading);
        }
    })
}
