//! In process stand in for a brick daemon connection.
//!
//! Devices are attached by uid and model. The handles in [`handles`]
//! implement the bricklet traits against them: configuration calls are
//! recorded and callbacks registered. Samples are injected with
//! [`Connection::push`], which honours the configured callback period the
//! way a real device would, or with [`Connection::emit`] which fires the
//! registered callback unconditionally. [`drive`] pushes samples forever
//! at the configured period.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bricklet_sensors::bricklet::{
    Averaging, CallbackConfiguration, DataRate, Identity, LowPassFilter,
    MovingAverageConfiguration,
};
use bricklet_sensors::{SensorHost, SensorModel, Uid};
use tracing::{debug, trace};

mod drive;
pub mod handles;

pub use drive::{drive, Signal};
pub use handles::{
    BrickletBarometer, BrickletBarometerV2, BrickletIndustrialDualAnalogInV2,
};

/// Uid reported as `connected_uid` for every attached device.
pub const MASTER_BRICK_UID: &str = "6JKxCC";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Not connected to a brick daemon")]
    NotConnected,
    #[error("No device with uid {0} is attached")]
    DeviceNotFound(Uid),
    #[error("A device with uid {0} is already attached")]
    AlreadyAttached(Uid),
    #[error("Device {uid} is a {found} not a {expected}")]
    WrongDevice {
        uid: Uid,
        expected: SensorModel,
        found: SensorModel,
    },
    #[error("Device {uid} has no channel {channel}")]
    InvalidChannel { uid: Uid, channel: u8 },
    #[error("All eight ports of the master brick are in use")]
    NoFreePort,
}

type AirPressureFn = Arc<dyn Fn(i32) + Send + Sync>;
type VoltageFn = Arc<dyn Fn(u8, i32) + Send + Sync>;

/// Everything the connection recorded about one device.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub averaging: Option<Averaging>,
    pub sensor_configuration: Option<(DataRate, LowPassFilter)>,
    pub moving_average: Option<MovingAverageConfiguration>,
    /// Set through the 1.0 style `set_*_callback_period` call
    pub callback_period: u32,
    /// Per channel, set through `set_*_callback_configuration`
    pub callback_configurations: Vec<CallbackConfiguration>,
    /// How often a callback was registered, replacing ones included
    pub registrations: usize,
    pub has_callback: bool,
}

#[derive(Default)]
struct State {
    averaging: Option<Averaging>,
    sensor_configuration: Option<(DataRate, LowPassFilter)>,
    moving_average: Option<MovingAverageConfiguration>,
    callback_period: u32,
    callback_configurations: Vec<CallbackConfiguration>,
    registrations: usize,
    air_pressure_callback: Option<AirPressureFn>,
    voltage_callback: Option<VoltageFn>,
    last_pushed: Vec<Option<i32>>,
}

struct Device {
    model: SensorModel,
    position: char,
    state: Mutex<State>,
}

impl Device {
    fn channels(&self) -> u8 {
        self.model.channels()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct Inner {
    connected: AtomicBool,
    devices: Mutex<HashMap<Uid, Arc<Device>>>,
}

/// Cheap to clone, all clones share the same devices.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<Inner>,
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl SensorHost for Connection {
    type Connection = Connection;

    fn ipcon(&self) -> &Self::Connection {
        self
    }
}

impl Connection {
    /// A connected connection without any devices.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                connected: AtomicBool::new(true),
                devices: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Relaxed)
    }

    /// Every call on a handle fails with [`Error::NotConnected`] until
    /// [`Connection::reconnect`] is called.
    pub fn disconnect(&self) {
        debug!("disconnecting");
        self.inner.connected.store(false, Ordering::Relaxed);
    }

    pub fn reconnect(&self) {
        debug!("reconnecting");
        self.inner.connected.store(true, Ordering::Relaxed);
    }

    fn devices(&self) -> MutexGuard<'_, HashMap<Uid, Arc<Device>>> {
        self.inner
            .devices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Plugs a new device into the next free port of the master brick.
    pub fn attach(&self, uid: Uid, model: SensorModel) -> Result<(), Error> {
        let mut devices = self.devices();
        if devices.contains_key(&uid) {
            return Err(Error::AlreadyAttached(uid));
        }
        let position = ('a'..='h')
            .find(|port| devices.values().all(|dev| dev.position != *port))
            .ok_or(Error::NoFreePort)?;

        let device = Device {
            model,
            position,
            state: Mutex::new(State::default()),
        };
        let channels = usize::from(device.channels());
        {
            let mut state = device.state();
            state.callback_configurations =
                vec![CallbackConfiguration::default(); channels];
            state.last_pushed = vec![None; channels];
        }

        debug!("attached {model} {uid} at port {position}");
        devices.insert(uid, Arc::new(device));
        Ok(())
    }

    pub fn detach(&self, uid: &Uid) -> Result<(), Error> {
        self.devices()
            .remove(uid)
            .map(|_| ())
            .ok_or_else(|| Error::DeviceNotFound(uid.clone()))
    }

    fn device(
        &self,
        uid: &Uid,
        expected: SensorModel,
    ) -> Result<Arc<Device>, Error> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        let device = self
            .devices()
            .get(uid)
            .cloned()
            .ok_or_else(|| Error::DeviceNotFound(uid.clone()))?;
        if device.model != expected {
            return Err(Error::WrongDevice {
                uid: uid.clone(),
                expected,
                found: device.model,
            });
        }
        Ok(device)
    }

    fn any_device(&self, uid: &Uid) -> Result<Arc<Device>, Error> {
        let model = self
            .devices()
            .get(uid)
            .map(|device| device.model)
            .ok_or_else(|| Error::DeviceNotFound(uid.clone()))?;
        self.device(uid, model)
    }

    pub fn snapshot(&self, uid: &Uid) -> Result<Snapshot, Error> {
        let device = self.any_device(uid)?;
        let state = device.state();
        Ok(Snapshot {
            averaging: state.averaging,
            sensor_configuration: state.sensor_configuration,
            moving_average: state.moving_average,
            callback_period: state.callback_period,
            callback_configurations: state.callback_configurations.clone(),
            registrations: state.registrations,
            has_callback: state.air_pressure_callback.is_some()
                || state.voltage_callback.is_some(),
        })
    }

    /// The period at which `channel` currently pushes values, whichever way
    /// it was configured.
    pub fn period(&self, uid: &Uid, channel: u8) -> Result<u32, Error> {
        let device = self.any_device(uid)?;
        check_channel(uid, &device, channel)?;
        let state = device.state();
        Ok(match device.model {
            SensorModel::Barometer => state.callback_period,
            SensorModel::BarometerV2 | SensorModel::IndustrialDualAnalogInV2 => {
                state.callback_configurations[usize::from(channel)].period
            }
        })
    }

    /// Delivers `raw` as a device would: only when the callback period is
    /// non zero and, if so configured, only when the value changed. Returns
    /// whether a callback ran.
    pub fn push(&self, uid: &Uid, channel: u8, raw: i32) -> Result<bool, Error> {
        let device = self.any_device(uid)?;
        check_channel(uid, &device, channel)?;
        {
            let mut state = device.state();
            let idx = usize::from(channel);
            let (period, value_has_to_change) = match device.model {
                SensorModel::Barometer => (state.callback_period, false),
                SensorModel::BarometerV2
                | SensorModel::IndustrialDualAnalogInV2 => {
                    let config = state.callback_configurations[idx];
                    (config.period, config.value_has_to_change)
                }
            };

            if period == 0 {
                trace!("callback disabled, dropping sample for {uid}");
                return Ok(false);
            }
            if value_has_to_change && state.last_pushed[idx] == Some(raw) {
                trace!("value did not change, dropping sample for {uid}");
                return Ok(false);
            }
            state.last_pushed[idx] = Some(raw);
        }
        fire(&device, channel, raw)
    }

    /// Runs the registered callback with `raw` regardless of configuration.
    /// Returns whether a callback was registered.
    pub fn emit(&self, uid: &Uid, channel: u8, raw: i32) -> Result<bool, Error> {
        let device = self.any_device(uid)?;
        check_channel(uid, &device, channel)?;
        fire(&device, channel, raw)
    }

    fn identity(&self, uid: &Uid, model: SensorModel) -> Result<Identity, Error> {
        let device = self.device(uid, model)?;
        let hardware_version = match model {
            SensorModel::Barometer => [1, 0, 0],
            SensorModel::BarometerV2 | SensorModel::IndustrialDualAnalogInV2 => {
                [2, 0, 0]
            }
        };
        Ok(Identity {
            uid: uid.clone(),
            connected_uid: MASTER_BRICK_UID.to_owned(),
            position: device.position,
            hardware_version,
            firmware_version: [2, 0, 4],
            device_identifier: model.device_identifier(),
        })
    }
}

fn check_channel(uid: &Uid, device: &Device, channel: u8) -> Result<(), Error> {
    if channel >= device.channels() {
        Err(Error::InvalidChannel {
            uid: uid.clone(),
            channel,
        })
    } else {
        Ok(())
    }
}

fn fire(device: &Device, channel: u8, raw: i32) -> Result<bool, Error> {
    // clone the callback out, it may call back into the connection
    let (air_pressure, voltage) = {
        let state = device.state();
        (
            state.air_pressure_callback.clone(),
            state.voltage_callback.clone(),
        )
    };

    match device.model {
        SensorModel::Barometer | SensorModel::BarometerV2 => {
            let Some(callback) = air_pressure else {
                return Ok(false);
            };
            callback(raw);
        }
        SensorModel::IndustrialDualAnalogInV2 => {
            let Some(callback) = voltage else {
                return Ok(false);
            };
            callback(channel, raw);
        }
    }
    Ok(true)
}
