use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::bricklet::{Bricklet, Identity};
use crate::{SensorModel, Uid};

/// Receives every converted reading. Called from the vendor's callback
/// thread so it should return quickly.
pub type Consumer = Arc<dyn Fn(Reading) + Send + Sync>;

/// Error a sensor's vendor handle returns, passed on unchanged.
pub type DeviceError<S> = <<S as Sensor>::Bricklet as Bricklet>::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub uid: Uid,
    pub model: SensorModel,
    /// In the SI unit returned by [`Reading::unit`]
    pub value: f64,
}

impl Reading {
    #[must_use]
    pub fn unit(&self) -> &'static str {
        self.model.unit()
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}): {} {}",
            self.model.sensor_type(),
            self.uid,
            self.model,
            self.value,
            self.unit()
        )
    }
}

/// Owns the vendor connection sensors are created on.
pub trait SensorHost {
    type Connection;

    fn ipcon(&self) -> &Self::Connection;
}

/// State every sensor shares with the callback it registers.
pub struct SensorBase {
    uid: Uid,
    model: SensorModel,
    callback_period: u32,
    consumer: Consumer,
}

impl fmt::Debug for SensorBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SensorBase")
            .field("uid", &self.uid)
            .field("model", &self.model)
            .field("callback_period", &self.callback_period)
            .finish_non_exhaustive()
    }
}

impl SensorBase {
    pub(crate) fn new(
        uid: Uid,
        model: SensorModel,
        callback_period: u32,
        consumer: Consumer,
    ) -> Arc<Self> {
        Arc::new(Self {
            uid,
            model,
            callback_period,
            consumer,
        })
    }

    #[must_use]
    pub fn uid(&self) -> &Uid {
        &self.uid
    }

    #[must_use]
    pub fn model(&self) -> SensorModel {
        self.model
    }

    /// The period requested at construction, not necessarily what the
    /// device currently uses.
    #[must_use]
    pub fn callback_period(&self) -> u32 {
        self.callback_period
    }

    /// Hands an already converted value to the consumer.
    pub fn notify(&self, value: f64) {
        trace!(uid = %self.uid, value, unit = self.model.unit(), "new reading");
        (self.consumer)(Reading {
            uid: self.uid.clone(),
            model: self.model,
            value,
        });
    }
}

/// A vendor bricklet wrapped such that it reports in SI units.
///
/// Implementors provide the conversion and the device specific callback
/// setup; the rest follows from those.
pub trait Sensor {
    type Bricklet: Bricklet;
    const MODEL: SensorModel;

    /// Converts a raw value as pushed by the bricklet into [`Sensor::unit`].
    fn convert(raw: i32) -> f64;

    fn base(&self) -> &SensorBase;
    fn bricklet(&self) -> &Self::Bricklet;

    /// The callback period in ms the device is currently using.
    fn sensor_callback_period(&self) -> Result<u32, DeviceError<Self>>;

    /// Configures the device to push values every [`Sensor::callback_period`]
    /// ms and registers [`Sensor::callback`] with it. Calling this again
    /// replaces the earlier registration.
    fn set_callback(&self) -> Result<(), DeviceError<Self>>;

    fn unit(&self) -> &'static str {
        Self::MODEL.unit()
    }

    fn sensor_type(&self) -> &'static str {
        Self::MODEL.sensor_type()
    }

    fn uid(&self) -> &Uid {
        self.base().uid()
    }

    fn callback_period(&self) -> u32 {
        self.base().callback_period()
    }

    /// Entry point for values coming from the device.
    fn callback(&self, raw: i32) {
        self.base().notify(Self::convert(raw));
    }

    fn get_identity(&self) -> Result<Identity, DeviceError<Self>> {
        self.bricklet().get_identity()
    }
}
