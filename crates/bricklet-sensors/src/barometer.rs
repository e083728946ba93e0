use std::sync::Arc;

use tracing::{debug, instrument};

use crate::bricklet::{Averaging, BarometerBricklet};
use crate::sensor::{Consumer, DeviceError, Sensor, SensorBase, SensorHost};
use crate::{SensorModel, Uid};

pub(crate) fn deci_pascal_to_pascal(raw: i32) -> f64 {
    f64::from(raw) / 10.
}

/// Barometer Bricklet (1.0), reports air pressure in Pa.
#[derive(Debug)]
pub struct Barometer<B> {
    base: Arc<SensorBase>,
    bricklet: B,
}

impl<B: BarometerBricklet> Barometer<B> {
    pub const AVERAGING: Averaging = Averaging {
        moving_average_pressure: 25,
        average_pressure: 10,
        average_temperature: 10,
    };

    /// Sets up the device, a `callback_period` of zero disables pushing
    /// values.
    #[instrument(skip(host, consumer))]
    pub fn new(
        uid: Uid,
        host: &impl SensorHost<Connection = B::Connection>,
        consumer: Consumer,
        callback_period: u32,
    ) -> Result<Self, B::Error> {
        let bricklet = B::new(&uid, host.ipcon());
        let base = SensorBase::new(
            uid,
            SensorModel::Barometer,
            callback_period,
            consumer,
        );
        let sensor = Self { base, bricklet };

        sensor.bricklet.set_averaging(Self::AVERAGING)?;
        sensor.set_callback()?;
        debug!("{} ready", B::DEVICE_DISPLAY_NAME);
        Ok(sensor)
    }

    /// Same as [`Barometer::new`] with the callback disabled.
    pub fn with_defaults(
        uid: Uid,
        host: &impl SensorHost<Connection = B::Connection>,
        consumer: Consumer,
    ) -> Result<Self, B::Error> {
        Self::new(uid, host, consumer, 0)
    }
}

impl<B: BarometerBricklet> Sensor for Barometer<B> {
    type Bricklet = B;
    const MODEL: SensorModel = SensorModel::Barometer;

    fn convert(raw: i32) -> f64 {
        deci_pascal_to_pascal(raw)
    }

    fn base(&self) -> &SensorBase {
        &self.base
    }

    fn bricklet(&self) -> &B {
        &self.bricklet
    }

    fn sensor_callback_period(&self) -> Result<u32, DeviceError<Self>> {
        self.bricklet.get_air_pressure_callback_period()
    }

    fn set_callback(&self) -> Result<(), DeviceError<Self>> {
        self.bricklet
            .set_air_pressure_callback_period(self.base.callback_period())?;

        let base = Arc::clone(&self.base);
        self.bricklet
            .register_air_pressure_callback(Box::new(move |raw| {
                base.notify(Self::convert(raw));
            }));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::deci_pascal_to_pascal;

    #[test]
    fn converts_to_pascal() {
        assert!((deci_pascal_to_pascal(10132) - 1013.2).abs() < 1e-9);
        assert!((deci_pascal_to_pascal(-5) + 0.5).abs() < 1e-9);
        assert_eq!(deci_pascal_to_pascal(0), 0.);
    }
}
