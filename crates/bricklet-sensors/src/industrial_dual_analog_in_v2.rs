use std::sync::Arc;

use tracing::{debug, instrument, trace};

use crate::bricklet::{CallbackConfiguration, IndustrialDualAnalogInV2Bricklet};
use crate::sensor::{Consumer, DeviceError, Sensor, SensorBase, SensorHost};
use crate::{SensorModel, Uid};

pub(crate) fn centi_celsius_to_kelvin(raw: i32) -> f64 {
    (f64::from(raw) + 27315.) / 100.
}

/// One channel of an Industrial Dual Analog In Bricklet 2.0.
///
/// The channel is expected to carry a temperature transmitter whose output is
/// scaled to 0.01 °C per raw unit, values are forwarded in kelvin.
#[derive(Debug)]
pub struct IndustrialDualAnalogInV2<B> {
    base: Arc<SensorBase>,
    bricklet: B,
    channel: u8,
}

impl<B: IndustrialDualAnalogInV2Bricklet> IndustrialDualAnalogInV2<B> {
    /// Sets up `channel` on the device, a `callback_period` of zero disables
    /// pushing values.
    #[instrument(skip(host, consumer))]
    pub fn new(
        uid: Uid,
        host: &impl SensorHost<Connection = B::Connection>,
        consumer: Consumer,
        callback_period: u32,
        channel: u8,
    ) -> Result<Self, B::Error> {
        let bricklet = B::new(&uid, host.ipcon());
        let base = SensorBase::new(
            uid,
            SensorModel::IndustrialDualAnalogInV2,
            callback_period,
            consumer,
        );
        let sensor = Self {
            base,
            bricklet,
            channel,
        };

        sensor.set_callback()?;
        debug!("{} ready", B::DEVICE_DISPLAY_NAME);
        Ok(sensor)
    }

    /// Channel 0 with the callback disabled.
    pub fn with_defaults(
        uid: Uid,
        host: &impl SensorHost<Connection = B::Connection>,
        consumer: Consumer,
    ) -> Result<Self, B::Error> {
        Self::new(uid, host, consumer, 0, 0)
    }

    #[must_use]
    pub fn channel(&self) -> u8 {
        self.channel
    }
}

impl<B: IndustrialDualAnalogInV2Bricklet> Sensor
    for IndustrialDualAnalogInV2<B>
{
    type Bricklet = B;
    const MODEL: SensorModel = SensorModel::IndustrialDualAnalogInV2;

    fn convert(raw: i32) -> f64 {
        centi_celsius_to_kelvin(raw)
    }

    fn base(&self) -> &SensorBase {
        &self.base
    }

    fn bricklet(&self) -> &B {
        &self.bricklet
    }

    fn sensor_callback_period(&self) -> Result<u32, DeviceError<Self>> {
        self.bricklet
            .get_voltage_callback_configuration(self.channel)
            .map(|config| config.period)
    }

    fn set_callback(&self) -> Result<(), DeviceError<Self>> {
        let config =
            CallbackConfiguration::on_change(self.base.callback_period());
        self.bricklet
            .set_voltage_callback_configuration(self.channel, config)?;

        let base = Arc::clone(&self.base);
        let ours = self.channel;
        self.bricklet
            .register_voltage_callback(Box::new(move |channel, raw| {
                if channel != ours {
                    trace!("ignoring value for channel {channel}");
                    return;
                }
                base.notify(Self::convert(raw));
            }));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::centi_celsius_to_kelvin;

    #[test]
    fn converts_to_kelvin() {
        assert!((centi_celsius_to_kelvin(2500) - 298.15).abs() < 1e-9);
        assert!((centi_celsius_to_kelvin(0) - 273.15).abs() < 1e-9);
        assert!(centi_celsius_to_kelvin(-27315).abs() < 1e-9);
    }
}
