use std::sync::Arc;

use tracing::{debug, instrument};

use crate::barometer::deci_pascal_to_pascal;
use crate::bricklet::{
    BarometerV2Bricklet, CallbackConfiguration, DataRate, LowPassFilter,
    MovingAverageConfiguration,
};
use crate::sensor::{Consumer, DeviceError, Sensor, SensorBase, SensorHost};
use crate::{SensorModel, Uid};

/// Barometer Bricklet 2.0, reports air pressure in Pa.
#[derive(Debug)]
pub struct BarometerV2<B> {
    base: Arc<SensorBase>,
    bricklet: B,
}

impl<B: BarometerV2Bricklet> BarometerV2<B> {
    pub const DATA_RATE: DataRate = DataRate::Hz1;
    pub const LOW_PASS_FILTER: LowPassFilter = LowPassFilter::OneTwentieth;
    pub const MOVING_AVERAGE: MovingAverageConfiguration =
        MovingAverageConfiguration {
            air_pressure: 20,
            temperature: 20,
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
            SensorModel::BarometerV2,
            callback_period,
            consumer,
        );
        let sensor = Self { base, bricklet };

        sensor
            .bricklet
            .set_sensor_configuration(Self::DATA_RATE, Self::LOW_PASS_FILTER)?;
        sensor
            .bricklet
            .set_moving_average_configuration(Self::MOVING_AVERAGE)?;
        sensor.set_callback()?;
        debug!("{} ready", B::DEVICE_DISPLAY_NAME);
        Ok(sensor)
    }

    pub fn with_defaults(
        uid: Uid,
        host: &impl SensorHost<Connection = B::Connection>,
        consumer: Consumer,
    ) -> Result<Self, B::Error> {
        Self::new(uid, host, consumer, 0)
    }
}

impl<B: BarometerV2Bricklet> Sensor for BarometerV2<B> {
    type Bricklet = B;
    const MODEL: SensorModel = SensorModel::BarometerV2;

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
        self.bricklet
            .get_air_pressure_callback_configuration()
            .map(|config| config.period)
    }

    fn set_callback(&self) -> Result<(), DeviceError<Self>> {
        let config =
            CallbackConfiguration::on_change(self.base.callback_period());
        self.bricklet.set_air_pressure_callback_configuration(config)?;

        let base = Arc::clone(&self.base);
        self.bricklet
            .register_air_pressure_callback(Box::new(move |raw| {
                base.notify(Self::convert(raw));
            }));
        Ok(())
    }
}
