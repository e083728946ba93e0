//! Vendor style handles, one per supported bricklet type.

use std::sync::Arc;

use bricklet_sensors::bricklet::{
    AirPressureCallback, Averaging, BarometerBricklet, BarometerV2Bricklet,
    Bricklet, CallbackConfiguration, DataRate, Identity,
    IndustrialDualAnalogInV2Bricklet, LowPassFilter,
    MovingAverageConfiguration, VoltageCallback,
};
use bricklet_sensors::{SensorModel, Uid};
use tracing::trace;

use crate::{check_channel, Connection, Error, State};

#[derive(Debug, Clone)]
struct Handle {
    uid: Uid,
    connection: Connection,
}

impl Handle {
    fn with_state<T>(
        &self,
        model: SensorModel,
        f: impl FnOnce(&mut State) -> T,
    ) -> Result<T, Error> {
        let device = self.connection.device(&self.uid, model)?;
        let mut state = device.state();
        Ok(f(&mut state))
    }

    fn with_channel<T>(
        &self,
        model: SensorModel,
        channel: u8,
        f: impl FnOnce(&mut State) -> T,
    ) -> Result<T, Error> {
        let device = self.connection.device(&self.uid, model)?;
        check_channel(&self.uid, &device, channel)?;
        let mut state = device.state();
        Ok(f(&mut state))
    }

    // registration can not fail in the vendor api either, a missing device
    // simply never calls back
    fn register(&self, f: impl FnOnce(&mut State)) {
        let device = self.connection.devices().get(&self.uid).cloned();
        let Some(device) = device else {
            trace!("registering callback for absent device {}", self.uid);
            return;
        };
        let mut state = device.state();
        state.registrations += 1;
        f(&mut state);
    }
}

#[derive(Debug, Clone)]
pub struct BrickletBarometer(Handle);

impl Bricklet for BrickletBarometer {
    type Connection = Connection;
    type Error = Error;

    const DEVICE_IDENTIFIER: u16 = SensorModel::Barometer.device_identifier();
    const DEVICE_DISPLAY_NAME: &'static str =
        SensorModel::Barometer.display_name();

    fn new(uid: &Uid, ipcon: &Connection) -> Self {
        Self(Handle {
            uid: uid.clone(),
            connection: ipcon.clone(),
        })
    }

    fn get_identity(&self) -> Result<Identity, Error> {
        self.0.connection.identity(&self.0.uid, SensorModel::Barometer)
    }
}

impl BarometerBricklet for BrickletBarometer {
    fn set_averaging(&self, averaging: Averaging) -> Result<(), Error> {
        self.0.with_state(SensorModel::Barometer, |state| {
            state.averaging = Some(averaging);
        })
    }

    fn set_air_pressure_callback_period(&self, period: u32) -> Result<(), Error> {
        self.0.with_state(SensorModel::Barometer, |state| {
            state.callback_period = period;
        })
    }

    fn get_air_pressure_callback_period(&self) -> Result<u32, Error> {
        self.0
            .with_state(SensorModel::Barometer, |state| state.callback_period)
    }

    fn register_air_pressure_callback(&self, callback: AirPressureCallback) {
        self.0.register(|state| {
            state.air_pressure_callback = Some(Arc::from(callback));
        });
    }
}

#[derive(Debug, Clone)]
pub struct BrickletBarometerV2(Handle);

impl Bricklet for BrickletBarometerV2 {
    type Connection = Connection;
    type Error = Error;

    const DEVICE_IDENTIFIER: u16 = SensorModel::BarometerV2.device_identifier();
    const DEVICE_DISPLAY_NAME: &'static str =
        SensorModel::BarometerV2.display_name();

    fn new(uid: &Uid, ipcon: &Connection) -> Self {
        Self(Handle {
            uid: uid.clone(),
            connection: ipcon.clone(),
        })
    }

    fn get_identity(&self) -> Result<Identity, Error> {
        self.0
            .connection
            .identity(&self.0.uid, SensorModel::BarometerV2)
    }
}

impl BarometerV2Bricklet for BrickletBarometerV2 {
    fn set_sensor_configuration(
        &self,
        data_rate: DataRate,
        air_pressure_low_pass_filter: LowPassFilter,
    ) -> Result<(), Error> {
        self.0.with_state(SensorModel::BarometerV2, |state| {
            state.sensor_configuration =
                Some((data_rate, air_pressure_low_pass_filter));
        })
    }

    fn set_moving_average_configuration(
        &self,
        config: MovingAverageConfiguration,
    ) -> Result<(), Error> {
        self.0.with_state(SensorModel::BarometerV2, |state| {
            state.moving_average = Some(config);
        })
    }

    fn set_air_pressure_callback_configuration(
        &self,
        config: CallbackConfiguration,
    ) -> Result<(), Error> {
        self.0.with_state(SensorModel::BarometerV2, |state| {
            state.callback_configurations[0] = config;
            state.last_pushed[0] = None;
        })
    }

    fn get_air_pressure_callback_configuration(
        &self,
    ) -> Result<CallbackConfiguration, Error> {
        self.0.with_state(SensorModel::BarometerV2, |state| {
            state.callback_configurations[0]
        })
    }

    fn register_air_pressure_callback(&self, callback: AirPressureCallback) {
        self.0.register(|state| {
            state.air_pressure_callback = Some(Arc::from(callback));
        });
    }
}

#[derive(Debug, Clone)]
pub struct BrickletIndustrialDualAnalogInV2(Handle);

impl Bricklet for BrickletIndustrialDualAnalogInV2 {
    type Connection = Connection;
    type Error = Error;

    const DEVICE_IDENTIFIER: u16 =
        SensorModel::IndustrialDualAnalogInV2.device_identifier();
    const DEVICE_DISPLAY_NAME: &'static str =
        SensorModel::IndustrialDualAnalogInV2.display_name();

    fn new(uid: &Uid, ipcon: &Connection) -> Self {
        Self(Handle {
            uid: uid.clone(),
            connection: ipcon.clone(),
        })
    }

    fn get_identity(&self) -> Result<Identity, Error> {
        self.0
            .connection
            .identity(&self.0.uid, SensorModel::IndustrialDualAnalogInV2)
    }
}

impl IndustrialDualAnalogInV2Bricklet for BrickletIndustrialDualAnalogInV2 {
    fn set_voltage_callback_configuration(
        &self,
        channel: u8,
        config: CallbackConfiguration,
    ) -> Result<(), Error> {
        let model = SensorModel::IndustrialDualAnalogInV2;
        self.0.with_channel(model, channel, |state| {
            state.callback_configurations[usize::from(channel)] = config;
            state.last_pushed[usize::from(channel)] = None;
        })
    }

    fn get_voltage_callback_configuration(
        &self,
        channel: u8,
    ) -> Result<CallbackConfiguration, Error> {
        let model = SensorModel::IndustrialDualAnalogInV2;
        self.0.with_channel(model, channel, |state| {
            state.callback_configurations[usize::from(channel)]
        })
    }

    fn register_voltage_callback(&self, callback: VoltageCallback) {
        self.0.register(|state| {
            state.voltage_callback = Some(Arc::from(callback));
        });
    }
}
