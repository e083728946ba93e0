//! The slice of the Tinkerforge bindings the sensors talk to.
//!
//! Each trait mirrors the calls of one vendor bricklet type. Implementations
//! report failures through their own error type, the sensors hand those back
//! to the caller unchanged.

use crate::Uid;

pub type AirPressureCallback = Box<dyn Fn(i32) + Send + Sync>;
/// Called with the channel and the raw value of that channel.
pub type VoltageCallback = Box<dyn Fn(u8, i32) + Send + Sync>;

/// What a bricklet reports about itself, see `get_identity` in the vendor
/// documentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: Uid,
    /// Uid of the brick this bricklet is attached to, `"0"` if the device is
    /// the top of a stack.
    pub connected_uid: String,
    /// Port on the brick: `'a'` to `'h'`.
    pub position: char,
    pub hardware_version: [u8; 3],
    pub firmware_version: [u8; 3],
    pub device_identifier: u16,
}

/// Decides when a bricklet with a callback configuration pushes a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThresholdOption {
    /// No threshold, push every period
    #[default]
    Off,
    Outside,
    Inside,
    Smaller,
    Greater,
}

impl ThresholdOption {
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            ThresholdOption::Off => 'x',
            ThresholdOption::Outside => 'o',
            ThresholdOption::Inside => 'i',
            ThresholdOption::Smaller => '<',
            ThresholdOption::Greater => '>',
        }
    }
}

impl TryFrom<char> for ThresholdOption {
    type Error = char;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        Ok(match value {
            'x' => ThresholdOption::Off,
            'o' => ThresholdOption::Outside,
            'i' => ThresholdOption::Inside,
            '<' => ThresholdOption::Smaller,
            '>' => ThresholdOption::Greater,
            other => return Err(other),
        })
    }
}

/// Periodic push settings used by the 2.0 generation of bricklets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackConfiguration {
    /// Milliseconds between pushes, 0 disables the callback
    pub period: u32,
    /// Only push if the value changed since the previous push
    pub value_has_to_change: bool,
    pub option: ThresholdOption,
    pub min: i32,
    pub max: i32,
}

impl CallbackConfiguration {
    /// Push on change, at most once every `period` ms, no thresholds.
    #[must_use]
    pub const fn on_change(period: u32) -> Self {
        Self {
            period,
            value_has_to_change: true,
            option: ThresholdOption::Off,
            min: 0,
            max: 0,
        }
    }
}

impl Default for CallbackConfiguration {
    fn default() -> Self {
        Self {
            period: 0,
            value_has_to_change: false,
            option: ThresholdOption::Off,
            min: 0,
            max: 0,
        }
    }
}

/// Barometer (1.0) averaging, each length is in samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Averaging {
    pub moving_average_pressure: u8,
    pub average_pressure: u8,
    pub average_temperature: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovingAverageConfiguration {
    pub air_pressure: u16,
    pub temperature: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataRate {
    Off,
    #[default]
    Hz1,
    Hz10,
    Hz25,
    Hz50,
    Hz75,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LowPassFilter {
    Off,
    OneNinth,
    #[default]
    OneTwentieth,
}

/// Functionality shared by every bricklet handle.
pub trait Bricklet: Send + Sync + 'static {
    /// The shared vendor connection (`ipcon`) handles are created on.
    type Connection;
    type Error: std::error::Error + Send + Sync + 'static;

    const DEVICE_IDENTIFIER: u16;
    const DEVICE_DISPLAY_NAME: &'static str;

    /// Creating a handle does no io, calls on it may still fail if no device
    /// with this uid is attached.
    fn new(uid: &Uid, ipcon: &Self::Connection) -> Self
    where
        Self: Sized;

    fn get_identity(&self) -> Result<Identity, Self::Error>;
}

pub trait BarometerBricklet: Bricklet {
    fn set_averaging(&self, averaging: Averaging) -> Result<(), Self::Error>;
    fn set_air_pressure_callback_period(
        &self,
        period: u32,
    ) -> Result<(), Self::Error>;
    fn get_air_pressure_callback_period(&self) -> Result<u32, Self::Error>;
    /// Replaces the previously registered air pressure callback, if any.
    /// Raw values are in units of 0.001 mbar.
    fn register_air_pressure_callback(&self, callback: AirPressureCallback);
}

pub trait BarometerV2Bricklet: Bricklet {
    fn set_sensor_configuration(
        &self,
        data_rate: DataRate,
        air_pressure_low_pass_filter: LowPassFilter,
    ) -> Result<(), Self::Error>;
    fn set_moving_average_configuration(
        &self,
        config: MovingAverageConfiguration,
    ) -> Result<(), Self::Error>;
    fn set_air_pressure_callback_configuration(
        &self,
        config: CallbackConfiguration,
    ) -> Result<(), Self::Error>;
    fn get_air_pressure_callback_configuration(
        &self,
    ) -> Result<CallbackConfiguration, Self::Error>;
    /// Replaces the previously registered air pressure callback, if any.
    /// Raw values are in units of 0.001 hPa.
    fn register_air_pressure_callback(&self, callback: AirPressureCallback);
}

pub trait IndustrialDualAnalogInV2Bricklet: Bricklet {
    fn set_voltage_callback_configuration(
        &self,
        channel: u8,
        config: CallbackConfiguration,
    ) -> Result<(), Self::Error>;
    fn get_voltage_callback_configuration(
        &self,
        channel: u8,
    ) -> Result<CallbackConfiguration, Self::Error>;
    /// Replaces the previously registered voltage callback, if any. The
    /// callback fires for every channel with a non zero period.
    fn register_voltage_callback(&self, callback: VoltageCallback);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_option_uses_vendor_characters() {
        assert_eq!(CallbackConfiguration::on_change(10).option.as_char(), 'x');
        assert_eq!(ThresholdOption::try_from('<'), Ok(ThresholdOption::Smaller));
        assert_eq!(ThresholdOption::try_from('?'), Err('?'));
    }
}
