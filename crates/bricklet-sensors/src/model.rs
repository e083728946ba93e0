use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

/// Every bricklet type there is a sensor for.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    strum::Display,
)]
pub enum SensorModel {
    Barometer,
    BarometerV2,
    IndustrialDualAnalogInV2,
}

impl SensorModel {
    /// The device identifier the vendor reports during enumeration.
    #[must_use]
    pub const fn device_identifier(self) -> u16 {
        match self {
            SensorModel::Barometer => 221,
            SensorModel::BarometerV2 => 2117,
            SensorModel::IndustrialDualAnalogInV2 => 2121,
        }
    }

    #[must_use]
    pub fn from_device_identifier(device_identifier: u16) -> Option<Self> {
        Self::iter().find(|model| model.device_identifier() == device_identifier)
    }

    /// Number of inputs a single bricklet of this model has.
    #[must_use]
    pub const fn channels(self) -> u8 {
        match self {
            SensorModel::Barometer | SensorModel::BarometerV2 => 1,
            SensorModel::IndustrialDualAnalogInV2 => 2,
        }
    }

    /// SI unit of the values this model's sensor forwards.
    #[must_use]
    pub const fn unit(self) -> &'static str {
        match self {
            SensorModel::Barometer | SensorModel::BarometerV2 => "Pa",
            SensorModel::IndustrialDualAnalogInV2 => "K",
        }
    }

    /// Describes the measurand, as in "Registering barometer sensor".
    #[must_use]
    pub const fn sensor_type(self) -> &'static str {
        match self {
            SensorModel::Barometer | SensorModel::BarometerV2 => "barometer",
            SensorModel::IndustrialDualAnalogInV2 => "temperature",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            SensorModel::Barometer => "Barometer Bricklet",
            SensorModel::BarometerV2 => "Barometer Bricklet 2.0",
            SensorModel::IndustrialDualAnalogInV2 => {
                "Industrial Dual Analog In Bricklet 2.0"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_identifiers_are_unique() {
        for model in SensorModel::iter() {
            assert_eq!(
                SensorModel::from_device_identifier(model.device_identifier()),
                Some(model)
            );
        }
        assert_eq!(SensorModel::from_device_identifier(13), None);
    }

    #[test]
    fn barometers_share_metadata() {
        assert_eq!(SensorModel::Barometer.unit(), "Pa");
        assert_eq!(SensorModel::BarometerV2.unit(), "Pa");
        assert_eq!(SensorModel::Barometer.sensor_type(), "barometer");
        assert_eq!(SensorModel::BarometerV2.sensor_type(), "barometer");
    }
}
