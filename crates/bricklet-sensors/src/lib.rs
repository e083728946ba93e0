//! Sensors on top of Tinkerforge bricklets.
//!
//! Every sensor owns the vendor handle for one bricklet, configures it once
//! when created and from then on forwards each value the device pushes to a
//! [`Consumer`] after converting it to SI units. Device io, threading and
//! error reporting stay with the vendor implementation of the traits in
//! [`bricklet`]: a failing call returns that implementation's error as is.
//!
//! ```ignore
//! let consumer: Consumer = Arc::new(|reading| println!("{reading}"));
//! let uid = "Dq2".parse()?;
//! let barometer = Barometer::<BarometerHandle>::new(uid, &host, consumer, 1000)?;
//! assert_eq!(barometer.unit(), "Pa");
//! ```

#![allow(clippy::missing_errors_doc)]

pub mod bricklet;

mod barometer;
mod barometer_v2;
mod industrial_dual_analog_in_v2;
mod model;
mod sensor;
mod uid;

pub use barometer::Barometer;
pub use barometer_v2::BarometerV2;
pub use bricklet::{Bricklet, Identity};
pub use industrial_dual_analog_in_v2::IndustrialDualAnalogInV2;
pub use model::SensorModel;
pub use sensor::{
    Consumer, DeviceError, Reading, Sensor, SensorBase, SensorHost,
};
pub use uid::{Uid, UidError};
