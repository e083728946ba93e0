use std::collections::HashMap;

use bricklet_sensors::{
    Barometer, BarometerV2, Consumer, Identity, IndustrialDualAnalogInV2,
    Sensor, SensorHost, SensorModel, Uid,
};
use bricklet_sim::{
    BrickletBarometer, BrickletBarometerV2, BrickletIndustrialDualAnalogInV2,
    Connection,
};
use tracing::{info, instrument};

use crate::config::SensorConfig;

#[derive(Debug, thiserror::Error)]
pub(crate) enum RegistryError {
    #[error("A sensor with uid {0} is already registered")]
    Duplicate(Uid),
    #[error("Could not set up {model} {uid}")]
    Setup {
        uid: Uid,
        model: SensorModel,
        #[source]
        source: bricklet_sim::Error,
    },
}

#[derive(Debug)]
pub(crate) enum AttachedSensor {
    Barometer(Barometer<BrickletBarometer>),
    BarometerV2(BarometerV2<BrickletBarometerV2>),
    AnalogIn(IndustrialDualAnalogInV2<BrickletIndustrialDualAnalogInV2>),
}

impl AttachedSensor {
    fn create(
        config: &SensorConfig,
        host: &Host,
        consumer: Consumer,
    ) -> Result<Self, bricklet_sim::Error> {
        let SensorConfig {
            model,
            uid,
            callback_period,
            channel,
            ..
        } = config.clone();

        Ok(match model {
            SensorModel::Barometer => Self::Barometer(Barometer::new(
                uid,
                host,
                consumer,
                callback_period,
            )?),
            SensorModel::BarometerV2 => Self::BarometerV2(BarometerV2::new(
                uid,
                host,
                consumer,
                callback_period,
            )?),
            SensorModel::IndustrialDualAnalogInV2 => {
                Self::AnalogIn(IndustrialDualAnalogInV2::new(
                    uid,
                    host,
                    consumer,
                    callback_period,
                    channel,
                )?)
            }
        })
    }

    pub(crate) fn uid(&self) -> &Uid {
        match self {
            Self::Barometer(s) => s.uid(),
            Self::BarometerV2(s) => s.uid(),
            Self::AnalogIn(s) => s.uid(),
        }
    }

    pub(crate) fn sensor_type(&self) -> &'static str {
        match self {
            Self::Barometer(s) => s.sensor_type(),
            Self::BarometerV2(s) => s.sensor_type(),
            Self::AnalogIn(s) => s.sensor_type(),
        }
    }

    pub(crate) fn unit(&self) -> &'static str {
        match self {
            Self::Barometer(s) => s.unit(),
            Self::BarometerV2(s) => s.unit(),
            Self::AnalogIn(s) => s.unit(),
        }
    }

    pub(crate) fn sensor_callback_period(
        &self,
    ) -> Result<u32, bricklet_sim::Error> {
        match self {
            Self::Barometer(s) => s.sensor_callback_period(),
            Self::BarometerV2(s) => s.sensor_callback_period(),
            Self::AnalogIn(s) => s.sensor_callback_period(),
        }
    }

    pub(crate) fn get_identity(&self) -> Result<Identity, bricklet_sim::Error> {
        match self {
            Self::Barometer(s) => s.get_identity(),
            Self::BarometerV2(s) => s.get_identity(),
            Self::AnalogIn(s) => s.get_identity(),
        }
    }

    /// The channel values come from, always 0 for single channel bricklets.
    pub(crate) fn channel(&self) -> u8 {
        match self {
            Self::Barometer(_) | Self::BarometerV2(_) => 0,
            Self::AnalogIn(s) => s.channel(),
        }
    }
}

/// Owns the connection and every sensor created on it. Each uid maps to
/// exactly one sensor.
#[derive(Debug)]
pub(crate) struct Host {
    ipcon: Connection,
    sensors: HashMap<Uid, AttachedSensor>,
}

impl SensorHost for Host {
    type Connection = Connection;

    fn ipcon(&self) -> &Connection {
        &self.ipcon
    }
}

impl Host {
    pub(crate) fn new(ipcon: Connection) -> Self {
        Self {
            ipcon,
            sensors: HashMap::new(),
        }
    }

    #[instrument(skip_all, fields(uid = %config.uid))]
    pub(crate) fn add(
        &mut self,
        config: &SensorConfig,
        consumer: Consumer,
    ) -> Result<&AttachedSensor, RegistryError> {
        if self.sensors.contains_key(&config.uid) {
            return Err(RegistryError::Duplicate(config.uid.clone()));
        }

        let sensor =
            AttachedSensor::create(config, self, consumer).map_err(|source| {
                RegistryError::Setup {
                    uid: config.uid.clone(),
                    model: config.model,
                    source,
                }
            })?;
        info!(
            "Registering {} sensor, values in {}",
            sensor.sensor_type(),
            sensor.unit()
        );
        Ok(self.sensors.entry(config.uid.clone()).or_insert(sensor))
    }

    pub(crate) fn sensors(&self) -> impl Iterator<Item = &AttachedSensor> {
        self.sensors.values()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use bricklet_sensors::Reading;

    use super::*;
    use crate::config::parse;

    fn setup(text: &str) -> (Connection, Host, Vec<SensorConfig>) {
        let config = parse(text).unwrap();
        let connection = Connection::new();
        for sensor in &config.sensors {
            connection.attach(sensor.uid.clone(), sensor.model).unwrap();
        }
        let host = Host::new(connection.clone());
        (connection, host, config.sensors)
    }

    fn collecting() -> (Arc<Mutex<Vec<Reading>>>, Consumer) {
        let readings = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&readings);
        let consumer: Consumer =
            Arc::new(move |reading| sink.lock().unwrap().push(reading));
        (readings, consumer)
    }

    #[test]
    fn duplicate_uid_is_rejected() {
        let (_conn, mut host, sensors) = setup(
            r#"(sensors: [
                (model: Barometer, uid: "Dq2", callback_period: 100),
                (model: Barometer, uid: "Dq2", callback_period: 200),
            ])"#,
        );
        let (_, consumer) = collecting();

        host.add(&sensors[0], Arc::clone(&consumer)).unwrap();
        let err = host.add(&sensors[1], consumer).unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate(_)));
        assert_eq!(host.sensors().count(), 1);
    }

    #[test]
    fn missing_device_fails_setup() {
        let config = parse(r#"(sensors: [(model: Barometer, uid: "Dq2")])"#)
            .unwrap();
        let mut host = Host::new(Connection::new());
        let (_, consumer) = collecting();

        let err = host.add(&config.sensors[0], consumer).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Setup {
                source: bricklet_sim::Error::DeviceNotFound(_),
                ..
            }
        ));
    }

    #[test]
    fn every_model_forwards_in_si() {
        let (conn, mut host, sensors) = setup(
            r#"(sensors: [
                (model: Barometer, uid: "Dq2", callback_period: 100),
                (model: BarometerV2, uid: "LmK", callback_period: 100),
                (model: IndustrialDualAnalogInV2, uid: "Fx7",
                    callback_period: 100, channel: 1),
            ])"#,
        );
        let (readings, consumer) = collecting();
        for sensor in &sensors {
            let attached = host.add(sensor, Arc::clone(&consumer)).unwrap();
            assert_eq!(attached.sensor_callback_period().unwrap(), 100);
        }

        conn.push(&sensors[0].uid, 0, 10132).unwrap();
        conn.push(&sensors[1].uid, 0, 10132).unwrap();
        conn.push(&sensors[2].uid, 1, 2500).unwrap();

        let readings = readings.lock().unwrap();
        let values: Vec<_> = readings.iter().map(|r| r.value).collect();
        let expected = [1013.2, 1013.2, 298.15];
        for (value, expected) in values.iter().zip(expected) {
            assert!((value - expected).abs() < 1e-9, "{value} != {expected}");
        }
        assert_eq!(readings[2].unit(), "K");
    }
}
