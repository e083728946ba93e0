use std::path::Path;

use bricklet_sensors::{SensorModel, Uid};
use bricklet_sim::Signal;
use color_eyre::eyre::{bail, Context};
use color_eyre::{Result, Section};
use serde::Deserialize;
use tokio::fs;

#[derive(Debug, Deserialize)]
pub(crate) struct Config {
    pub(crate) sensors: Vec<SensorConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SensorConfig {
    pub(crate) model: SensorModel,
    pub(crate) uid: Uid,
    /// In ms, zero disables the callback
    #[serde(default)]
    pub(crate) callback_period: u32,
    /// Only used by the analog in bricklet
    #[serde(default)]
    pub(crate) channel: u8,
    #[serde(default)]
    pub(crate) simulate: Option<Simulate>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct Simulate {
    base: i32,
    #[serde(default)]
    jitter: u32,
}

impl From<Simulate> for Signal {
    fn from(Simulate { base, jitter }: Simulate) -> Self {
        Signal { base, jitter }
    }
}

impl SensorConfig {
    fn validate(&self) -> Result<()> {
        if self.channel >= self.model.channels() {
            bail!(
                "A {} has no channel {} (uid: {})",
                self.model,
                self.channel,
                self.uid
            );
        }
        Ok(())
    }
}

pub(crate) fn parse(text: &str) -> Result<Config> {
    let config: Config =
        ron::from_str(text).wrap_err("Could not deserialize config")?;
    for sensor in &config.sensors {
        sensor.validate().wrap_err("Invalid sensor in config")?;
    }
    Ok(config)
}

pub(crate) async fn load(path: &Path) -> Result<Config> {
    let text = fs::read_to_string(path)
        .await
        .wrap_err("Could not read config")
        .with_note(|| format!("path: {}", path.display()))?;
    parse(&text).with_note(|| format!("path: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_config_parses() {
        let config = parse(include_str!("../sensors.ron")).unwrap();
        assert_eq!(config.sensors.len(), 3);
        assert_eq!(config.sensors[2].channel, 1);
        assert_eq!(config.sensors[0].callback_period, 1000);
    }

    #[test]
    fn defaults_apply() {
        let config =
            parse(r#"(sensors: [(model: BarometerV2, uid: "LmK")])"#).unwrap();
        let sensor = &config.sensors[0];
        assert_eq!(sensor.callback_period, 0);
        assert_eq!(sensor.channel, 0);
        assert!(sensor.simulate.is_none());
    }

    #[test]
    fn invalid_uid_is_rejected() {
        assert!(parse(r#"(sensors: [(model: Barometer, uid: "0OIl")])"#)
            .is_err());
    }

    #[test]
    fn barometer_has_one_channel() {
        let text = r#"(sensors: [(model: Barometer, uid: "Dq2", channel: 1)])"#;
        assert!(parse(text).is_err());
    }
}
