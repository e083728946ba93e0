use std::time::Duration;

use bricklet_sensors::Uid;
use rand::Rng;
use tracing::{debug, instrument};

use crate::{Connection, Error};

/// How often to look again at a device whose callback is disabled.
const DISABLED_POLL: Duration = Duration::from_millis(250);

/// Raw values a simulated device produces: `base` plus uniform noise of at
/// most `jitter` in either direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signal {
    pub base: i32,
    pub jitter: u32,
}

impl Signal {
    #[must_use]
    pub fn constant(base: i32) -> Self {
        Self { base, jitter: 0 }
    }

    pub fn sample(&self) -> i32 {
        if self.jitter == 0 {
            return self.base;
        }
        let jitter = i64::from(self.jitter);
        let noise = rand::rng().random_range(-jitter..=jitter);
        let value = i64::from(self.base) + noise;
        value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
    }
}

/// Pushes a sample from `signal` every callback period, as configured on
/// the device at that moment. Returns once a push fails, for example
/// because the connection went down or the device got detached.
#[instrument(skip(connection))]
pub async fn drive(
    connection: Connection,
    uid: Uid,
    channel: u8,
    signal: Signal,
) -> Error {
    loop {
        let period = match connection.period(&uid, channel) {
            Ok(period) => period,
            Err(err) => return err,
        };
        if period == 0 {
            tokio::time::sleep(DISABLED_POLL).await;
            continue;
        }

        tokio::time::sleep(Duration::from_millis(u64::from(period))).await;
        let raw = signal.sample();
        match connection.push(&uid, channel, raw) {
            Ok(true) => (),
            Ok(false) => debug!("sample {raw} not delivered"),
            Err(err) => return err,
        }
    }
}
