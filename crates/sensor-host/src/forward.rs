use std::num::NonZeroU32;
use std::sync::Arc;

use bricklet_sensors::{Consumer, Reading};
use governor::{Quota, RateLimiter};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{error, warn};

/// Consumer handing readings to `tx`. Runs on the connection's callback
/// threads so it never blocks: readings that do not fit are dropped.
pub(crate) fn into_channel(tx: mpsc::Sender<Reading>) -> Consumer {
    let quota = Quota::per_minute(NonZeroU32::new(6).expect("not zero"))
        .allow_burst(NonZeroU32::new(3).expect("not zero"));
    let report_limiter = RateLimiter::direct(quota);

    Arc::new(move |reading| match tx.try_send(reading) {
        Ok(()) => (),
        Err(TrySendError::Full(reading)) => {
            if report_limiter.check().is_ok() {
                warn!("Readings are not processed fast enough, dropped: {reading}");
            }
        }
        Err(TrySendError::Closed(reading)) => {
            if report_limiter.check().is_ok() {
                error!("Nothing receives readings anymore, dropped: {reading}");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use bricklet_sensors::SensorModel;

    use super::*;

    fn reading(value: f64) -> Reading {
        Reading {
            uid: "Dq2".parse().unwrap(),
            model: SensorModel::Barometer,
            value,
        }
    }

    #[test]
    fn drops_when_full() {
        let (tx, mut rx) = mpsc::channel(2);
        let consumer = into_channel(tx);
        for value in 0..5 {
            consumer(reading(f64::from(value)));
        }

        assert_eq!(rx.try_recv().unwrap().value, 0.);
        assert_eq!(rx.try_recv().unwrap().value, 1.);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_receiver_does_not_panic() {
        let (tx, rx) = mpsc::channel(2);
        drop(rx);
        let consumer = into_channel(tx);
        consumer(reading(1.));
    }
}
