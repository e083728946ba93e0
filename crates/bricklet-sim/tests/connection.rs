use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bricklet_sensors::bricklet::{
    BarometerBricklet, BarometerV2Bricklet, Bricklet, CallbackConfiguration,
    IndustrialDualAnalogInV2Bricklet,
};
use bricklet_sensors::{SensorModel, Uid};
use bricklet_sim::{
    drive, BrickletBarometer, BrickletBarometerV2,
    BrickletIndustrialDualAnalogInV2, Connection, Error, Signal,
};

fn uid(text: &str) -> Uid {
    text.parse().unwrap()
}

fn counter() -> (Arc<AtomicUsize>, impl Fn(i32) + Send + Sync) {
    let count = Arc::new(AtomicUsize::new(0));
    let inner = Arc::clone(&count);
    (count, move |_| {
        inner.fetch_add(1, Ordering::SeqCst);
    })
}

#[test]
fn identity_follows_attach_order() {
    logger::setup_for_tests();
    let conn = Connection::new();
    conn.attach(uid("Dq2"), SensorModel::Barometer).unwrap();
    conn.attach(uid("LmK"), SensorModel::BarometerV2).unwrap();

    let second = BrickletBarometerV2::new(&uid("LmK"), &conn);
    let identity = second.get_identity().unwrap();
    assert_eq!(identity.position, 'b');
    assert_eq!(identity.device_identifier, 2117);
    assert_eq!(identity.connected_uid, bricklet_sim::MASTER_BRICK_UID);
}

#[test]
fn handles_report_vendor_names() {
    assert_eq!(
        BrickletBarometer::DEVICE_DISPLAY_NAME,
        SensorModel::Barometer.display_name()
    );
    assert_eq!(
        BrickletBarometerV2::DEVICE_DISPLAY_NAME,
        "Barometer Bricklet 2.0"
    );
    assert_eq!(
        BrickletIndustrialDualAnalogInV2::DEVICE_DISPLAY_NAME,
        "Industrial Dual Analog In Bricklet 2.0"
    );
}

#[test]
fn attaching_twice_fails() {
    let conn = Connection::new();
    conn.attach(uid("Dq2"), SensorModel::Barometer).unwrap();
    assert_eq!(
        conn.attach(uid("Dq2"), SensorModel::BarometerV2),
        Err(Error::AlreadyAttached(uid("Dq2")))
    );
}

#[test]
fn wrong_handle_type_is_rejected() {
    let conn = Connection::new();
    conn.attach(uid("Dq2"), SensorModel::Barometer).unwrap();
    let handle = BrickletBarometerV2::new(&uid("Dq2"), &conn);
    assert!(matches!(
        handle.get_identity(),
        Err(Error::WrongDevice {
            expected: SensorModel::BarometerV2,
            found: SensorModel::Barometer,
            ..
        })
    ));
}

#[test]
fn push_respects_period() {
    let conn = Connection::new();
    conn.attach(uid("Dq2"), SensorModel::Barometer).unwrap();
    let handle = BrickletBarometer::new(&uid("Dq2"), &conn);
    let (count, callback) = counter();
    handle.register_air_pressure_callback(Box::new(callback));

    assert_eq!(conn.push(&uid("Dq2"), 0, 5), Ok(false));
    handle.set_air_pressure_callback_period(100).unwrap();
    assert_eq!(conn.push(&uid("Dq2"), 0, 5), Ok(true));
    // no change detection on the 1.0 barometer
    assert_eq!(conn.push(&uid("Dq2"), 0, 5), Ok(true));
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[test]
fn push_only_on_change_when_configured() {
    let conn = Connection::new();
    conn.attach(uid("LmK"), SensorModel::BarometerV2).unwrap();
    let handle = BrickletBarometerV2::new(&uid("LmK"), &conn);
    let (count, callback) = counter();
    handle.register_air_pressure_callback(Box::new(callback));
    handle
        .set_air_pressure_callback_configuration(
            CallbackConfiguration::on_change(10),
        )
        .unwrap();

    assert_eq!(conn.push(&uid("LmK"), 0, 1), Ok(true));
    assert_eq!(conn.push(&uid("LmK"), 0, 1), Ok(false));
    assert_eq!(conn.push(&uid("LmK"), 0, 2), Ok(true));
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[test]
fn voltage_callback_gets_channel() {
    let conn = Connection::new();
    conn.attach(uid("AiN"), SensorModel::IndustrialDualAnalogInV2)
        .unwrap();
    let handle = BrickletIndustrialDualAnalogInV2::new(&uid("AiN"), &conn);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    handle.register_voltage_callback(Box::new(move |channel, raw| {
        sink.lock().unwrap().push((channel, raw));
    }));

    conn.emit(&uid("AiN"), 1, 42).unwrap();
    assert_eq!(
        conn.emit(&uid("AiN"), 2, 42),
        Err(Error::InvalidChannel {
            uid: uid("AiN"),
            channel: 2
        })
    );
    assert_eq!(*seen.lock().unwrap(), vec![(1, 42)]);
}

#[test]
fn calls_fail_while_disconnected() {
    let conn = Connection::new();
    conn.attach(uid("Dq2"), SensorModel::Barometer).unwrap();
    let handle = BrickletBarometer::new(&uid("Dq2"), &conn);

    conn.disconnect();
    assert_eq!(
        handle.get_air_pressure_callback_period(),
        Err(Error::NotConnected)
    );
    conn.reconnect();
    assert_eq!(handle.get_air_pressure_callback_period(), Ok(0));
}

#[test]
fn constant_signal_has_no_noise() {
    let signal = Signal::constant(10132);
    assert!((0..10).all(|_| signal.sample() == 10132));

    let noisy = Signal {
        base: 0,
        jitter: 3,
    };
    assert!((0..100).map(|_| noisy.sample()).all(|v| (-3..=3).contains(&v)));
}

#[tokio::test(start_paused = true)]
async fn drive_pushes_at_period_until_detached() {
    let conn = Connection::new();
    conn.attach(uid("Dq2"), SensorModel::Barometer).unwrap();
    let handle = BrickletBarometer::new(&uid("Dq2"), &conn);
    let (count, callback) = counter();
    handle.register_air_pressure_callback(Box::new(callback));
    handle.set_air_pressure_callback_period(1000).unwrap();

    let task = tokio::spawn(drive(
        conn.clone(),
        uid("Dq2"),
        0,
        Signal::constant(10132),
    ));

    tokio::time::sleep(Duration::from_millis(3500)).await;
    assert_eq!(count.load(Ordering::SeqCst), 3);

    conn.detach(&uid("Dq2")).unwrap();
    let err = task.await.unwrap();
    assert_eq!(err, Error::DeviceNotFound(uid("Dq2")));
}
