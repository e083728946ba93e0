use std::path::PathBuf;

use bricklet_sensors::Uid;
use bricklet_sim::{Connection, Signal};
use clap::Parser;
use color_eyre::eyre::Context;
use color_eyre::Result;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

mod config;
mod forward;
mod host;

use host::Host;

#[derive(Parser)]
#[command(version, long_about = None)]
#[command(
    about = "Sets up Tinkerforge bricklets and logs their readings in SI units"
)]
struct Cli {
    /// RON file listing the sensors, see sensors.ron for an example
    #[arg(short, long)]
    config: PathBuf,

    /// How many readings may wait to be handled before new ones are dropped
    #[arg(long, default_value_t = 1024)]
    channel_capacity: usize,

    /// Log the identity every bricklet reports at startup
    #[arg(long)]
    identify: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    logger::setup();

    let config = config::load(&cli.config).await?;

    // there is no network transport, every configured device is plugged
    // into an in process connection
    let connection = Connection::new();
    for sensor in &config.sensors {
        connection
            .attach(sensor.uid.clone(), sensor.model)
            .wrap_err("Could not attach simulated device")?;
    }

    let (tx, mut rx) = mpsc::channel(cli.channel_capacity);
    let consumer = forward::into_channel(tx);
    let mut host = Host::new(connection.clone());

    for sensor in &config.sensors {
        let attached = host
            .add(sensor, consumer.clone())
            .wrap_err("Could not register sensor")?;

        let period = attached
            .sensor_callback_period()
            .wrap_err("Could not read back callback period")?;
        if period != sensor.callback_period {
            warn!(
                "{} uses callback period {period}ms, configured was {}ms",
                attached.uid(),
                sensor.callback_period
            );
        }

        if cli.identify {
            let identity = attached
                .get_identity()
                .wrap_err("Could not get identity")?;
            info!("{}: {identity:?}", attached.uid());
        }

        if let Some(simulate) = sensor.simulate {
            tokio::spawn(simulate_device(
                connection.clone(),
                sensor.uid.clone(),
                attached.channel(),
                simulate.into(),
            ));
        }
    }
    info!("Started {} sensor(s)", host.sensors().count());

    while let Some(reading) = rx.recv().await {
        info!("{reading}");
    }

    Ok(())
}

async fn simulate_device(
    connection: Connection,
    uid: Uid,
    channel: u8,
    signal: Signal,
) {
    let err = bricklet_sim::drive(connection, uid.clone(), channel, signal).await;
    error!("Simulated device {uid} stopped: {err}");
}
