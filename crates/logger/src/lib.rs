use tracing::level_filters::LevelFilter;
use tracing_error::ErrorLayer;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer, Registry};

/// Filter from `RUST_LOG`, `info` if unset or invalid.
///
/// Regex field matching is on, for example to only see one sensor:
/// `RUST_LOG='[{uid=Dq2}]=trace,info'` prints everything inside a span
/// recorded with that uid (sensor construction is instrumented).
fn env_filter() -> EnvFilter {
    EnvFilter::builder()
        .with_regex(true)
        .try_from_env()
        .unwrap_or_else(|_| {
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .parse_lossy("")
        })
}

/// Logs to journald when running as a systemd service, to stderr
/// otherwise.
///
/// Follow the journal with:
/// `journalctl -fu sensor-host --output-fields=CODE_FILE,CODE_LINE,MESSAGE -o cat`
pub fn setup() {
    let fmt = fmt::layer()
        .pretty()
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(true);

    let registry = Registry::default().with(ErrorLayer::default());

    if !libsystemd::logging::connected_to_journal() {
        registry.with(fmt.with_filter(env_filter())).init();
        tracing::info!("Started logging & tracing to stderr");
        return;
    }

    match tracing_journald::layer() {
        Ok(journal) => {
            registry.with(journal.with_filter(env_filter())).init();
            tracing::info!("Started logging & tracing to journald");
        }
        Err(err) => {
            registry.with(fmt.with_filter(env_filter())).init();
            tracing::error!(
                "Could not log to journald directly. Logging to stderr \
                as fallback. Error connecting to journald:: {err}"
            );
        }
    }
}

/// Safe to call from every test, only the first call installs anything.
pub fn setup_for_tests() {
    use std::sync::Once;

    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // another harness may have installed a hook already
        let _ = color_eyre::install();

        let test_subscriber = fmt::layer()
            .with_test_writer()
            .with_file(true)
            .with_line_number(true)
            .with_target(false)
            .with_ansi(true)
            .pretty()
            .with_filter(EnvFilter::from_default_env());
        let _ = tracing_subscriber::registry()
            .with(test_subscriber)
            .with(ErrorLayer::default())
            .try_init();
    });
}
