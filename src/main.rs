use std::time::Duration;

use color_eyre::{eyre::eyre, Result};
use portpad::config::InputConfig;
use portpad::device::LogAutoconfig;
use portpad::dispatch::NeverPaused;
use portpad::driver::{DeviceClass, InputDriver, Platform};
use portpad::joypad::{analog, button};
use portpad::platform::{channel_platform, spawn_collector, GilrsClassifier};
use portpad::state::pointer::{Viewport, ViewportTransform};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// What the frame loop reports per port
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct PortSnapshot {
    buttons: u16,
    left: (i16, i16),
    right: (i16, i16),
}

impl PortSnapshot {
    fn read(driver: &InputDriver, port: usize) -> Self {
        let buttons = (button::B..=button::R3).fold(0u16, |mask, id| {
            if driver.state(port, DeviceClass::Joypad, 0, id) != 0 {
                mask | (1 << id)
            } else {
                mask
            }
        });
        let axis = |index, id| driver.state(port, DeviceClass::Analog, index, id);
        Self {
            buttons,
            left: (axis(analog::INDEX_LEFT, analog::ID_X), axis(analog::INDEX_LEFT, analog::ID_Y)),
            right: (axis(analog::INDEX_RIGHT, analog::ID_X), axis(analog::INDEX_RIGHT, analog::ID_Y)),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config_path = InputConfig::default_path();
    let config = InputConfig::load_or_create(&config_path).await?;
    info!("Loaded input config from {}", config_path.display());

    let (platform, feed) = channel_platform();
    let (_collector, devices) = spawn_collector(None, feed.sender.clone())
        .map_err(|e| eyre!("Failed to spawn gilrs collector: {}", e))?;

    let (stop_tx, stop_rx) = watch::channel(false);
    let driver_platform = Platform {
        looper: Box::new(platform.looper),
        input_queue: Box::new(platform.input_queue),
        pause: Box::new(NeverPaused),
        lifecycle: Box::new(move || {
            info!("Lifecycle command: shutdown requested");
            stop_tx.send_replace(true);
        }),
        classifier: Box::new(GilrsClassifier::new(devices)),
        autoconfig: Box::new(LogAutoconfig),
        sensors: Box::new(platform.sensors),
        transform: Box::new(ViewportTransform {
            viewport: Viewport {
                x: 0,
                y: 0,
                width: 1920,
                height: 1080,
            },
            screen_width: 1920,
            screen_height: 1080,
        }),
        extended_axes: true,
    };
    let driver = InputDriver::new(&config, driver_platform)
        .map_err(|e| eyre!("Failed to initialize input driver: {}", e))?;
    info!("Capabilities: {:#x}", driver.get_capabilities());

    let sender = feed.sender.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received");
                if let Err(e) = sender.send_lifecycle() {
                    warn!("Could not deliver shutdown command: {}", e);
                }
            }
            Err(e) => warn!("Unable to listen for Ctrl-C: {}", e),
        }
    });

    let interval = Duration::from_millis(config.poll_interval_ms);
    tokio::task::spawn_blocking(move || run_frame_loop(driver, stop_rx, interval))
        .await
        .map_err(|e| eyre!("Frame loop failed: {}", e))?;

    info!("Shut down cleanly");
    Ok(())
}

/// Poll once per frame and log port state whenever it changes
fn run_frame_loop(mut driver: InputDriver, stop: watch::Receiver<bool>, interval: Duration) {
    info!("Entering frame loop with {:?} interval", interval);
    let mut snapshots: Vec<PortSnapshot> = Vec::new();

    while !*stop.borrow() {
        driver.poll();

        let ports = driver.input_state().registry.max_pads();
        snapshots.resize(ports, PortSnapshot::default());
        for (port, last) in snapshots.iter_mut().enumerate() {
            let current = PortSnapshot::read(&driver, port);
            if current != *last {
                info!(
                    "Port {}: buttons {:016b} left {:?} right {:?}",
                    port, current.buttons, current.left, current.right
                );
                *last = current;
            }
        }

        std::thread::sleep(interval);
    }

    driver.shutdown();
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
