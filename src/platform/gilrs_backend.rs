//! Desktop gamepads through gilrs
//!
//! A collector thread owns the [`Gilrs`] context, converts its events into raw
//! platform events and pushes them through a [`PlatformSender`]. Device names
//! and USB ids are captured on connect into a shared table that
//! [`GilrsClassifier`] serves to the port registry.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::JoinHandle;

use chrono::Local;
use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs};
use statum::{machine, state};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::channel::PlatformSender;
use crate::device::{DeviceClassifier, DeviceProfile};
use crate::error::InputError;
use crate::event::{keycode, AxisSample, KeyAction, RawInputEvent, SourceFlags};

/// Profiles of every gamepad seen this session, by raw id
pub type DeviceTable = Arc<RwLock<HashMap<i32, DeviceProfile>>>;

#[derive(Clone, Debug)]
pub struct CollectorSettings {
    /// Sleep between two empty gilrs polls
    pub idle_sleep_us: u64,
    /// How often the collector logs throughput
    pub stats_interval_secs: i64,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            idle_sleep_us: 500,
            stats_interval_secs: 10,
        }
    }
}

#[state]
#[derive(Debug, Clone)]
pub enum CollectionState {
    Initializing,
    Collecting,
}

#[machine]
pub struct GilrsCollector<S: CollectionState> {
    gilrs: Gilrs,
    settings: CollectorSettings,
    sender: PlatformSender,
    devices: DeviceTable,
}

fn raw_id(id: GamepadId) -> i32 {
    usize::from(id) as i32
}

fn profile_of(gamepad: &Gamepad<'_>) -> DeviceProfile {
    DeviceProfile::new(
        gamepad.name(),
        gamepad.vendor_id().unwrap_or(0),
        gamepad.product_id().unwrap_or(0),
    )
}

impl GilrsCollector<Initializing> {
    pub fn create(
        settings: Option<CollectorSettings>,
        sender: PlatformSender,
        devices: DeviceTable,
    ) -> Result<Self, InputError> {
        let settings = settings.unwrap_or_default();
        debug!("Creating gilrs collector with settings: {:?}", settings);

        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(InputError::InitializationError(e.to_string()));
            }
        };

        Ok(Self::new(gilrs, settings, sender, devices))
    }

    /// Record the gamepads that were connected before startup
    pub fn initialize(self) -> GilrsCollector<Collecting> {
        let present: Vec<(i32, DeviceProfile)> = self
            .gilrs
            .gamepads()
            .map(|(id, gamepad)| (raw_id(id), profile_of(&gamepad)))
            .collect();

        if present.is_empty() {
            warn!("No gamepad connected, waiting for hotplug");
        } else {
            info!("Found {} gamepads:", present.len());
            let mut devices = self.devices.blocking_write();
            for (id, profile) in present {
                info!(
                    "  ID: {}, Name: {}, {:04x}:{:04x}",
                    id, profile.name, profile.vendor_id, profile.product_id
                );
                devices.insert(id, profile);
            }
        }

        self.transition()
    }
}

impl GilrsCollector<Collecting> {
    /// Forward at most one gilrs event; `Ok(false)` when none was pending
    pub fn collect_next_event(&mut self) -> Result<bool, InputError> {
        let Some(Event { id, event, time, .. }) = self.gilrs.next_event() else {
            return Ok(false);
        };
        debug!("Processing gilrs event: {:?} at time: {:?}", event, time);

        if let Some(raw_event) = self.convert_gilrs_event(id, event) {
            self.sender.send_input(raw_event)?;
        }
        Ok(true)
    }

    /// Collect until the driver side of the channels goes away
    pub fn run_collection_loop(&mut self) -> Result<(), InputError> {
        info!("Starting gilrs collection loop");
        let mut event_count = 0u64;
        let mut last_log_time = Local::now();
        let log_interval = chrono::Duration::seconds(self.settings.stats_interval_secs);
        let idle_sleep = std::time::Duration::from_micros(self.settings.idle_sleep_us);

        loop {
            if self.collect_next_event()? {
                event_count += 1;
            } else {
                std::thread::sleep(idle_sleep);
            }

            let now = Local::now();
            if now - last_log_time > log_interval {
                info!(
                    "Gilrs collector stats: {} events in last {} seconds",
                    event_count,
                    log_interval.num_seconds()
                );
                event_count = 0;
                last_log_time = now;
            }
        }
    }

    fn convert_gilrs_event(&mut self, id: GamepadId, event: EventType) -> Option<RawInputEvent> {
        let device_id = raw_id(id);
        match event {
            EventType::ButtonPressed(button, _) => map_button(button)
                .map(|code| RawInputEvent::key(device_id, SourceFlags::GAMEPAD, code, KeyAction::Down)),
            EventType::ButtonReleased(button, _) => map_button(button)
                .map(|code| RawInputEvent::key(device_id, SourceFlags::GAMEPAD, code, KeyAction::Up)),
            EventType::ButtonRepeated(button, _) => {
                debug!("Button repeat ignored: {:?}", button);
                None
            }
            EventType::ButtonChanged(Button::LeftTrigger2 | Button::RightTrigger2, _, _)
            | EventType::AxisChanged(..) => {
                let gamepad = self.gilrs.gamepad(id);
                Some(RawInputEvent::axes(device_id, SourceFlags::JOYSTICK, sample_axes(&gamepad)))
            }
            EventType::Connected => {
                let profile = profile_of(&self.gilrs.gamepad(id));
                info!("Gamepad {} connected: {}", device_id, profile.name);
                self.devices.blocking_write().insert(device_id, profile);
                None
            }
            EventType::Disconnected => {
                warn!("Gamepad {} disconnected, its port stays reserved", device_id);
                None
            }
            _ => {
                debug!("Unhandled event type: {:?}", event);
                None
            }
        }
    }
}

/// Snapshot every axis of a gamepad
///
/// gilrs reports Y up; the tracked state uses Y down.
fn sample_axes(gamepad: &Gamepad<'_>) -> AxisSample {
    let trigger = |axis: Axis, button: Button| {
        let analog = gamepad.button_data(button).map_or(0.0, |d| d.value());
        gamepad.value(axis).max(analog)
    };
    AxisSample {
        x: gamepad.value(Axis::LeftStickX),
        y: -gamepad.value(Axis::LeftStickY),
        z: gamepad.value(Axis::RightStickX),
        rz: -gamepad.value(Axis::RightStickY),
        hat_x: gamepad.value(Axis::DPadX),
        hat_y: -gamepad.value(Axis::DPadY),
        left_trigger: trigger(Axis::LeftZ, Button::LeftTrigger2),
        right_trigger: trigger(Axis::RightZ, Button::RightTrigger2),
        brake: 0.0,
        gas: 0.0,
    }
}

/// Map a gilrs button to the platform keycode it reports as
fn map_button(button: Button) -> Option<u32> {
    match button {
        Button::South => Some(keycode::BUTTON_A),
        Button::East => Some(keycode::BUTTON_B),
        Button::West => Some(keycode::BUTTON_X),
        Button::North => Some(keycode::BUTTON_Y),
        Button::C => Some(keycode::BUTTON_C),
        Button::Z => Some(keycode::BUTTON_Z),
        Button::LeftTrigger => Some(keycode::BUTTON_L1),
        Button::RightTrigger => Some(keycode::BUTTON_R1),
        Button::LeftTrigger2 => Some(keycode::BUTTON_L2),
        Button::RightTrigger2 => Some(keycode::BUTTON_R2),
        Button::Select => Some(keycode::BUTTON_SELECT),
        Button::Start => Some(keycode::BUTTON_START),
        Button::Mode => Some(keycode::BUTTON_MODE),
        Button::LeftThumb => Some(keycode::BUTTON_THUMBL),
        Button::RightThumb => Some(keycode::BUTTON_THUMBR),
        Button::DPadUp => Some(keycode::DPAD_UP),
        Button::DPadDown => Some(keycode::DPAD_DOWN),
        Button::DPadLeft => Some(keycode::DPAD_LEFT),
        Button::DPadRight => Some(keycode::DPAD_RIGHT),
        _ => None,
    }
}

/// Spawn the collector on its own thread
///
/// gilrs is created on that thread; the handle finishes once the driver side
/// of the channels is dropped.
pub fn spawn_collector(
    settings: Option<CollectorSettings>,
    sender: PlatformSender,
) -> Result<(JoinHandle<()>, DeviceTable), InputError> {
    let devices = DeviceTable::default();
    let table = devices.clone();

    let handle = std::thread::Builder::new()
        .name("gilrs-collector".to_string())
        .spawn(move || match GilrsCollector::create(settings, sender, table) {
            Ok(collector) => {
                let mut collecting = collector.initialize();
                if let Err(e) = collecting.run_collection_loop() {
                    info!("Gilrs collector stopped: {}", e);
                }
            }
            Err(e) => error!("Failed to start gilrs collector: {}", e),
        })
        .map_err(|e| InputError::InitializationError(format!("collector thread: {}", e)))?;

    info!("Gilrs collector started");
    Ok((handle, devices))
}

/// Classifier reading the profiles captured by the collector
#[derive(Clone, Debug)]
pub struct GilrsClassifier {
    devices: DeviceTable,
}

impl GilrsClassifier {
    pub fn new(devices: DeviceTable) -> Self {
        Self { devices }
    }
}

impl DeviceClassifier for GilrsClassifier {
    fn classify(&mut self, raw_id: i32, _source: SourceFlags) -> Option<DeviceProfile> {
        match self.devices.try_read() {
            Ok(devices) => devices.get(&raw_id).cloned(),
            Err(e) => {
                warn!("Device table busy, classification deferred: {}", e);
                None
            }
        }
    }
}
