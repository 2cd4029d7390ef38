use std::sync::{Arc, Mutex};

use portpad::config::{AxisStrategySetting, Backend, InputConfig};
use portpad::device::{DeviceProfile, JoypadAutoconfig, StaticClassifier};
use portpad::dispatch::NeverPaused;
use portpad::driver::{mouse_id, pointer_id, DeviceClass, InputDriver, Platform};
use portpad::event::{keycode, AxisSample, KeyAction, MotionAction, PointerSample, RawInputEvent, SourceFlags};
use portpad::joypad::{analog, button};
use portpad::platform::{channel_platform, PlatformFeed};
use portpad::state::pointer::{mouse_button, PointerRecord, Viewport, ViewportTransform};
use portpad::state::sensor::{SensorAction, SensorSample};

type Autoconfigured = Arc<Mutex<Vec<(usize, String, u16, u16)>>>;

struct Recorder(Autoconfigured);

impl JoypadAutoconfig for Recorder {
    fn autoconfigure_joypad(&mut self, port: usize, name: &str, vendor_id: u16, product_id: u16, _driver: &str) {
        self.0
            .lock()
            .unwrap()
            .push((port, name.to_string(), vendor_id, product_id));
    }
}

struct Harness {
    driver: InputDriver,
    feed: PlatformFeed,
    autoconfigured: Autoconfigured,
    lifecycle_commands: Arc<Mutex<usize>>,
}

impl Harness {
    fn new(config: InputConfig, classifier: StaticClassifier) -> Self {
        let (platform, feed) = channel_platform();
        let autoconfigured = Autoconfigured::default();
        let lifecycle_commands = Arc::new(Mutex::new(0));
        let counter = lifecycle_commands.clone();

        let driver = InputDriver::new(
            &config,
            Platform {
                looper: Box::new(platform.looper),
                input_queue: Box::new(platform.input_queue),
                pause: Box::new(NeverPaused),
                lifecycle: Box::new(move || *counter.lock().unwrap() += 1),
                classifier: Box::new(classifier),
                autoconfig: Box::new(Recorder(autoconfigured.clone())),
                sensors: Box::new(platform.sensors),
                transform: Box::new(ViewportTransform {
                    viewport: Viewport {
                        x: 0,
                        y: 0,
                        width: 100,
                        height: 100,
                    },
                    screen_width: 100,
                    screen_height: 100,
                }),
                extended_axes: true,
            },
        )
        .unwrap();

        Self {
            driver,
            feed,
            autoconfigured,
            lifecycle_commands,
        }
    }

    fn send(&self, event: RawInputEvent) {
        self.feed.sender.send_input(event).unwrap();
    }

    fn joypad(&self, port: usize, id: u32) -> bool {
        self.driver.state(port, DeviceClass::Joypad, 0, id) != 0
    }
}

fn xbox_classifier() -> StaticClassifier {
    StaticClassifier::new().with_device(7, DeviceProfile::new("XBox 360", 0x045e, 0x028e))
}

#[test]
fn xbox_pad_is_classified_onto_port_zero() {
    let mut h = Harness::new(InputConfig::default(), xbox_classifier());
    h.send(RawInputEvent::key(7, SourceFlags::GAMEPAD, keycode::BUTTON_B, KeyAction::Down));
    h.driver.poll();

    let registry = &h.driver.input_state().registry;
    assert_eq!(registry.lookup_port(7), Some(0));
    assert_eq!(registry.device_name(0), Some("XBox 360"));
    assert_eq!(
        *h.autoconfigured.lock().unwrap(),
        vec![(0, "XBox 360".to_string(), 0x045e, 0x028e)]
    );
}

#[test]
fn key_down_then_up_follows_last_transition() {
    let mut h = Harness::new(InputConfig::default(), xbox_classifier());

    h.send(RawInputEvent::key(7, SourceFlags::GAMEPAD, keycode::BUTTON_A, KeyAction::Down));
    h.driver.poll();
    assert!(h.joypad(0, button::A));

    h.send(RawInputEvent::key(7, SourceFlags::GAMEPAD, keycode::BUTTON_A, KeyAction::Up));
    h.driver.poll();
    assert!(!h.joypad(0, button::A));
}

#[test]
fn duplicate_downs_need_one_up() {
    let mut h = Harness::new(InputConfig::default(), xbox_classifier());
    for _ in 0..3 {
        h.send(RawInputEvent::key(7, SourceFlags::GAMEPAD, keycode::BUTTON_X, KeyAction::Down));
    }
    h.send(RawInputEvent::key(7, SourceFlags::GAMEPAD, keycode::BUTTON_X, KeyAction::Up));
    h.driver.poll();
    assert!(!h.joypad(0, button::X));
}

#[test]
fn basic_strategy_scales_x_and_y_only() {
    let config = InputConfig {
        axis_strategy: AxisStrategySetting::Basic,
        ..Default::default()
    };
    let mut h = Harness::new(config, xbox_classifier());
    let sample = AxisSample {
        x: 0.5,
        y: -0.5,
        z: 1.0,
        ..Default::default()
    };
    h.send(RawInputEvent::axes(7, SourceFlags::JOYSTICK, sample));
    h.driver.poll();

    let x = h.driver.state(0, DeviceClass::Analog, analog::INDEX_LEFT, analog::ID_X);
    let y = h.driver.state(0, DeviceClass::Analog, analog::INDEX_LEFT, analog::ID_Y);
    assert!((i32::from(x) - 16383).abs() <= 1, "x = {}", x);
    assert!((i32::from(y) + 16383).abs() <= 1, "y = {}", y);
    assert_eq!(h.driver.state(0, DeviceClass::Analog, analog::INDEX_RIGHT, analog::ID_X), 0);
}

#[test]
fn released_pointer_compacts_the_list() {
    let mut h = Harness::new(InputConfig::default(), StaticClassifier::new());
    let first = PointerSample { x: 0.0, y: 0.0 };
    let second = PointerSample { x: 100.0, y: 100.0 };

    h.send(RawInputEvent::pointer(50, SourceFlags::TOUCHSCREEN, MotionAction::Down, 0, vec![first]));
    h.send(RawInputEvent::pointer(
        50,
        SourceFlags::TOUCHSCREEN,
        MotionAction::PointerDown,
        1,
        vec![first, second],
    ));
    h.driver.poll();
    assert_eq!(h.driver.input_state().pointers.count(), 2);

    h.send(RawInputEvent::pointer(
        50,
        SourceFlags::TOUCHSCREEN,
        MotionAction::PointerUp,
        0,
        vec![first, second],
    ));
    h.driver.poll();

    let pointer = |index, id| h.driver.state(0, DeviceClass::Pointer, index, id);
    assert_eq!(h.driver.input_state().pointers.count(), 1);
    assert_eq!(pointer(0, pointer_id::X), 32767);
    assert_eq!(pointer(0, pointer_id::Y), 32767);
    assert_eq!(pointer(0, pointer_id::PRESSED), 1);
    assert_eq!(pointer(1, pointer_id::PRESSED), 0);
    assert_eq!(h.driver.state(0, DeviceClass::PointerScreen, 0, pointer_id::X), 32767);
}

#[test]
fn zero_sensor_rate_uses_sixty_hertz() {
    let mut h = Harness::new(InputConfig::default(), StaticClassifier::new());
    assert!(h.driver.set_sensor_state(0, SensorAction::AccelerometerEnable, 0));

    let control = h.feed.sensor_control();
    assert!(control.enabled);
    assert_eq!(control.period_us, Some(16666));

    for x in [0.25, 0.5, 0.75] {
        h.feed.sender.send_sensor(SensorSample { x, y: 1.0, z: 9.8 }).unwrap();
    }
    h.driver.poll();
    assert_eq!(h.driver.get_sensor_input(0, 0), 0.75);
    assert_eq!(h.driver.get_sensor_input(0, 2), 9.8);
    assert_eq!(h.driver.get_sensor_input(0, 7), 0.0);

    assert!(!h.driver.set_sensor_state(0, SensorAction::GyroscopeEnable, 0));
    assert!(h.driver.set_sensor_state(0, SensorAction::AccelerometerDisable, 0));
    assert!(!h.feed.sensor_control().enabled);
}

#[test]
fn samples_queued_before_disable_are_discarded() {
    let mut h = Harness::new(InputConfig::default(), StaticClassifier::new());
    h.feed.sender.send_sensor(SensorSample { x: 5.0, y: 0.0, z: 0.0 }).unwrap();

    assert!(h.driver.set_sensor_state(0, SensorAction::AccelerometerEnable, 0));
    h.feed.sender.send_sensor(SensorSample { x: 0.5, y: 0.0, z: 0.0 }).unwrap();
    assert!(h.driver.set_sensor_state(0, SensorAction::AccelerometerDisable, 0));
    h.driver.poll();

    assert!(h.driver.set_sensor_state(0, SensorAction::AccelerometerEnable, 0));
    h.driver.poll();
    assert_eq!(h.driver.get_sensor_input(0, 0), 0.0);
}

#[test]
fn ninth_device_is_dropped() {
    let mut classifier = StaticClassifier::new();
    for id in 100..109 {
        classifier = classifier.with_device(id, DeviceProfile::new(format!("Pad {}", id), 1, 1));
    }
    let mut h = Harness::new(InputConfig::default(), classifier);

    for id in 100..109 {
        h.send(RawInputEvent::key(id, SourceFlags::GAMEPAD, keycode::BUTTON_START, KeyAction::Down));
    }
    h.driver.poll();

    let registry = &h.driver.input_state().registry;
    assert_eq!(registry.pads_connected(), 8);
    assert_eq!(registry.lookup_port(107), Some(7));
    assert_eq!(registry.lookup_port(108), None);

    let mut finished = Vec::new();
    while let Some(event) = h.feed.try_finished() {
        finished.push(event);
    }
    assert_eq!(finished.len(), 9);
    assert!(finished.iter().all(|f| f.handled));
}

#[test]
fn volume_keys_go_back_to_the_platform() {
    let mut h = Harness::new(InputConfig::default(), xbox_classifier());
    h.send(RawInputEvent::key(7, SourceFlags::GAMEPAD, keycode::VOLUME_UP, KeyAction::Down));
    h.driver.poll();
    let finished = h.feed.try_finished().unwrap();
    assert!(!finished.handled);
}

#[test]
fn volume_keys_from_unclassified_devices_go_back_to_the_platform() {
    let mut h = Harness::new(InputConfig::default(), StaticClassifier::new());
    h.send(RawInputEvent::key(3, SourceFlags::KEYBOARD, keycode::VOLUME_UP, KeyAction::Down));
    h.send(RawInputEvent::key(3, SourceFlags::KEYBOARD, keycode::BUTTON_A, KeyAction::Down));
    h.driver.poll();

    let volume = h.feed.try_finished().unwrap();
    assert_eq!(volume.event.device_id, 3);
    assert!(!volume.handled);
    let other = h.feed.try_finished().unwrap();
    assert!(other.handled);
    assert_eq!(h.driver.input_state().registry.pads_connected(), 0);
}

#[test]
fn stylus_events_use_the_first_port() {
    let mut h = Harness::new(InputConfig::default(), StaticClassifier::new());
    h.send(RawInputEvent::pointer(
        5,
        SourceFlags::STYLUS,
        MotionAction::Down,
        0,
        vec![PointerSample { x: 10.0, y: 20.0 }],
    ));
    h.driver.poll();

    assert!(h.feed.try_finished().unwrap().handled);
    assert_eq!(h.driver.input_state().registry.pads_connected(), 0);
    assert!(h.driver.input_state().registry.records().is_empty());
}

#[test]
fn lifecycle_commands_reach_the_handler() {
    let mut h = Harness::new(InputConfig::default(), StaticClassifier::new());
    h.feed.sender.send_lifecycle().unwrap();
    h.driver.poll();
    assert_eq!(*h.lifecycle_commands.lock().unwrap(), 1);
}

#[test]
fn key_pressed_reads_mask_and_first_port() {
    let mut h = Harness::new(InputConfig::default(), xbox_classifier());
    assert!(!h.driver.key_pressed(button::START));

    h.driver.set_lifecycle_state(1 << 40);
    assert!(h.driver.key_pressed(40));

    h.send(RawInputEvent::key(7, SourceFlags::GAMEPAD, keycode::BUTTON_START, KeyAction::Down));
    h.driver.poll();
    assert!(h.driver.key_pressed(button::START));
}

#[test]
fn desktop_backend_serves_keyboard_and_mouse() {
    let config = InputConfig {
        backend: Backend::Desktop,
        ..Default::default()
    };
    let classifier = StaticClassifier::new().with_device(1, DeviceProfile::new("AT keyboard", 0, 0));
    let mut h = Harness::new(config, classifier);

    let typed = Arc::new(Mutex::new(Vec::new()));
    let sink = typed.clone();
    h.driver
        .set_keyboard_listener(Box::new(move |down: bool, code: u32| sink.lock().unwrap().push((down, code))));

    h.send(RawInputEvent::key(1, SourceFlags::KEYBOARD, 29, KeyAction::Down));
    h.send(RawInputEvent::mouse(
        2,
        MotionAction::Down,
        PointerSample { x: 12.0, y: 34.0 },
        mouse_button::PRIMARY,
    ));
    h.driver.poll();

    assert_eq!(h.driver.input_state().registry.device_name(0), Some("RetroKeyboard"));
    assert_eq!(h.driver.state(0, DeviceClass::Keyboard, 0, 29), 1);
    assert_eq!(h.driver.state(0, DeviceClass::Mouse, 0, mouse_id::X), 12);
    assert_eq!(h.driver.state(0, DeviceClass::Mouse, 0, mouse_id::Y), 34);
    assert_eq!(h.driver.state(0, DeviceClass::Mouse, 0, mouse_id::LEFT), 1);
    assert_eq!(h.driver.state(0, DeviceClass::Mouse, 0, mouse_id::RIGHT), 0);
    assert_eq!(h.driver.state(0, DeviceClass::Pointer, 0, pointer_id::PRESSED), 0);
    assert_eq!(*typed.lock().unwrap(), vec![(true, 29)]);
}

#[test]
fn invalid_config_refuses_to_start() {
    let (platform, _feed) = channel_platform();
    let config = InputConfig {
        max_pads: 0,
        ..Default::default()
    };
    let result = InputDriver::new(
        &config,
        Platform {
            looper: Box::new(platform.looper),
            input_queue: Box::new(platform.input_queue),
            pause: Box::new(NeverPaused),
            lifecycle: Box::new(|| {}),
            classifier: Box::new(StaticClassifier::new()),
            autoconfig: Box::new(portpad::device::LogAutoconfig),
            sensors: Box::new(platform.sensors),
            transform: Box::new(|_: f32, _: f32| -> Option<PointerRecord> { None }),
            extended_axes: false,
        },
    );
    assert!(matches!(result, Err(portpad::InputError::ConfigError(_))));
}
