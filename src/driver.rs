//! Upstream query API
//!
//! [`InputDriver`] is what a frontend holds: it is polled once per frame, then
//! queried for port state until the next poll.

use tracing::{debug, info};

use crate::config::{Backend, InputConfig};
use crate::device::{DeviceClassifier, JoypadAutoconfig, PortRegistry};
use crate::dispatch::{EventLooper, InputQueue, LifecycleHandler, PauseSignal, PollDispatcher};
use crate::dispatch::dispatcher::Idle;
use crate::error::InputError;
use crate::joypad::JoypadDriver;
use crate::state::pointer::CoordinateTransform;
use crate::state::sensor::{SensorAction, SensorPipeline, SensorProvider};
use crate::state::{InputState, KeyboardListener};

/// Device classes a state query can address
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    Joypad,
    Mouse,
    Keyboard,
    Analog,
    Pointer,
    /// Pointer in full-screen coordinates
    PointerScreen,
}

impl DeviceClass {
    /// Numeric class id, also the capability bit position
    pub fn id(self) -> u32 {
        match self {
            Self::Joypad => 1,
            Self::Mouse => 2,
            Self::Keyboard => 3,
            Self::Analog => 5,
            Self::Pointer | Self::PointerScreen => 6,
        }
    }

    pub fn capability_bit(self) -> u64 {
        1 << self.id()
    }
}

/// Pointer query ids
pub mod pointer_id {
    pub const X: u32 = 0;
    pub const Y: u32 = 1;
    pub const PRESSED: u32 = 2;
}

/// Mouse query ids
pub mod mouse_id {
    pub const X: u32 = 0;
    pub const Y: u32 = 1;
    pub const LEFT: u32 = 2;
    pub const RIGHT: u32 = 3;
}

impl Backend {
    pub fn capabilities(self) -> u64 {
        let classes: &[DeviceClass] = match self {
            Backend::Touch => &[DeviceClass::Joypad, DeviceClass::Pointer, DeviceClass::Analog],
            Backend::Desktop => &[
                DeviceClass::Joypad,
                DeviceClass::Analog,
                DeviceClass::Keyboard,
                DeviceClass::Mouse,
            ],
        };
        classes.iter().fold(0, |caps, class| caps | class.capability_bit())
    }
}

/// Everything the driver needs from the host platform
pub struct Platform {
    pub looper: Box<dyn EventLooper>,
    pub input_queue: Box<dyn InputQueue>,
    pub pause: Box<dyn PauseSignal>,
    pub lifecycle: Box<dyn LifecycleHandler>,
    pub classifier: Box<dyn DeviceClassifier>,
    pub autoconfig: Box<dyn JoypadAutoconfig>,
    pub sensors: Box<dyn SensorProvider>,
    pub transform: Box<dyn CoordinateTransform>,
    /// The platform reports every joystick axis, not just X/Y
    pub extended_axes: bool,
}

pub struct InputDriver {
    state: InputState,
    dispatcher: Option<PollDispatcher<Idle>>,
    joypad: JoypadDriver,
    backend: Backend,
    lifecycle_mask: u64,
}

impl InputDriver {
    pub fn new(config: &InputConfig, platform: Platform) -> Result<Self, InputError> {
        config.validate()?;
        info!("Initializing input driver with backend {:?}", config.backend);

        let strategy = config.axis_strategy.resolve(platform.extended_axes);
        info!("Using {:?} axis strategy", strategy);

        let registry = PortRegistry::new(
            config.registry_settings(JoypadDriver::IDENT),
            config.profile_table(),
            config.alias_policy(),
            platform.classifier,
            platform.autoconfig,
        );
        let sensors = SensorPipeline::new(platform.sensors, config.default_sensor_rate_hz);
        let state = InputState::new(registry, strategy, sensors, platform.transform);

        let dispatcher = PollDispatcher::create(
            platform.looper,
            platform.input_queue,
            platform.pause,
            platform.lifecycle,
        );

        Ok(Self {
            state,
            dispatcher: Some(dispatcher),
            joypad: JoypadDriver::new(config.joypad_binds.clone()),
            backend: config.backend,
            lifecycle_mask: 0,
        })
    }

    /// Drain every pending platform queue into the device state
    pub fn poll(&mut self) {
        if let Some(dispatcher) = self.dispatcher.take() {
            self.dispatcher = Some(dispatcher.run_cycle(&mut self.state));
        }
    }

    /// Read one value from the device state
    ///
    /// Classes the backend does not advertise read as 0, as do unknown ids.
    pub fn state(&self, port: usize, class: DeviceClass, index: u32, id: u32) -> i16 {
        if self.get_capabilities() & class.capability_bit() == 0 {
            return 0;
        }

        match class {
            DeviceClass::Joypad => self.joypad.pressed(&self.state, port, id) as i16,
            DeviceClass::Analog => self.joypad.analog(&self.state, port, index, id),
            DeviceClass::Pointer | DeviceClass::PointerScreen => {
                let index = index as usize;
                let Some(record) = self.state.pointers.record(index) else {
                    return 0;
                };
                let screen = class == DeviceClass::PointerScreen;
                match id {
                    pointer_id::X if screen => record.full_x,
                    pointer_id::Y if screen => record.full_y,
                    pointer_id::X => record.x,
                    pointer_id::Y => record.y,
                    pointer_id::PRESSED if screen => self.state.pointers.is_active_on_screen(index) as i16,
                    pointer_id::PRESSED => self.state.pointers.is_active(index) as i16,
                    _ => 0,
                }
            }
            DeviceClass::Keyboard => self.state.keys.is_pressed(0, id) as i16,
            DeviceClass::Mouse => {
                let mouse = &self.state.mouse;
                match id {
                    mouse_id::X => mouse.x,
                    mouse_id::Y => mouse.y,
                    mouse_id::LEFT => mouse.left as i16,
                    mouse_id::RIGHT => mouse.right as i16,
                    _ => 0,
                }
            }
        }
    }

    /// Global key query: lifecycle/overlay mask or the first port's binds
    pub fn key_pressed(&self, key: u32) -> bool {
        let in_mask = key < u64::BITS && self.lifecycle_mask & (1 << key) != 0;
        in_mask || self.joypad.pressed(&self.state, 0, key)
    }

    /// Replace the externally driven lifecycle/overlay button mask
    pub fn set_lifecycle_state(&mut self, mask: u64) {
        self.lifecycle_mask = mask;
    }

    pub fn get_capabilities(&self) -> u64 {
        self.backend.capabilities()
    }

    pub fn set_sensor_state(&mut self, port: usize, action: SensorAction, rate_hz: u32) -> bool {
        debug!("Sensor request on port {}: {:?} at {} Hz", port, action, rate_hz);
        self.state.sensors.set_sensor_state(action, rate_hz)
    }

    pub fn get_sensor_input(&self, _port: usize, id: u32) -> f32 {
        self.state.sensors.sensor_input(id)
    }

    pub fn get_joypad_driver(&self) -> &JoypadDriver {
        &self.joypad
    }

    pub fn set_keyboard_listener(&mut self, listener: Box<dyn KeyboardListener>) {
        self.state.set_keyboard_listener(listener);
    }

    /// Read-only view of the tracked state
    pub fn input_state(&self) -> &InputState {
        &self.state
    }

    /// Release platform handles; later polls do nothing
    pub fn shutdown(&mut self) {
        if self.dispatcher.take().is_some() {
            self.state.sensors.release();
            info!("Input driver shut down");
        }
    }
}

impl Drop for InputDriver {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_sets_per_backend() {
        assert_eq!(Backend::Touch.capabilities(), (1 << 1) | (1 << 5) | (1 << 6));
        assert_eq!(Backend::Desktop.capabilities(), (1 << 1) | (1 << 2) | (1 << 3) | (1 << 5));
    }

    #[test]
    fn pointer_screen_shares_pointer_bit() {
        assert_eq!(
            DeviceClass::PointerScreen.capability_bit(),
            DeviceClass::Pointer.capability_bit()
        );
    }
}
