//! Device state trackers
//!
//! [`InputState`] owns the port registry and every tracker, and routes one
//! resolved platform event to the tracker responsible for it:
//!
//! ```text
//! RawInputEvent ─► PortRegistry ─┬─► KeyStateTracker   (key events)
//!                                ├─► PointerTracker    (touch / mouse motion)
//!                                └─► AxisNormalizer    (joystick motion)
//! ```

pub mod axis;
pub mod keys;
pub mod pointer;
pub mod sensor;

use tracing::{debug, trace};

use crate::device::PortRegistry;
use crate::error::InputError;
use crate::event::{keycode, RawEventKind, RawInputEvent};

pub use axis::{AnalogState, AxisNormalizer, AxisSlot, AxisStrategy, HatState};
pub use keys::{KeyBitset, KeyOutcome, KeyStateTracker};
pub use pointer::{CoordinateTransform, MouseState, PointerKind, PointerRecord, PointerTracker};
pub use sensor::{SensorAction, SensorPipeline, SensorSample};

/// Receives keyboard transitions, for cores that consume text input
pub trait KeyboardListener: Send {
    fn on_key(&mut self, down: bool, keycode: u32);
}

impl<F> KeyboardListener for F
where
    F: FnMut(bool, u32) + Send,
{
    fn on_key(&mut self, down: bool, keycode: u32) {
        self(down, keycode)
    }
}

/// All per-session device state
pub struct InputState {
    pub registry: PortRegistry,
    pub keys: KeyStateTracker,
    pub axes: AxisNormalizer,
    pub pointers: PointerTracker,
    pub mouse: MouseState,
    pub sensors: SensorPipeline,
    transform: Box<dyn CoordinateTransform>,
    keyboard_listener: Option<Box<dyn KeyboardListener>>,
}

impl InputState {
    pub fn new(
        registry: PortRegistry,
        strategy: AxisStrategy,
        sensors: SensorPipeline,
        transform: Box<dyn CoordinateTransform>,
    ) -> Self {
        let max_pads = registry.max_pads();
        Self {
            registry,
            keys: KeyStateTracker::new(max_pads),
            axes: AxisNormalizer::new(max_pads, strategy),
            pointers: PointerTracker::new(),
            mouse: MouseState::default(),
            sensors,
            transform,
            keyboard_listener: None,
        }
    }

    pub fn set_keyboard_listener(&mut self, listener: Box<dyn KeyboardListener>) {
        self.keyboard_listener = Some(listener);
    }

    /// Route one platform event and report whether it was consumed
    ///
    /// Events that cannot be attributed to a port are dropped but still count
    /// as consumed. Volume keys are always handed back to the platform.
    pub fn apply_event(&mut self, event: &RawInputEvent) -> bool {
        let port = match self.registry.resolve_port(event.device_id, event.source) {
            Ok(port) => port,
            Err(e) => {
                debug!("Dropping event from raw device {}: {}", event.device_id, e);
                return !matches!(
                    event.kind,
                    RawEventKind::Key { keycode: code, .. } if keycode::is_volume(code)
                );
            }
        };

        let result = match &event.kind {
            RawEventKind::Motion {
                action,
                action_index,
                contacts,
                axes,
                buttons,
            } => {
                if event.source.is_pointer_only() {
                    if event.source.is_mouse_only() {
                        self.mouse.apply(contacts.first(), *buttons);
                    }
                    let kind = PointerKind::classify(*action, event.source);
                    self.pointers
                        .apply_pointer_event(kind, *action_index, contacts, self.transform.as_ref())
                } else {
                    self.axes.apply_motion_sample(port, axes)
                }
            }
            RawEventKind::Key { keycode, action } => {
                match self.keys.apply_key_event(port, *keycode, *action) {
                    Ok(outcome) => {
                        if outcome.changed && event.source.is_keyboard_only() {
                            if let Some(listener) = self.keyboard_listener.as_mut() {
                                listener.on_key(self.keys.is_pressed(port, *keycode), *keycode);
                            }
                        }
                        return outcome.consumed;
                    }
                    Err(e) => Err(e),
                }
            }
        };

        if let Err(e @ InputError::OutOfRangeIndex { .. }) = &result {
            trace!("Ignoring event on port {}: {}", port, e);
        } else if let Err(e) = result {
            debug!("Event on port {} not applied: {}", port, e);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::alias::AliasPolicy;
    use crate::device::{DeviceProfile, LogAutoconfig, ProfileTable, RegistrySettings, StaticClassifier};
    use crate::event::{keycode, AxisSample, KeyAction, MotionAction, PointerSample, SourceFlags};
    use crate::state::pointer::{mouse_button, PointerRecord};
    use crate::state::sensor::NoSensors;
    use std::sync::{Arc, Mutex};

    fn identity(x: f32, y: f32) -> Option<PointerRecord> {
        Some(PointerRecord {
            x: x as i16,
            y: y as i16,
            full_x: x as i16,
            full_y: y as i16,
        })
    }

    fn state() -> InputState {
        let registry = PortRegistry::new(
            RegistrySettings {
                max_pads: 4,
                autodetect_enable: true,
                driver_ident: "test".to_string(),
            },
            ProfileTable::default(),
            AliasPolicy::default(),
            Box::new(
                StaticClassifier::new()
                    .with_device(1, DeviceProfile::new("Pad", 1, 1))
                    .with_device(2, DeviceProfile::new("Keyboard", 1, 2)),
            ),
            Box::new(LogAutoconfig),
        );
        InputState::new(
            registry,
            AxisStrategy::Extended,
            SensorPipeline::new(Box::new(NoSensors), 60),
            Box::new(identity),
        )
    }

    #[test]
    fn key_events_land_on_resolved_port() {
        let mut state = state();
        let consumed = state.apply_event(&RawInputEvent::key(1, SourceFlags::GAMEPAD, keycode::BUTTON_A, KeyAction::Down));
        assert!(consumed);
        assert!(state.keys.is_pressed(0, keycode::BUTTON_A));
    }

    #[test]
    fn volume_keys_are_passed_through() {
        let mut state = state();
        let consumed = state.apply_event(&RawInputEvent::key(1, SourceFlags::GAMEPAD, keycode::VOLUME_DOWN, KeyAction::Down));
        assert!(!consumed);
    }

    #[test]
    fn joystick_motion_feeds_axes() {
        let mut state = state();
        let sample = AxisSample {
            x: 1.0,
            hat_y: -1.0,
            ..Default::default()
        };
        state.apply_event(&RawInputEvent::axes(1, SourceFlags::JOYSTICK, sample));
        assert_eq!(state.axes.analog(0).unwrap().get(AxisSlot::X), 32767);
        assert_eq!(state.axes.hat(0).unwrap().y, -1);
        assert_eq!(state.pointers.count(), 0);
    }

    #[test]
    fn touch_motion_feeds_pointers() {
        let mut state = state();
        let contacts = vec![PointerSample { x: 10.0, y: 20.0 }];
        state.apply_event(&RawInputEvent::pointer(50, SourceFlags::TOUCHSCREEN, MotionAction::Down, 0, contacts));
        assert_eq!(state.pointers.count(), 1);
        assert!(state.pointers.is_active(0));
        assert!(state.registry.records().is_empty());
    }

    #[test]
    fn mouse_motion_updates_mouse_state() {
        let mut state = state();
        state.apply_event(&RawInputEvent::mouse(
            60,
            MotionAction::Down,
            PointerSample { x: 5.0, y: 6.0 },
            mouse_button::PRIMARY,
        ));
        assert!(state.mouse.left);
        assert_eq!((state.mouse.x, state.mouse.y), (5, 6));
    }

    #[test]
    fn unknown_devices_are_dropped() {
        let mut state = state();
        let consumed = state.apply_event(&RawInputEvent::key(77, SourceFlags::GAMEPAD, keycode::BUTTON_A, KeyAction::Down));
        assert!(consumed);
        assert!(!state.keys.is_pressed(0, keycode::BUTTON_A));
    }

    #[test]
    fn volume_keys_from_unknown_devices_pass_through() {
        let mut state = state();
        let down = RawInputEvent::key(77, SourceFlags::KEYBOARD, keycode::VOLUME_UP, KeyAction::Down);
        assert!(!state.apply_event(&down));
        let up = RawInputEvent::key(77, SourceFlags::KEYBOARD, keycode::VOLUME_UP, KeyAction::Up);
        assert!(!state.apply_event(&up));
    }

    #[test]
    fn keyboard_transitions_reach_listener() {
        let mut state = state();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        state.set_keyboard_listener(Box::new(move |down: bool, code: u32| {
            sink.lock().unwrap().push((down, code));
        }));

        state.apply_event(&RawInputEvent::key(2, SourceFlags::KEYBOARD, 29, KeyAction::Down));
        state.apply_event(&RawInputEvent::key(2, SourceFlags::KEYBOARD, 29, KeyAction::Down));
        state.apply_event(&RawInputEvent::key(2, SourceFlags::KEYBOARD, 29, KeyAction::Up));
        state.apply_event(&RawInputEvent::key(1, SourceFlags::GAMEPAD, 29, KeyAction::Down));

        assert_eq!(*seen.lock().unwrap(), vec![(true, 29), (false, 29)]);
    }
}
