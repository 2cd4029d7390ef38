//! Analog axis and hat normalization
//!
//! Joystick motion events carry normalized floats. They are stored as signed
//! 16-bit fixed point values per logical slot, plus a discrete hat vector.

use tracing::trace;

use crate::error::InputError;
use crate::event::AxisSample;

/// Number of analog slots kept per port, reserved slots included
pub const ANALOG_SLOTS: usize = 10;

/// Largest magnitude stored in an analog slot
pub const AXIS_MAX: i16 = 0x7fff;

/// Logical analog slots
///
/// Slots 4 and 5 belong to the hat axes, which are tracked in [`HatState`]
/// instead, so they have no variant here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AxisSlot {
    X,
    Y,
    Z,
    Rz,
    LeftTrigger,
    RightTrigger,
    Brake,
    Gas,
}

impl AxisSlot {
    pub const ALL: [AxisSlot; 8] = [
        AxisSlot::X,
        AxisSlot::Y,
        AxisSlot::Z,
        AxisSlot::Rz,
        AxisSlot::LeftTrigger,
        AxisSlot::RightTrigger,
        AxisSlot::Brake,
        AxisSlot::Gas,
    ];

    pub fn index(self) -> usize {
        match self {
            AxisSlot::X => 0,
            AxisSlot::Y => 1,
            AxisSlot::Z => 2,
            AxisSlot::Rz => 3,
            AxisSlot::LeftTrigger => 6,
            AxisSlot::RightTrigger => 7,
            AxisSlot::Brake => 8,
            AxisSlot::Gas => 9,
        }
    }

    /// Map a raw slot index back to its slot
    ///
    /// Reserved indices 4 and 5 are rejected like any other out of range index.
    pub fn from_index(index: usize) -> Result<Self, InputError> {
        AxisSlot::ALL
            .into_iter()
            .find(|slot| slot.index() == index)
            .ok_or_else(|| InputError::out_of_range("analog slot", index, ANALOG_SLOTS))
    }
}

/// Extraction strategy for joystick motion events
///
/// Picked once when the driver is built and fixed for the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AxisStrategy {
    /// X/Y only, for platforms without per-axis queries
    Basic,
    /// Every stick, trigger, pedal and hat axis
    #[default]
    Extended,
}

/// Scale a normalized axis value to fixed point
///
/// `round(v * 32767)` clamped to `[-32767, 32767]`. NaN maps to 0.
pub fn scale_axis(value: f32) -> i16 {
    let max = f32::from(AXIS_MAX);
    (value * max).round().clamp(-max, max) as i16
}

/// Narrow a hat axis value to `{-1, 0, 1}`, truncating toward zero
pub fn hat_direction(value: f32) -> i8 {
    value.trunc().clamp(-1.0, 1.0) as i8
}

/// Fixed point analog values of one port
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnalogState {
    values: [i16; ANALOG_SLOTS],
}

impl AnalogState {
    pub fn get(&self, slot: AxisSlot) -> i16 {
        self.values[slot.index()]
    }

    pub fn set(&mut self, slot: AxisSlot, value: i16) {
        self.values[slot.index()] = value;
    }

    /// Read a slot by raw index; reserved and out of range indices read 0
    pub fn by_index(&self, index: usize) -> i16 {
        AxisSlot::from_index(index)
            .map(|slot| self.get(slot))
            .unwrap_or(0)
    }
}

/// Discrete hat vector of one port
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HatState {
    pub x: i8,
    pub y: i8,
}

/// Analog and hat state for every logical port
#[derive(Clone, Debug)]
pub struct AxisNormalizer {
    strategy: AxisStrategy,
    analog: Vec<AnalogState>,
    hats: Vec<HatState>,
}

impl AxisNormalizer {
    pub fn new(max_pads: usize, strategy: AxisStrategy) -> Self {
        Self {
            strategy,
            analog: vec![AnalogState::default(); max_pads],
            hats: vec![HatState::default(); max_pads],
        }
    }

    pub fn strategy(&self) -> AxisStrategy {
        self.strategy
    }

    /// Store the latest motion sample for a port
    pub fn apply_motion_sample(&mut self, port: usize, sample: &AxisSample) -> Result<(), InputError> {
        let limit = self.analog.len();
        let (analog, hat) = match (self.analog.get_mut(port), self.hats.get_mut(port)) {
            (Some(analog), Some(hat)) => (analog, hat),
            _ => return Err(InputError::out_of_range("port", port, limit)),
        };

        analog.set(AxisSlot::X, scale_axis(sample.x));
        analog.set(AxisSlot::Y, scale_axis(sample.y));

        if self.strategy == AxisStrategy::Extended {
            analog.set(AxisSlot::Z, scale_axis(sample.z));
            analog.set(AxisSlot::Rz, scale_axis(sample.rz));
            analog.set(AxisSlot::LeftTrigger, scale_axis(sample.left_trigger));
            analog.set(AxisSlot::RightTrigger, scale_axis(sample.right_trigger));
            analog.set(AxisSlot::Brake, scale_axis(sample.brake));
            analog.set(AxisSlot::Gas, scale_axis(sample.gas));

            hat.x = hat_direction(sample.hat_x);
            hat.y = hat_direction(sample.hat_y);
        }

        trace!("Port {} analog {:?} hat {:?}", port, analog, hat);
        Ok(())
    }

    pub fn analog(&self, port: usize) -> Option<&AnalogState> {
        self.analog.get(port)
    }

    pub fn hat(&self, port: usize) -> Option<HatState> {
        self.hats.get(port).copied()
    }
}
