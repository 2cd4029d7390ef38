//! RetroPad view over the tracked device state
//!
//! Cores ask for abstract RetroPad buttons and sticks. [`JoypadBinds`] maps
//! each RetroPad button to the platform keycode that drives it, and
//! [`JoypadDriver`] answers the queries from the key, hat and axis trackers.

use serde::{Deserialize, Serialize};

use crate::event::keycode;
use crate::state::axis::{AxisSlot, AXIS_MAX};
use crate::state::InputState;

/// RetroPad button ids
pub mod button {
    pub const B: u32 = 0;
    pub const Y: u32 = 1;
    pub const SELECT: u32 = 2;
    pub const START: u32 = 3;
    pub const UP: u32 = 4;
    pub const DOWN: u32 = 5;
    pub const LEFT: u32 = 6;
    pub const RIGHT: u32 = 7;
    pub const A: u32 = 8;
    pub const X: u32 = 9;
    pub const L: u32 = 10;
    pub const R: u32 = 11;
    pub const L2: u32 = 12;
    pub const R2: u32 = 13;
    pub const L3: u32 = 14;
    pub const R3: u32 = 15;
}

/// Analog stick indices and axis ids
pub mod analog {
    pub const INDEX_LEFT: u32 = 0;
    pub const INDEX_RIGHT: u32 = 1;
    pub const ID_X: u32 = 0;
    pub const ID_Y: u32 = 1;
}

/// Keycodes that emulate one analog axis when the stick is at rest
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitalAxis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minus: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plus: Option<u32>,
}

/// RetroPad button to platform keycode table
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoypadBinds {
    pub b: u32,
    pub y: u32,
    pub select: u32,
    pub start: u32,
    pub up: u32,
    pub down: u32,
    pub left: u32,
    pub right: u32,
    pub a: u32,
    pub x: u32,
    pub l: u32,
    pub r: u32,
    pub l2: u32,
    pub r2: u32,
    pub l3: u32,
    pub r3: u32,
    pub left_x: DigitalAxis,
    pub left_y: DigitalAxis,
    pub right_x: DigitalAxis,
    pub right_y: DigitalAxis,
}

impl Default for JoypadBinds {
    fn default() -> Self {
        Self {
            b: keycode::BUTTON_B,
            y: keycode::BUTTON_Y,
            select: keycode::BUTTON_SELECT,
            start: keycode::BUTTON_START,
            up: keycode::DPAD_UP,
            down: keycode::DPAD_DOWN,
            left: keycode::DPAD_LEFT,
            right: keycode::DPAD_RIGHT,
            a: keycode::BUTTON_A,
            x: keycode::BUTTON_X,
            l: keycode::BUTTON_L1,
            r: keycode::BUTTON_R1,
            l2: keycode::BUTTON_L2,
            r2: keycode::BUTTON_R2,
            l3: keycode::BUTTON_THUMBL,
            r3: keycode::BUTTON_THUMBR,
            left_x: DigitalAxis::default(),
            left_y: DigitalAxis::default(),
            right_x: DigitalAxis::default(),
            right_y: DigitalAxis::default(),
        }
    }
}

impl JoypadBinds {
    /// Platform keycode bound to a RetroPad button
    pub fn keycode_for(&self, id: u32) -> Option<u32> {
        let code = match id {
            button::B => self.b,
            button::Y => self.y,
            button::SELECT => self.select,
            button::START => self.start,
            button::UP => self.up,
            button::DOWN => self.down,
            button::LEFT => self.left,
            button::RIGHT => self.right,
            button::A => self.a,
            button::X => self.x,
            button::L => self.l,
            button::R => self.r,
            button::L2 => self.l2,
            button::R2 => self.r2,
            button::L3 => self.l3,
            button::R3 => self.r3,
            _ => return None,
        };
        Some(code)
    }

    fn digital_axis(&self, index: u32, id: u32) -> Option<&DigitalAxis> {
        match (index, id) {
            (analog::INDEX_LEFT, analog::ID_X) => Some(&self.left_x),
            (analog::INDEX_LEFT, analog::ID_Y) => Some(&self.left_y),
            (analog::INDEX_RIGHT, analog::ID_X) => Some(&self.right_x),
            (analog::INDEX_RIGHT, analog::ID_Y) => Some(&self.right_y),
            _ => None,
        }
    }
}

/// Joypad driver handed to cores
#[derive(Clone, Debug)]
pub struct JoypadDriver {
    binds: JoypadBinds,
}

impl JoypadDriver {
    pub const IDENT: &'static str = "android";

    pub fn new(binds: JoypadBinds) -> Self {
        Self { binds }
    }

    pub fn ident(&self) -> &'static str {
        Self::IDENT
    }

    pub fn binds(&self) -> &JoypadBinds {
        &self.binds
    }

    /// Whether a RetroPad button is held on `port`
    ///
    /// D-pad buttons also read the port's hat.
    pub fn pressed(&self, state: &InputState, port: usize, id: u32) -> bool {
        let key_held = self
            .binds
            .keycode_for(id)
            .map_or(false, |code| state.keys.is_pressed(port, code));
        if key_held {
            return true;
        }

        let hat = match state.axes.hat(port) {
            Some(hat) => hat,
            None => return false,
        };
        match id {
            button::UP => hat.y == -1,
            button::DOWN => hat.y == 1,
            button::LEFT => hat.x == -1,
            button::RIGHT => hat.x == 1,
            _ => false,
        }
    }

    /// Value of one analog stick axis on `port`
    pub fn analog(&self, state: &InputState, port: usize, index: u32, id: u32) -> i16 {
        let slot = match (index, id) {
            (analog::INDEX_LEFT, analog::ID_X) => AxisSlot::X,
            (analog::INDEX_LEFT, analog::ID_Y) => AxisSlot::Y,
            (analog::INDEX_RIGHT, analog::ID_X) => AxisSlot::Z,
            (analog::INDEX_RIGHT, analog::ID_Y) => AxisSlot::Rz,
            _ => return 0,
        };

        let value = state.axes.analog(port).map_or(0, |a| a.get(slot));
        if value != 0 {
            return value;
        }

        let Some(digital) = self.binds.digital_axis(index, id) else {
            return 0;
        };
        let held = |code: Option<u32>| code.map_or(false, |c| state.keys.is_pressed(port, c));
        let mut emulated = 0;
        if held(digital.minus) {
            emulated -= AXIS_MAX;
        }
        if held(digital.plus) {
            emulated += AXIS_MAX;
        }
        emulated
    }
}

impl Default for JoypadDriver {
    fn default() -> Self {
        Self::new(JoypadBinds::default())
    }
}
