//! Raw platform events as delivered by the input queue
//!
//! These types mirror what a mobile input queue hands out: an opaque device id,
//! a source bitmask, and either a key transition or a motion sample carrying
//! every active contact plus the joystick axis values.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Source classes reported for an input device
    ///
    /// The low byte holds the class bits, the upper bits identify the concrete
    /// source. Values follow the Android `AINPUT_SOURCE_*` numbering.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SourceFlags: u32 {
        const CLASS_BUTTON = 0x0000_0001;
        const CLASS_POINTER = 0x0000_0002;
        const CLASS_NAVIGATION = 0x0000_0004;
        const CLASS_POSITION = 0x0000_0008;
        const CLASS_JOYSTICK = 0x0000_0010;

        const KEYBOARD = 0x0000_0100 | Self::CLASS_BUTTON.bits();
        const DPAD = 0x0000_0200 | Self::CLASS_BUTTON.bits();
        const GAMEPAD = 0x0000_0400 | Self::CLASS_BUTTON.bits();
        const TOUCHSCREEN = 0x0000_1000 | Self::CLASS_POINTER.bits();
        const MOUSE = 0x0000_2000 | Self::CLASS_POINTER.bits();
        const STYLUS = 0x0000_4000 | Self::CLASS_POINTER.bits();
        const TRACKBALL = 0x0001_0000 | Self::CLASS_NAVIGATION.bits();
        const TOUCHPAD = 0x0010_0000 | Self::CLASS_POSITION.bits();
        const JOYSTICK = 0x0100_0000 | Self::CLASS_JOYSTICK.bits();
    }
}

impl SourceFlags {
    /// Touch overlay sources always belong to the first player
    ///
    /// Any pointer or position class source qualifies, styluses included.
    pub fn is_touch_overlay(self) -> bool {
        self.intersects(Self::TOUCHSCREEN | Self::MOUSE | Self::TOUCHPAD)
    }

    /// True when the event comes from a touchscreen and/or mouse and nothing else
    pub fn is_pointer_only(self) -> bool {
        !self.is_empty() && (self - (Self::TOUCHSCREEN | Self::MOUSE)).is_empty()
    }

    /// A single-contact pointing device without multi-touch
    pub fn is_mouse_only(self) -> bool {
        self == Self::MOUSE
    }

    pub fn is_keyboard_only(self) -> bool {
        self == Self::KEYBOARD
    }
}

/// Key transition reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyAction {
    Down,
    Up,
    /// Several repeats or a down/up pair folded into one event
    Multiple,
}

/// Masked motion action reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionAction {
    Down,
    Up,
    Move,
    Cancel,
    Outside,
    PointerDown,
    PointerUp,
    HoverMove,
    Scroll,
}

impl MotionAction {
    /// Actions that end a contact on a multi-touch surface
    pub fn ends_contact(self) -> bool {
        matches!(self, Self::Up | Self::Cancel | Self::PointerUp)
    }
}

/// Raw position of one contact in screen pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    pub x: f32,
    pub y: f32,
}

/// Normalized axis values attached to a joystick motion event
///
/// Sticks and triggers are expected in `[-1, 1]`, hats in `{-1, 0, 1}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub rz: f32,
    pub hat_x: f32,
    pub hat_y: f32,
    pub left_trigger: f32,
    pub right_trigger: f32,
    pub brake: f32,
    pub gas: f32,
}

/// Payload of a raw event
#[derive(Debug, Clone, PartialEq)]
pub enum RawEventKind {
    Key {
        keycode: u32,
        action: KeyAction,
    },
    Motion {
        action: MotionAction,
        /// Index of the contact the action refers to
        action_index: usize,
        /// Every contact currently reported by the event, in platform order
        contacts: Vec<PointerSample>,
        axes: AxisSample,
        /// Mouse button bits, see [`crate::state::pointer::mouse_button`]
        buttons: u32,
    },
}

/// One event popped from the platform input queue
#[derive(Debug, Clone, PartialEq)]
pub struct RawInputEvent {
    pub device_id: i32,
    pub source: SourceFlags,
    pub kind: RawEventKind,
}

impl RawInputEvent {
    pub fn key(device_id: i32, source: SourceFlags, keycode: u32, action: KeyAction) -> Self {
        Self {
            device_id,
            source,
            kind: RawEventKind::Key { keycode, action },
        }
    }

    /// Joystick motion carrying axis values only
    pub fn axes(device_id: i32, source: SourceFlags, axes: AxisSample) -> Self {
        Self {
            device_id,
            source,
            kind: RawEventKind::Motion {
                action: MotionAction::Move,
                action_index: 0,
                contacts: Vec::new(),
                axes,
                buttons: 0,
            },
        }
    }

    /// Touch or mouse motion
    pub fn pointer(
        device_id: i32,
        source: SourceFlags,
        action: MotionAction,
        action_index: usize,
        contacts: Vec<PointerSample>,
    ) -> Self {
        Self {
            device_id,
            source,
            kind: RawEventKind::Motion {
                action,
                action_index,
                contacts,
                axes: AxisSample::default(),
                buttons: 0,
            },
        }
    }

    /// Mouse motion with the button state at the time of the event
    pub fn mouse(device_id: i32, action: MotionAction, position: PointerSample, buttons: u32) -> Self {
        Self {
            device_id,
            source: SourceFlags::MOUSE,
            kind: RawEventKind::Motion {
                action,
                action_index: 0,
                contacts: vec![position],
                axes: AxisSample::default(),
                buttons,
            },
        }
    }
}

/// Platform keycodes used by the input core
pub mod keycode {
    pub const DPAD_UP: u32 = 19;
    pub const DPAD_DOWN: u32 = 20;
    pub const DPAD_LEFT: u32 = 21;
    pub const DPAD_RIGHT: u32 = 22;
    pub const VOLUME_UP: u32 = 24;
    pub const VOLUME_DOWN: u32 = 25;
    pub const BACK: u32 = 4;
    pub const MENU: u32 = 82;
    pub const BUTTON_A: u32 = 96;
    pub const BUTTON_B: u32 = 97;
    pub const BUTTON_C: u32 = 98;
    pub const BUTTON_X: u32 = 99;
    pub const BUTTON_Y: u32 = 100;
    pub const BUTTON_Z: u32 = 101;
    pub const BUTTON_L1: u32 = 102;
    pub const BUTTON_R1: u32 = 103;
    pub const BUTTON_L2: u32 = 104;
    pub const BUTTON_R2: u32 = 105;
    pub const BUTTON_THUMBL: u32 = 106;
    pub const BUTTON_THUMBR: u32 = 107;
    pub const BUTTON_START: u32 = 108;
    pub const BUTTON_SELECT: u32 = 109;
    pub const BUTTON_MODE: u32 = 110;
    pub const ASSIST: u32 = 219;

    /// Highest keycode tracked by the key bitsets
    pub const LAST: u32 = ASSIST;

    /// Keys whose default platform handling must still run
    pub fn is_volume(code: u32) -> bool {
        code == VOLUME_UP || code == VOLUME_DOWN
    }
}
