//! Input event translation and hotplug port assignment
//!
//! Platform events (keys, joystick motion, touch and mouse contacts,
//! accelerometer samples) are drained once per frame by a poll dispatcher and
//! folded into per-port device state that frontends query through
//! [`InputDriver`].

pub mod config;
pub mod device;
pub mod dispatch;
pub mod driver;
pub mod error;
pub mod event;
pub mod joypad;
pub mod platform;
pub mod state;

pub use config::{Backend, InputConfig};
pub use driver::{DeviceClass, InputDriver, Platform};
pub use error::InputError;
pub use event::{RawInputEvent, SourceFlags};
pub use joypad::{JoypadBinds, JoypadDriver};
