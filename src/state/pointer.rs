//! Touch contact and mouse tracking
//!
//! Active contacts are kept as a gap-free prefix of a bounded array. Releasing
//! a contact shifts every later contact down by one slot, so contact `i` of the
//! emulated pointer device is always the `i`-th oldest live touch.

use tracing::{debug, trace};

use crate::error::InputError;
use crate::event::{MotionAction, PointerSample, SourceFlags};

/// Maximum number of simultaneous contacts
pub const MAX_TOUCH: usize = 16;

/// Coordinate value meaning "not pressed"
pub const POINTER_SENTINEL: i16 = -0x8000;

/// One active contact in viewport and full-screen coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PointerRecord {
    pub x: i16,
    pub y: i16,
    pub full_x: i16,
    pub full_y: i16,
}

impl PointerRecord {
    pub const RELEASED: PointerRecord = PointerRecord {
        x: POINTER_SENTINEL,
        y: POINTER_SENTINEL,
        full_x: POINTER_SENTINEL,
        full_y: POINTER_SENTINEL,
    };
}

/// Converts raw screen positions into pointer coordinates
///
/// Returns `None` when no viewport is available, in which case the previous
/// coordinates of the contact are kept.
pub trait CoordinateTransform: Send {
    fn translate(&self, x: f32, y: f32) -> Option<PointerRecord>;
}

impl<F> CoordinateTransform for F
where
    F: Fn(f32, f32) -> Option<PointerRecord> + Send,
{
    fn translate(&self, x: f32, y: f32) -> Option<PointerRecord> {
        self(x, y)
    }
}

/// Rectangle of the screen the emulated content is drawn into
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Default transform scaling into `[-0x7fff, 0x7fff]`
///
/// Positions outside the viewport (or the screen, for the full coordinates)
/// become [`POINTER_SENTINEL`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewportTransform {
    pub viewport: Viewport,
    pub screen_width: u32,
    pub screen_height: u32,
}

impl ViewportTransform {
    fn scale(position: i64, extent: u32) -> i16 {
        let max = i64::from(i16::MAX);
        let scaled = (2 * position * max) / i64::from(extent) - max;
        if (-max..=max).contains(&scaled) {
            scaled as i16
        } else {
            POINTER_SENTINEL
        }
    }
}

impl CoordinateTransform for ViewportTransform {
    fn translate(&self, x: f32, y: f32) -> Option<PointerRecord> {
        let vp = self.viewport;
        if vp.width == 0 || vp.height == 0 || self.screen_width == 0 || self.screen_height == 0 {
            return None;
        }

        let (x, y) = (x as i64, y as i64);
        Some(PointerRecord {
            x: Self::scale(x - i64::from(vp.x), vp.width),
            y: Self::scale(y - i64::from(vp.y), vp.height),
            full_x: Self::scale(x, self.screen_width),
            full_y: Self::scale(y, self.screen_height),
        })
    }
}

/// What a motion event means for the contact list
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Press,
    Move,
    Release,
}

impl PointerKind {
    /// Classify a motion action
    ///
    /// Mouse-only sources have no sustained contact: anything except a fresh
    /// press counts as a release.
    pub fn classify(action: MotionAction, source: SourceFlags) -> Self {
        if action.ends_contact() || (source.is_mouse_only() && action != MotionAction::Down) {
            PointerKind::Release
        } else if matches!(action, MotionAction::Down | MotionAction::PointerDown) {
            PointerKind::Press
        } else {
            PointerKind::Move
        }
    }
}

/// Ordered, bounded list of live contacts
#[derive(Clone, Debug)]
pub struct PointerTracker {
    records: [PointerRecord; MAX_TOUCH],
    count: usize,
}

impl Default for PointerTracker {
    fn default() -> Self {
        Self {
            records: [PointerRecord::default(); MAX_TOUCH],
            count: 0,
        }
    }
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one pointer event
    ///
    /// Presses and moves refresh every contact reported by the event. A
    /// release removes the contact at `index` and compacts the list.
    pub fn apply_pointer_event(
        &mut self,
        kind: PointerKind,
        index: usize,
        contacts: &[PointerSample],
        transform: &dyn CoordinateTransform,
    ) -> Result<(), InputError> {
        match kind {
            PointerKind::Release => self.release(index),
            PointerKind::Press | PointerKind::Move => {
                for (slot, contact) in contacts.iter().take(MAX_TOUCH).enumerate() {
                    if let Some(record) = transform.translate(contact.x, contact.y) {
                        self.records[slot] = record;
                    }
                    self.count = self.count.max(slot + 1);
                }
                trace!("Pointer update: {} contacts live", self.count);
                Ok(())
            }
        }
    }

    fn release(&mut self, index: usize) -> Result<(), InputError> {
        if index >= MAX_TOUCH {
            return Err(InputError::out_of_range("pointer", index, MAX_TOUCH));
        }

        self.records.copy_within(index + 1.., index);
        self.records[MAX_TOUCH - 1] = PointerRecord::RELEASED;
        self.count = self.count.saturating_sub(1);
        debug!("Pointer {} released, {} contacts live", index, self.count);
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn record(&self, index: usize) -> Option<&PointerRecord> {
        self.records.get(index)
    }

    /// Live contact in viewport space
    pub fn is_active(&self, index: usize) -> bool {
        self.record(index).is_some_and(|r| {
            index < self.count && r.x != POINTER_SENTINEL && r.y != POINTER_SENTINEL
        })
    }

    /// Live contact in full-screen space
    pub fn is_active_on_screen(&self, index: usize) -> bool {
        self.record(index).is_some_and(|r| {
            index < self.count && r.full_x != POINTER_SENTINEL && r.full_y != POINTER_SENTINEL
        })
    }

    /// Live contacts, oldest first
    pub fn live(&self) -> &[PointerRecord] {
        &self.records[..self.count]
    }
}

/// Primary and secondary button bits of a mouse motion event
pub mod mouse_button {
    pub const PRIMARY: u32 = 1 << 0;
    pub const SECONDARY: u32 = 1 << 1;
}

/// Latest mouse position and buttons
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MouseState {
    pub x: i16,
    pub y: i16,
    pub left: bool,
    pub right: bool,
}

impl MouseState {
    pub fn apply(&mut self, position: Option<&PointerSample>, buttons: u32) {
        if let Some(position) = position {
            self.x = position.x.clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16;
            self.y = position.y.clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16;
        }
        self.left = buttons & mouse_button::PRIMARY != 0;
        self.right = buttons & mouse_button::SECONDARY != 0;
    }
}
