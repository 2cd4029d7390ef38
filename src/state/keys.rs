//! Per-port held-key bitsets

use tracing::trace;

use crate::error::InputError;
use crate::event::{keycode, KeyAction};

/// Number of keycodes tracked per port
pub const KEYCODE_COUNT: usize = keycode::LAST as usize + 1;

const WORDS: usize = KEYCODE_COUNT.div_ceil(64);

/// Fixed-size bit vector over the keycode space
///
/// A bit is set when the latest transition seen for that keycode was a press.
/// Bits only go back to zero on an explicit release.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyBitset {
    words: [u64; WORDS],
}

impl KeyBitset {
    pub fn set(&mut self, code: usize) {
        self.words[code / 64] |= 1u64 << (code % 64);
    }

    pub fn clear(&mut self, code: usize) {
        self.words[code / 64] &= !(1u64 << (code % 64));
    }

    pub fn get(&self, code: usize) -> bool {
        code < KEYCODE_COUNT && self.words[code / 64] & (1u64 << (code % 64)) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /// Iterate over every held keycode in ascending order
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        (0..KEYCODE_COUNT).filter(|c| self.get(*c)).map(|c| c as u32)
    }
}

/// Result of applying one key event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyOutcome {
    /// Whether the platform should treat the event as handled
    pub consumed: bool,
    /// Whether the held state of the key flipped
    pub changed: bool,
}

/// Held-key state for every logical port
#[derive(Clone, Debug)]
pub struct KeyStateTracker {
    ports: Vec<KeyBitset>,
}

impl KeyStateTracker {
    pub fn new(max_pads: usize) -> Self {
        Self {
            ports: vec![KeyBitset::default(); max_pads],
        }
    }

    /// Apply a key transition to a port's bitset
    ///
    /// `Multiple` events carry no reliable press state (some pads fold the
    /// press and release of menu-style buttons into one event) and leave the
    /// bitset untouched. Volume keys are reported as not consumed so the
    /// platform can still adjust the volume.
    pub fn apply_key_event(
        &mut self,
        port: usize,
        code: u32,
        action: KeyAction,
    ) -> Result<KeyOutcome, InputError> {
        let limit = self.ports.len();
        let bits = self
            .ports
            .get_mut(port)
            .ok_or_else(|| InputError::out_of_range("port", port, limit))?;

        let index = code as usize;
        if index >= KEYCODE_COUNT {
            return Err(InputError::out_of_range("keycode", index, KEYCODE_COUNT));
        }

        let was_down = bits.get(index);
        match action {
            KeyAction::Down => bits.set(index),
            KeyAction::Up => bits.clear(index),
            KeyAction::Multiple => trace!("Ignoring folded key event for keycode {}", code),
        }

        Ok(KeyOutcome {
            consumed: !keycode::is_volume(code),
            changed: was_down != bits.get(index),
        })
    }

    pub fn is_pressed(&self, port: usize, code: u32) -> bool {
        self.ports
            .get(port)
            .is_some_and(|bits| bits.get(code as usize))
    }

    pub fn bitset(&self, port: usize) -> Option<&KeyBitset> {
        self.ports.get(port)
    }
}
