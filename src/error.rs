//! Error definitions for the input subsystem

use thiserror::Error;

/// Errors raised while translating platform events into device state
///
/// Only [`InputError::InitializationError`] and [`InputError::ConfigError`] are
/// fatal. Every other variant describes a single dropped event; the dispatcher
/// logs it and moves on to the next queued event.
#[derive(Debug, Error)]
pub enum InputError {
    /// All logical ports are taken
    ///
    /// The event that triggered the hotplug is dropped. A later event from the
    /// same raw id will try again.
    #[error("Port limit reached: raw device {raw_id} ignored ({max_pads} pads already assigned)")]
    ResourceExhausted { raw_id: i32, max_pads: usize },

    /// The platform could not resolve name or ids for a device
    #[error("Could not classify raw device {raw_id}")]
    ClassificationFailed { raw_id: i32 },

    /// A keycode, pointer or slot index outside the tracked range
    #[error("{kind} index {index} out of range (limit {limit})")]
    OutOfRangeIndex {
        kind: &'static str,
        index: usize,
        limit: usize,
    },

    /// The subsystem could not start
    #[error("Initialization error: {0}")]
    InitializationError(String),

    /// Invalid configuration values
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A platform queue was disconnected
    #[error("Channel error: {0}")]
    ChannelError(String),
}

impl InputError {
    /// Shorthand for [`InputError::OutOfRangeIndex`]
    pub fn out_of_range(kind: &'static str, index: usize, limit: usize) -> Self {
        Self::OutOfRangeIndex { kind, index, limit }
    }
}
