//! Platform event sources the dispatcher multiplexes

use tokio::sync::watch;

use crate::event::RawInputEvent;

/// Identifier of the queue that woke the multiplexer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueueId {
    Input,
    Sensor,
    Lifecycle,
}

/// How long one multiplexer call may block
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollTimeout {
    /// Return right away when nothing is pending
    Immediate,
    /// Block until some queue becomes readable
    Infinite,
}

/// Blocking multiplexer over the platform queues
pub trait EventLooper: Send {
    /// Wait for one queue to become readable
    ///
    /// `None` means nothing is pending (or the looper was woken without an
    /// identifier) and ends the current poll cycle.
    fn poll_once(&mut self, timeout: PollTimeout) -> Option<QueueId>;
}

/// The platform input queue
pub trait InputQueue: Send {
    /// Pop the next pending event without blocking
    fn next_event(&mut self) -> Option<RawInputEvent>;

    /// Offer an event to the platform (IME and similar) before it is handled
    ///
    /// Returning `true` means the platform took ownership and will finish the
    /// event itself.
    fn pre_dispatch(&mut self, _event: &RawInputEvent) -> bool {
        false
    }

    /// Report an event back to the platform
    fn finish_event(&mut self, event: &RawInputEvent, handled: bool);
}

/// Whether the host application is paused
pub trait PauseSignal: Send {
    fn is_paused(&self) -> bool;
}

impl PauseSignal for watch::Receiver<bool> {
    fn is_paused(&self) -> bool {
        *self.borrow()
    }
}

/// Pause signal for hosts that never pause
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverPaused;

impl PauseSignal for NeverPaused {
    fn is_paused(&self) -> bool {
        false
    }
}

/// Consumer of lifecycle commands; the commands themselves are opaque here
pub trait LifecycleHandler: Send {
    fn process_command(&mut self);
}

impl<F> LifecycleHandler for F
where
    F: FnMut() + Send,
{
    fn process_command(&mut self) {
        self()
    }
}
