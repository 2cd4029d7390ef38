//! Poll dispatcher and the platform queues it drives

pub mod dispatcher;
pub mod looper;

pub use dispatcher::{DispatchState, PollDispatcher, Wakeup};
pub use looper::{EventLooper, InputQueue, LifecycleHandler, NeverPaused, PauseSignal, PollTimeout, QueueId};
