use chrono::{DateTime, Local};
use statum::{machine, state};
use tracing::{debug, info, trace};

use super::looper::{EventLooper, InputQueue, LifecycleHandler, PauseSignal, PollTimeout, QueueId};
use crate::state::InputState;

/// How often the dispatcher logs throughput
const STATS_INTERVAL_SECS: i64 = 30;

#[derive(Clone, Debug)]
struct DispatchStats {
    cycles: u64,
    events: u64,
    sensor_samples: u64,
    since: DateTime<Local>,
}

impl DispatchStats {
    fn new() -> Self {
        Self {
            cycles: 0,
            events: 0,
            sensor_samples: 0,
            since: Local::now(),
        }
    }

    fn end_cycle(&mut self) {
        self.cycles += 1;
        let now = Local::now();
        let elapsed = now - self.since;
        if elapsed > chrono::Duration::seconds(STATS_INTERVAL_SECS) {
            let seconds = elapsed.num_seconds().max(1) as f64;
            info!(
                "Dispatcher stats: {} cycles, {} events, {} sensor samples in {:.0} seconds",
                self.cycles, self.events, self.sensor_samples, seconds
            );
            info!(
                "Average: {:.2} events/cycle, {:.2} events/sec",
                self.events as f64 / self.cycles as f64,
                self.events as f64 / seconds
            );
            *self = Self::new();
        }
    }
}

/// Poll dispatcher states
#[state]
#[derive(Debug, Clone)]
pub enum DispatchState {
    Idle,
    DrainingInputQueue,
    DrainingSensorQueue,
    ProcessingLifecycleCommand,
}

/// Outcome of one multiplexer wait
pub enum Wakeup {
    Input(PollDispatcher<DrainingInputQueue>),
    Sensor(PollDispatcher<DrainingSensorQueue>),
    Lifecycle(PollDispatcher<ProcessingLifecycleCommand>),
    /// Woken for something there is nothing to do for; keep polling
    Skipped(PollDispatcher<Idle>),
    /// Nothing pending; the poll cycle is over
    Empty(PollDispatcher<Idle>),
}

/// Event loop routing platform queues into [`InputState`]
///
/// Every drain ends back in `Idle`; there is no terminal state. The machine is
/// the only writer of the state it is handed.
#[machine]
pub struct PollDispatcher<S: DispatchState> {
    looper: Box<dyn EventLooper>,
    input_queue: Box<dyn InputQueue>,
    pause: Box<dyn PauseSignal>,
    lifecycle: Box<dyn LifecycleHandler>,
    stats: DispatchStats,
}

impl PollDispatcher<Idle> {
    pub fn create(
        looper: Box<dyn EventLooper>,
        input_queue: Box<dyn InputQueue>,
        pause: Box<dyn PauseSignal>,
        lifecycle: Box<dyn LifecycleHandler>,
    ) -> Self {
        debug!("Creating poll dispatcher");
        Self::new(looper, input_queue, pause, lifecycle, DispatchStats::new())
    }

    /// Block for the next readable queue
    ///
    /// Blocks indefinitely while the host is paused, otherwise only peeks.
    pub fn wait(mut self, sensors_enabled: bool) -> Wakeup {
        let timeout = if self.pause.is_paused() {
            PollTimeout::Infinite
        } else {
            PollTimeout::Immediate
        };

        match self.looper.poll_once(timeout) {
            Some(QueueId::Input) => Wakeup::Input(self.transition()),
            Some(QueueId::Sensor) if sensors_enabled => Wakeup::Sensor(self.transition()),
            Some(QueueId::Sensor) => {
                trace!("Sensor queue woke the looper while disabled");
                Wakeup::Skipped(self)
            }
            Some(QueueId::Lifecycle) => Wakeup::Lifecycle(self.transition()),
            None => Wakeup::Empty(self),
        }
    }

    /// Run wakeups until no queue is pending
    pub fn run_cycle(self, state: &mut InputState) -> PollDispatcher<Idle> {
        let mut idle = self;
        loop {
            idle = match idle.wait(state.sensors.should_drain()) {
                Wakeup::Input(draining) => draining.drain(state),
                Wakeup::Sensor(draining) => draining.drain(state),
                Wakeup::Lifecycle(processing) => processing.forward(),
                Wakeup::Skipped(idle) => {
                    let discarded = state.sensors.discard_pending();
                    if discarded > 0 {
                        trace!("Discarded {} stale sensor samples", discarded);
                    }
                    idle
                }
                Wakeup::Empty(mut idle) => {
                    idle.stats.end_cycle();
                    return idle;
                }
            };
        }
    }
}

impl PollDispatcher<DrainingInputQueue> {
    /// Pop and route every pending input event
    pub fn drain(mut self, state: &mut InputState) -> PollDispatcher<Idle> {
        let mut handled_count = 0u64;
        while let Some(event) = self.input_queue.next_event() {
            if self.input_queue.pre_dispatch(&event) {
                trace!("Event from raw device {} taken by pre-dispatch", event.device_id);
                continue;
            }
            let handled = state.apply_event(&event);
            self.input_queue.finish_event(&event, handled);
            handled_count += 1;
        }

        if handled_count > 0 {
            debug!("Drained {} input events", handled_count);
        }
        self.stats.events += handled_count;
        self.transition()
    }
}

impl PollDispatcher<DrainingSensorQueue> {
    /// Drain the accelerometer queue, keeping the newest sample
    pub fn drain(mut self, state: &mut InputState) -> PollDispatcher<Idle> {
        let drained = state.sensors.drain();
        trace!("Drained {} sensor samples", drained);
        self.stats.sensor_samples += drained as u64;
        self.transition()
    }
}

impl PollDispatcher<ProcessingLifecycleCommand> {
    pub fn forward(mut self) -> PollDispatcher<Idle> {
        debug!("Forwarding lifecycle command");
        self.lifecycle.process_command();
        self.transition()
    }
}
