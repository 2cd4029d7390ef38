//! Platform queues backed by tokio channels
//!
//! Producers (a gilrs collector thread, a test, an embedding host) push events
//! through a [`PlatformSender`]; every push also posts a wakeup for the
//! [`ChannelLooper`], which is what the dispatcher blocks on.

use tokio::sync::{mpsc, watch};
use tracing::{debug, trace};

use crate::dispatch::{EventLooper, InputQueue, PollTimeout, QueueId};
use crate::error::InputError;
use crate::event::RawInputEvent;
use crate::state::sensor::{SensorHandle, SensorProvider, SensorSample};

/// Sensor settings last requested by the driver
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SensorControl {
    pub enabled: bool,
    pub period_us: Option<u32>,
}

/// An event as reported back through `finish_event`
#[derive(Clone, Debug, PartialEq)]
pub struct FinishedEvent {
    pub event: RawInputEvent,
    pub handled: bool,
}

/// Cloneable producer side of the channel platform
#[derive(Clone, Debug)]
pub struct PlatformSender {
    input: mpsc::UnboundedSender<RawInputEvent>,
    sensor: mpsc::UnboundedSender<SensorSample>,
    sensor_control: watch::Receiver<SensorControl>,
    wake: mpsc::UnboundedSender<QueueId>,
}

impl PlatformSender {
    pub fn send_input(&self, event: RawInputEvent) -> Result<(), InputError> {
        self.input
            .send(event)
            .map_err(|e| InputError::ChannelError(format!("input queue closed: {}", e)))?;
        self.wake(QueueId::Input)
    }

    /// Queue an accelerometer sample; samples are dropped while the stream is disabled
    pub fn send_sensor(&self, sample: SensorSample) -> Result<(), InputError> {
        if !self.sensor_control.borrow().enabled {
            trace!("Accelerometer disabled, dropping sample");
            return Ok(());
        }
        self.sensor
            .send(sample)
            .map_err(|e| InputError::ChannelError(format!("sensor queue closed: {}", e)))?;
        self.wake(QueueId::Sensor)
    }

    pub fn send_lifecycle(&self) -> Result<(), InputError> {
        self.wake(QueueId::Lifecycle)
    }

    fn wake(&self, queue: QueueId) -> Result<(), InputError> {
        self.wake
            .send(queue)
            .map_err(|e| InputError::ChannelError(format!("looper closed: {}", e)))
    }
}

/// Host side of the channel platform
pub struct PlatformFeed {
    pub sender: PlatformSender,
    finished: mpsc::UnboundedReceiver<FinishedEvent>,
    sensor_control: watch::Receiver<SensorControl>,
}

impl PlatformFeed {
    /// Next event the driver has finished, if any
    pub fn try_finished(&mut self) -> Option<FinishedEvent> {
        self.finished.try_recv().ok()
    }

    pub fn sensor_control(&self) -> SensorControl {
        *self.sensor_control.borrow()
    }
}

/// Driver side of the channel platform
pub struct ChannelPlatform {
    pub looper: ChannelLooper,
    pub input_queue: ChannelInputQueue,
    pub sensors: ChannelSensorProvider,
}

pub fn channel_platform() -> (ChannelPlatform, PlatformFeed) {
    let (input_tx, input_rx) = mpsc::unbounded_channel();
    let (sensor_tx, sensor_rx) = mpsc::unbounded_channel();
    let (wake_tx, wake_rx) = mpsc::unbounded_channel();
    let (finished_tx, finished_rx) = mpsc::unbounded_channel();
    let (control_tx, control_rx) = watch::channel(SensorControl::default());
    debug!("Created channel platform queues");

    let platform = ChannelPlatform {
        looper: ChannelLooper { wakeups: wake_rx },
        input_queue: ChannelInputQueue {
            events: input_rx,
            finished: finished_tx,
        },
        sensors: ChannelSensorProvider {
            samples: Some(sensor_rx),
            control: control_tx,
        },
    };
    let feed = PlatformFeed {
        sender: PlatformSender {
            input: input_tx,
            sensor: sensor_tx,
            sensor_control: control_rx.clone(),
            wake: wake_tx,
        },
        finished: finished_rx,
        sensor_control: control_rx,
    };
    (platform, feed)
}

pub struct ChannelLooper {
    wakeups: mpsc::UnboundedReceiver<QueueId>,
}

impl EventLooper for ChannelLooper {
    fn poll_once(&mut self, timeout: PollTimeout) -> Option<QueueId> {
        match timeout {
            PollTimeout::Immediate => self.wakeups.try_recv().ok(),
            // Must not be called from inside an async task
            PollTimeout::Infinite => self.wakeups.blocking_recv(),
        }
    }
}

pub struct ChannelInputQueue {
    events: mpsc::UnboundedReceiver<RawInputEvent>,
    finished: mpsc::UnboundedSender<FinishedEvent>,
}

impl InputQueue for ChannelInputQueue {
    fn next_event(&mut self) -> Option<RawInputEvent> {
        self.events.try_recv().ok()
    }

    fn finish_event(&mut self, event: &RawInputEvent, handled: bool) {
        let finished = FinishedEvent {
            event: event.clone(),
            handled,
        };
        if self.finished.send(finished).is_err() {
            trace!("Nobody listening for finished events");
        }
    }
}

pub struct ChannelSensorProvider {
    samples: Option<mpsc::UnboundedReceiver<SensorSample>>,
    control: watch::Sender<SensorControl>,
}

impl SensorProvider for ChannelSensorProvider {
    fn acquire_accelerometer(&mut self) -> Option<Box<dyn SensorHandle>> {
        let samples = self.samples.take()?;
        Some(Box::new(ChannelSensorHandle {
            samples,
            control: self.control.clone(),
        }))
    }
}

struct ChannelSensorHandle {
    samples: mpsc::UnboundedReceiver<SensorSample>,
    control: watch::Sender<SensorControl>,
}

impl SensorHandle for ChannelSensorHandle {
    fn enable(&mut self) {
        self.control.send_modify(|c| c.enabled = true);
    }

    fn disable(&mut self) {
        self.control.send_modify(|c| c.enabled = false);
    }

    fn set_event_period(&mut self, period_us: u32) {
        self.control.send_modify(|c| c.period_us = Some(period_us));
    }

    fn next_sample(&mut self) -> Option<SensorSample> {
        self.samples.try_recv().ok()
    }
}
