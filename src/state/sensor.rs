//! Accelerometer stream management

use bitflags::bitflags;
use tracing::{debug, info, warn};

/// Rate used when a caller asks for 0 Hz
pub const DEFAULT_SENSOR_RATE_HZ: u32 = 60;

/// One accelerometer reading
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SensorSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Sensor actions a core may request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SensorAction {
    AccelerometerEnable,
    AccelerometerDisable,
    GyroscopeEnable,
    GyroscopeDisable,
}

/// Sensor ids readable through `get_sensor_input`
pub mod sensor_id {
    pub const ACCELEROMETER_X: u32 = 0;
    pub const ACCELEROMETER_Y: u32 = 1;
    pub const ACCELEROMETER_Z: u32 = 2;
}

bitflags! {
    /// Enabled/disabled flag pair; at most one bit is set
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct SensorStateMask: u8 {
        const ENABLED = 1 << 0;
        const DISABLED = 1 << 1;
    }
}

/// Platform access to the sensor hardware
pub trait SensorProvider: Send {
    /// Acquire the default accelerometer, if the device has one
    fn acquire_accelerometer(&mut self) -> Option<Box<dyn SensorHandle>>;
}

/// An acquired accelerometer attached to the sensor queue
///
/// Dropping the handle releases the platform queue.
pub trait SensorHandle: Send {
    fn enable(&mut self);

    fn disable(&mut self);

    /// Request one sample every `period_us` microseconds
    fn set_event_period(&mut self, period_us: u32);

    /// Pop the next buffered sample
    fn next_sample(&mut self) -> Option<SensorSample>;
}

/// Provider for platforms without an accelerometer
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSensors;

impl SensorProvider for NoSensors {
    fn acquire_accelerometer(&mut self) -> Option<Box<dyn SensorHandle>> {
        None
    }
}

pub struct SensorPipeline {
    provider: Box<dyn SensorProvider>,
    handle: Option<Box<dyn SensorHandle>>,
    mask: SensorStateMask,
    default_rate_hz: u32,
    latest: SensorSample,
}

impl SensorPipeline {
    pub fn new(provider: Box<dyn SensorProvider>, default_rate_hz: u32) -> Self {
        let default_rate_hz = if default_rate_hz == 0 {
            DEFAULT_SENSOR_RATE_HZ
        } else {
            default_rate_hz
        };
        Self {
            provider,
            handle: None,
            mask: SensorStateMask::empty(),
            default_rate_hz,
            latest: SensorSample::default(),
        }
    }

    /// Sample period in microseconds for a requested rate
    pub fn period_us(&self, rate_hz: u32) -> u32 {
        let rate = if rate_hz == 0 { self.default_rate_hz } else { rate_hz };
        1_000_000 / rate
    }

    /// Enable or disable the accelerometer stream
    pub fn set_sensor_enabled(&mut self, enable: bool, rate_hz: u32) {
        if enable {
            if self.handle.is_none() {
                debug!("Acquiring accelerometer from platform");
                self.handle = self.provider.acquire_accelerometer();
                if self.handle.is_none() {
                    warn!("No accelerometer available");
                }
            }

            let period = self.period_us(rate_hz);
            if let Some(handle) = self.handle.as_mut() {
                handle.enable();
                handle.set_event_period(period);
                info!("Accelerometer enabled, period {} us", period);
            }

            self.mask.remove(SensorStateMask::DISABLED);
            self.mask.insert(SensorStateMask::ENABLED);
        } else {
            if let Some(handle) = self.handle.as_mut() {
                handle.disable();
                info!("Accelerometer disabled");
            }

            self.mask.remove(SensorStateMask::ENABLED);
            self.mask.insert(SensorStateMask::DISABLED);
        }
    }

    /// Apply a core sensor request; unsupported sensors return `false`
    pub fn set_sensor_state(&mut self, action: SensorAction, rate_hz: u32) -> bool {
        match action {
            SensorAction::AccelerometerEnable => {
                self.set_sensor_enabled(true, rate_hz);
                true
            }
            SensorAction::AccelerometerDisable => {
                self.set_sensor_enabled(false, rate_hz);
                true
            }
            SensorAction::GyroscopeEnable | SensorAction::GyroscopeDisable => {
                debug!("Unsupported sensor action: {:?}", action);
                false
            }
        }
    }

    pub fn mask(&self) -> SensorStateMask {
        self.mask
    }

    /// Whether the dispatcher should drain the sensor queue
    pub fn should_drain(&self) -> bool {
        self.mask.contains(SensorStateMask::ENABLED) && self.handle.is_some()
    }

    /// Drain buffered samples and keep the most recent one
    pub fn drain(&mut self) -> usize {
        let mut drained = 0;
        if !self.should_drain() {
            return drained;
        }
        if let Some(handle) = self.handle.as_mut() {
            while let Some(sample) = handle.next_sample() {
                self.latest = sample;
                drained += 1;
            }
        }
        drained
    }

    /// Throw away samples queued while the stream is off
    pub fn discard_pending(&mut self) -> usize {
        let mut discarded = 0;
        if let Some(handle) = self.handle.as_mut() {
            while handle.next_sample().is_some() {
                discarded += 1;
            }
        }
        discarded
    }

    pub fn latest_sample(&self) -> SensorSample {
        self.latest
    }

    pub fn sensor_input(&self, id: u32) -> f32 {
        match id {
            sensor_id::ACCELEROMETER_X => self.latest.x,
            sensor_id::ACCELEROMETER_Y => self.latest.y,
            sensor_id::ACCELEROMETER_Z => self.latest.z,
            _ => 0.0,
        }
    }

    /// Release the sensor queue; safe to call more than once
    pub fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            drop(handle);
            info!("Accelerometer queue released");
        }
    }
}

impl Drop for SensorPipeline {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Log {
        acquired: usize,
        periods: Vec<u32>,
        enabled: bool,
        released: usize,
        samples: VecDeque<SensorSample>,
    }

    struct FakeProvider(Arc<Mutex<Log>>);
    struct FakeHandle(Arc<Mutex<Log>>);

    impl SensorProvider for FakeProvider {
        fn acquire_accelerometer(&mut self) -> Option<Box<dyn SensorHandle>> {
            self.0.lock().unwrap().acquired += 1;
            Some(Box::new(FakeHandle(self.0.clone())))
        }
    }

    impl SensorHandle for FakeHandle {
        fn enable(&mut self) {
            self.0.lock().unwrap().enabled = true;
        }
        fn disable(&mut self) {
            self.0.lock().unwrap().enabled = false;
        }
        fn set_event_period(&mut self, period_us: u32) {
            self.0.lock().unwrap().periods.push(period_us);
        }
        fn next_sample(&mut self) -> Option<SensorSample> {
            self.0.lock().unwrap().samples.pop_front()
        }
    }

    impl Drop for FakeHandle {
        fn drop(&mut self) {
            self.0.lock().unwrap().released += 1;
        }
    }

    fn pipeline() -> (SensorPipeline, Arc<Mutex<Log>>) {
        let log = Arc::new(Mutex::new(Log::default()));
        let pipeline = SensorPipeline::new(Box::new(FakeProvider(log.clone())), DEFAULT_SENSOR_RATE_HZ);
        (pipeline, log)
    }

    #[test]
    fn zero_rate_defaults_to_sixty_hz() {
        let (mut sensors, log) = pipeline();
        assert!(sensors.set_sensor_state(SensorAction::AccelerometerEnable, 0));
        assert_eq!(log.lock().unwrap().periods, vec![16666]);
        assert!(sensors.mask().contains(SensorStateMask::ENABLED));
    }

    #[test]
    fn handle_is_acquired_lazily_once() {
        let (mut sensors, log) = pipeline();
        assert_eq!(log.lock().unwrap().acquired, 0);
        sensors.set_sensor_enabled(true, 100);
        sensors.set_sensor_enabled(true, 200);
        let log = log.lock().unwrap();
        assert_eq!(log.acquired, 1);
        assert_eq!(log.periods, vec![10_000, 5_000]);
    }

    #[test]
    fn disabling_twice_is_harmless() {
        let (mut sensors, log) = pipeline();
        sensors.set_sensor_enabled(false, 0);
        sensors.set_sensor_enabled(false, 0);
        assert_eq!(log.lock().unwrap().acquired, 0);
        assert_eq!(sensors.mask(), SensorStateMask::DISABLED);
        assert!(!sensors.should_drain());
    }

    #[test]
    fn flags_are_mutually_exclusive() {
        let (mut sensors, _log) = pipeline();
        sensors.set_sensor_enabled(true, 0);
        assert_eq!(sensors.mask(), SensorStateMask::ENABLED);
        sensors.set_sensor_enabled(false, 0);
        assert_eq!(sensors.mask(), SensorStateMask::DISABLED);
    }

    #[test]
    fn drain_keeps_last_sample() {
        let (mut sensors, log) = pipeline();
        sensors.set_sensor_enabled(true, 0);
        {
            let mut log = log.lock().unwrap();
            log.samples.push_back(SensorSample { x: 1.0, y: 2.0, z: 3.0 });
            log.samples.push_back(SensorSample { x: 4.0, y: 5.0, z: 6.0 });
        }
        assert_eq!(sensors.drain(), 2);
        assert_eq!(sensors.latest_sample(), SensorSample { x: 4.0, y: 5.0, z: 6.0 });
        assert_eq!(sensors.sensor_input(sensor_id::ACCELEROMETER_Y), 5.0);
        assert_eq!(sensors.sensor_input(42), 0.0);
    }

    #[test]
    fn stale_samples_are_discarded_without_updating() {
        let (mut sensors, log) = pipeline();
        sensors.set_sensor_enabled(true, 0);
        sensors.set_sensor_enabled(false, 0);
        log.lock().unwrap().samples.extend([
            SensorSample { x: 1.0, y: 2.0, z: 3.0 },
            SensorSample { x: 4.0, y: 5.0, z: 6.0 },
        ]);

        assert_eq!(sensors.drain(), 0);
        assert_eq!(sensors.discard_pending(), 2);
        assert_eq!(sensors.latest_sample(), SensorSample::default());
        assert!(log.lock().unwrap().samples.is_empty());
    }

    #[test]
    fn configured_default_rate_replaces_sixty_hz() {
        let log = Arc::new(Mutex::new(Log::default()));
        let mut sensors = SensorPipeline::new(Box::new(FakeProvider(log.clone())), 100);
        sensors.set_sensor_enabled(true, 0);
        assert_eq!(log.lock().unwrap().periods, vec![10_000]);

        let fallback = SensorPipeline::new(Box::new(NoSensors), 0);
        assert_eq!(fallback.period_us(0), 16666);
    }

    #[test]
    fn gyroscope_is_unsupported() {
        let (mut sensors, _log) = pipeline();
        assert!(!sensors.set_sensor_state(SensorAction::GyroscopeEnable, 0));
        assert_eq!(sensors.mask(), SensorStateMask::empty());
    }

    #[test]
    fn release_happens_once() {
        let (mut sensors, log) = pipeline();
        sensors.set_sensor_enabled(true, 0);
        sensors.release();
        sensors.release();
        drop(sensors);
        assert_eq!(log.lock().unwrap().released, 1);
    }

    #[test]
    fn missing_hardware_still_flags_enabled() {
        let mut sensors = SensorPipeline::new(Box::new(NoSensors), 0);
        assert!(sensors.set_sensor_state(SensorAction::AccelerometerEnable, 0));
        assert!(sensors.mask().contains(SensorStateMask::ENABLED));
        assert!(!sensors.should_drain());
        assert_eq!(sensors.drain(), 0);
    }
}
