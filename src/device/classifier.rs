//! Platform-facing collaborators of the port registry

use std::collections::HashMap;

use tracing::info;

use crate::event::SourceFlags;

/// Identity of a physical device as reported by the platform
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeviceProfile {
    pub name: String,
    pub vendor_id: u16,
    pub product_id: u16,
}

impl DeviceProfile {
    pub fn new(name: impl Into<String>, vendor_id: u16, product_id: u16) -> Self {
        Self {
            name: name.into(),
            vendor_id,
            product_id,
        }
    }
}

/// Resolves raw device ids into device profiles
pub trait DeviceClassifier: Send {
    /// Look up name and USB ids for a raw device id
    ///
    /// `None` aborts the hotplug for now; the next event from the same id
    /// will ask again.
    fn classify(&mut self, raw_id: i32, source: SourceFlags) -> Option<DeviceProfile>;

    /// Id of the active input method, when the platform has one
    fn current_input_method(&self) -> Option<String> {
        None
    }
}

/// Classifier backed by a fixed table, for embedding and tests
#[derive(Clone, Debug, Default)]
pub struct StaticClassifier {
    devices: HashMap<i32, DeviceProfile>,
    input_method: Option<String>,
}

impl StaticClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(mut self, raw_id: i32, profile: DeviceProfile) -> Self {
        self.devices.insert(raw_id, profile);
        self
    }

    pub fn with_input_method(mut self, ime: impl Into<String>) -> Self {
        self.input_method = Some(ime.into());
        self
    }
}

impl DeviceClassifier for StaticClassifier {
    fn classify(&mut self, raw_id: i32, _source: SourceFlags) -> Option<DeviceProfile> {
        self.devices.get(&raw_id).cloned()
    }

    fn current_input_method(&self) -> Option<String> {
        self.input_method.clone()
    }
}

/// Receives the "autoconfigure this joypad" notification after a hotplug
pub trait JoypadAutoconfig: Send {
    fn autoconfigure_joypad(
        &mut self,
        port: usize,
        name: &str,
        vendor_id: u16,
        product_id: u16,
        driver: &str,
    );
}

/// Autoconfig sink that only logs the request
#[derive(Clone, Copy, Debug, Default)]
pub struct LogAutoconfig;

impl JoypadAutoconfig for LogAutoconfig {
    fn autoconfigure_joypad(
        &mut self,
        port: usize,
        name: &str,
        vendor_id: u16,
        product_id: u16,
        driver: &str,
    ) {
        info!(
            "Autoconfigure port {} with '{}' ({:04x}:{:04x}) via {}",
            port, name, vendor_id, product_id, driver
        );
    }
}
