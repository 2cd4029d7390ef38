//! Raw device id to logical port assignment
//!
//! Ports are handed out in order of first appearance and never reclaimed
//! during a session: a pad that disconnects and reconnects under the same raw
//! id keeps its port.

use chrono::{DateTime, Local};
use tracing::{debug, error, info, warn};

use super::alias::AliasPolicy;
use super::classifier::{DeviceClassifier, DeviceProfile, JoypadAutoconfig};
use super::profile::ProfileTable;
use crate::error::InputError;
use crate::event::SourceFlags;

/// Port every touch overlay source resolves to
pub const TOUCH_PORT: usize = 0;

/// A device that has been assigned a port
#[derive(Clone, Debug, PartialEq)]
pub struct DeviceRecord {
    pub raw_id: i32,
    pub port: usize,
    pub name: String,
    pub vendor_id: u16,
    pub product_id: u16,
    pub connected_at: DateTime<Local>,
}

/// Registry settings taken from the input configuration
#[derive(Clone, Debug)]
pub struct RegistrySettings {
    pub max_pads: usize,
    pub autodetect_enable: bool,
    /// Identifier passed along with autoconfigure requests
    pub driver_ident: String,
}

pub struct PortRegistry {
    settings: RegistrySettings,
    records: Vec<DeviceRecord>,
    pads_connected: usize,
    device_names: Vec<String>,
    profiles: ProfileTable,
    aliases: AliasPolicy,
    classifier: Box<dyn DeviceClassifier>,
    autoconfig: Box<dyn JoypadAutoconfig>,
}

impl PortRegistry {
    pub fn new(
        settings: RegistrySettings,
        profiles: ProfileTable,
        aliases: AliasPolicy,
        classifier: Box<dyn DeviceClassifier>,
        autoconfig: Box<dyn JoypadAutoconfig>,
    ) -> Self {
        debug!("Creating port registry with settings: {:?}", settings);
        let device_names = vec![String::new(); settings.max_pads];
        Self {
            settings,
            records: Vec::new(),
            pads_connected: 0,
            device_names,
            profiles,
            aliases,
            classifier,
            autoconfig,
        }
    }

    /// Resolve the logical port for an event's device
    ///
    /// Unknown devices go through hotplug. Errors mean the event should be
    /// dropped; nothing has been recorded for the device.
    pub fn resolve_port(&mut self, raw_id: i32, source: SourceFlags) -> Result<usize, InputError> {
        if source.is_touch_overlay() {
            return Ok(TOUCH_PORT);
        }

        let id = self.aliases.canonical_id(raw_id);
        if let Some(port) = self.lookup_port(id) {
            return Ok(port);
        }

        self.handle_hotplug(id, source)
    }

    /// Port of an already registered raw id, without hotplug
    pub fn lookup_port(&self, raw_id: i32) -> Option<usize> {
        let id = self.aliases.canonical_id(raw_id);
        self.records.iter().find(|r| r.raw_id == id).map(|r| r.port)
    }

    fn handle_hotplug(&mut self, raw_id: i32, source: SourceFlags) -> Result<usize, InputError> {
        info!("Hotplug: new raw device {} (source {:?})", raw_id, source);

        if !self.settings.autodetect_enable {
            self.ensure_capacity(raw_id)?;
            let port = self.pads_connected;
            return Ok(self.register(raw_id, port, String::new(), &DeviceProfile::default()));
        }

        let profile = match self.classifier.classify(raw_id, source) {
            Some(profile) => profile,
            None => {
                error!("Could not look up device name or ids for raw device {}", raw_id);
                return Err(InputError::ClassificationFailed { raw_id });
            }
        };
        debug!(
            "Raw device {} classified as '{}' ({:04x}:{:04x})",
            raw_id, profile.name, profile.vendor_id, profile.product_id
        );

        let group = self.aliases.group_for(&profile.name);
        if let Some(group) = group {
            if let Some(primary) = self.aliases.primary_of(group) {
                if let Some(port) = self.lookup_port(primary) {
                    self.aliases.add_alias(raw_id, primary);
                    return Ok(port);
                }
            }
        }

        self.ensure_capacity(raw_id)?;

        let next_port = self.pads_connected;
        let input_method = self.classifier.current_input_method();
        let resolved = self
            .profiles
            .normalize(&profile.name, next_port, source, input_method.as_deref());

        let port = match resolved.port_override {
            Some(pinned) if pinned < self.settings.max_pads => {
                debug!("Profile pins '{}' to port {}", resolved.name, pinned);
                pinned
            }
            Some(pinned) => {
                warn!("Ignoring port override {} beyond the pad limit", pinned);
                next_port
            }
            None => next_port,
        };

        if !resolved.name.is_empty() {
            self.device_names[port] = resolved.name.clone();
            self.autoconfig.autoconfigure_joypad(
                port,
                &resolved.name,
                profile.vendor_id,
                profile.product_id,
                &self.settings.driver_ident,
            );
            info!("Port {}: {}", port, resolved.name);
        }

        let port = self.register(raw_id, port, resolved.name, &profile);
        if let Some(group) = group {
            self.aliases.set_primary(group, raw_id);
        }
        Ok(port)
    }

    fn ensure_capacity(&self, raw_id: i32) -> Result<(), InputError> {
        if self.pads_connected >= self.settings.max_pads {
            warn!(
                "Max number of pads reached ({}), ignoring raw device {}",
                self.settings.max_pads, raw_id
            );
            return Err(InputError::ResourceExhausted {
                raw_id,
                max_pads: self.settings.max_pads,
            });
        }
        Ok(())
    }

    fn register(&mut self, raw_id: i32, port: usize, name: String, profile: &DeviceProfile) -> usize {
        self.records.push(DeviceRecord {
            raw_id,
            port,
            name,
            vendor_id: profile.vendor_id,
            product_id: profile.product_id,
            connected_at: Local::now(),
        });
        self.pads_connected += 1;
        debug!(
            "Raw device {} registered on port {} ({} pads connected)",
            raw_id, port, self.pads_connected
        );
        port
    }

    pub fn pads_connected(&self) -> usize {
        self.pads_connected
    }

    pub fn max_pads(&self) -> usize {
        self.settings.max_pads
    }

    pub fn records(&self) -> &[DeviceRecord] {
        &self.records
    }

    /// Display name published for a port, empty when none
    pub fn device_name(&self, port: usize) -> Option<&str> {
        self.device_names.get(port).map(String::as_str)
    }
}
