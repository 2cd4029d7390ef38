//! Device identity and port assignment
//!
//! - [`classifier`] - platform lookups for device names and ids
//! - [`profile`] - display name normalization table
//! - [`alias`] - split-controller collapsing
//! - [`registry`] - raw id to logical port mapping

pub mod alias;
pub mod classifier;
pub mod profile;
pub mod registry;

pub use alias::{AliasGroup, AliasPolicy};
pub use classifier::{DeviceClassifier, DeviceProfile, JoypadAutoconfig, LogAutoconfig, StaticClassifier};
pub use profile::{ProfileRule, ProfileTable, ResolvedProfile};
pub use registry::{DeviceRecord, PortRegistry, RegistrySettings};
