//! # Input Configuration
//!
//! ## Layout
//! One TOML file, `<config dir>/portpad/input.toml`, deserialized into
//! [`InputConfig`]. Every field has a default, so a partial file only overrides
//! what it names and a missing file is replaced by the defaults on first start.
//!
//! ## Error Handling
//! File I/O and parsing return `color_eyre` reports with context. Value checks
//! go through [`InputConfig::validate`], which reports
//! [`InputError::ConfigError`] so the driver can refuse to start.

use std::path::{Path, PathBuf};

use color_eyre::eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::device::alias::{default_alias_groups, AliasGroup, AliasPolicy};
use crate::device::profile::{default_ime_overrides, default_profile_rules, KEYBOARD_FALLBACK_NAME};
use crate::device::{ProfileRule, ProfileTable, RegistrySettings};
use crate::error::InputError;
use crate::joypad::JoypadBinds;
use crate::state::pointer::MAX_TOUCH;
use crate::state::sensor::DEFAULT_SENSOR_RATE_HZ;
use crate::state::AxisStrategy;

pub const CONFIG_DIR: &str = "portpad";
pub const CONFIG_FILE: &str = "input.toml";

/// Default number of logical ports
pub const DEFAULT_MAX_PADS: usize = 8;

/// Upper bound for `max_pads`
pub const MAX_PADS_LIMIT: usize = MAX_TOUCH;

/// Which capability set the driver advertises
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Touch device: joypad, pointer and analog
    #[default]
    Touch,
    /// Desktop browser style: joypad, analog, keyboard and mouse
    Desktop,
}

/// Axis strategy as written in the config file
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AxisStrategySetting {
    Basic,
    Extended,
    /// Extended when the platform reports per-axis values, Basic otherwise
    #[default]
    Auto,
}

impl AxisStrategySetting {
    pub fn resolve(self, extended_available: bool) -> AxisStrategy {
        match self {
            Self::Basic => AxisStrategy::Basic,
            Self::Extended => AxisStrategy::Extended,
            Self::Auto if extended_available => AxisStrategy::Extended,
            Self::Auto => AxisStrategy::Basic,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    pub max_pads: usize,
    /// Classify and autoconfigure new devices
    pub autodetect_enable: bool,
    pub axis_strategy: AxisStrategySetting,
    pub backend: Backend,
    /// Frame interval of the binary's poll loop
    pub poll_interval_ms: u64,
    pub default_sensor_rate_hz: u32,
    pub keyboard_fallback_name: String,
    pub ime_overrides: Vec<String>,
    pub joypad_binds: JoypadBinds,
    /// Ordered device name rules, first match wins
    pub profiles: Vec<ProfileRule>,
    pub aliases: Vec<AliasGroup>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            max_pads: DEFAULT_MAX_PADS,
            autodetect_enable: true,
            axis_strategy: AxisStrategySetting::default(),
            backend: Backend::default(),
            poll_interval_ms: 16,
            default_sensor_rate_hz: DEFAULT_SENSOR_RATE_HZ,
            keyboard_fallback_name: KEYBOARD_FALLBACK_NAME.to_string(),
            ime_overrides: default_ime_overrides(),
            joypad_binds: JoypadBinds::default(),
            profiles: default_profile_rules(),
            aliases: default_alias_groups(),
        }
    }
}

impl InputConfig {
    pub fn validate(&self) -> Result<(), InputError> {
        if self.max_pads == 0 || self.max_pads > MAX_PADS_LIMIT {
            return Err(InputError::ConfigError(format!(
                "max_pads must be between 1 and {}, got {}",
                MAX_PADS_LIMIT, self.max_pads
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(InputError::ConfigError(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if let Some(rule) = self.profiles.iter().find(|r| r.any_of.is_empty()) {
            return Err(InputError::ConfigError(format!(
                "profile rule {:?} has no patterns",
                rule.name
            )));
        }
        Ok(())
    }

    pub fn registry_settings(&self, driver_ident: &str) -> RegistrySettings {
        RegistrySettings {
            max_pads: self.max_pads,
            autodetect_enable: self.autodetect_enable,
            driver_ident: driver_ident.to_string(),
        }
    }

    pub fn profile_table(&self) -> ProfileTable {
        ProfileTable::new(
            self.profiles.clone(),
            self.ime_overrides.clone(),
            self.keyboard_fallback_name.clone(),
        )
    }

    pub fn alias_policy(&self) -> AliasPolicy {
        AliasPolicy::new(self.aliases.clone())
    }

    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| {
            warn!("Could not determine config directory, using current directory");
            PathBuf::from(".")
        });
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        path
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| eyre!("Failed to read input config {}: {}", path.display(), e))?;
        let config: Self =
            toml::from_str(&content).map_err(|e| eyre!("Failed to parse input config: {}", e))?;
        debug!("Loaded input config from {}", path.display());
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| eyre!("Failed to create config directory: {}", e))?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| eyre!("Failed to serialize input config: {}", e))?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| eyre!("Failed to write input config: {}", e))?;
        Ok(())
    }

    /// Load the config at `path`, writing the defaults there first if missing
    pub async fn load_or_create(path: &Path) -> Result<Self> {
        let exists = tokio::fs::try_exists(path)
            .await
            .map_err(|e| eyre!("Failed to check if input config exists: {}", e))?;

        let config = if exists {
            Self::load(path).await?
        } else {
            info!("Creating default input config at {}", path.display());
            let config = Self::default();
            config.save(path).await?;
            config
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("portpad-test-{}-{}", std::process::id(), name));
        path.push(CONFIG_FILE);
        path
    }

    #[test]
    fn defaults_are_valid() {
        let config = InputConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_pads, 8);
        assert_eq!(config.profile_table(), ProfileTable::default());
    }

    #[test]
    fn pad_limit_is_checked() {
        let mut config = InputConfig::default();
        config.max_pads = 0;
        assert!(matches!(config.validate(), Err(InputError::ConfigError(_))));
        config.max_pads = 17;
        assert!(config.validate().is_err());
        config.max_pads = 16;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let config = InputConfig {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config: InputConfig = toml::from_str(
            r#"
            max_pads = 4
            axis_strategy = "basic"
            backend = "desktop"
            "#,
        )
        .unwrap();
        assert_eq!(config.max_pads, 4);
        assert_eq!(config.axis_strategy, AxisStrategySetting::Basic);
        assert_eq!(config.backend, Backend::Desktop);
        assert_eq!(config.profiles, default_profile_rules());
        assert!(config.autodetect_enable);
    }

    #[test]
    fn auto_strategy_follows_platform() {
        assert_eq!(AxisStrategySetting::Auto.resolve(true), AxisStrategy::Extended);
        assert_eq!(AxisStrategySetting::Auto.resolve(false), AxisStrategy::Basic);
        assert_eq!(AxisStrategySetting::Basic.resolve(true), AxisStrategy::Basic);
    }

    #[tokio::test]
    async fn missing_file_is_created_with_defaults() {
        let path = scratch_path("create");
        let _ = tokio::fs::remove_file(&path).await;

        let created = InputConfig::load_or_create(&path).await.unwrap();
        assert_eq!(created, InputConfig::default());

        let reloaded = InputConfig::load(&path).await.unwrap();
        assert_eq!(reloaded, created);

        if let Some(dir) = path.parent() {
            let _ = tokio::fs::remove_dir_all(dir).await;
        }
    }
}
