//! Device name normalization
//!
//! Raw device names are matched against an ordered table of substring rules.
//! The first matching rule decides the display name used for autoconfiguration
//! and may pin the device to a fixed port.

use serde::{Deserialize, Serialize};

use crate::event::SourceFlags;

/// Placeholder replaced by the 1-based player number
pub const PLAYER_PLACEHOLDER: &str = "{player}";

/// One row of the profile table
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRule {
    /// Matches when the raw name contains any of these
    pub any_of: Vec<String>,
    /// ...and every one of these
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<String>,
    /// Display name; `None` keeps the raw name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Highest port that gets a display name; later ports get none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_port: Option<usize>,
    /// Port the device is pinned to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_override: Option<usize>,
}

impl ProfileRule {
    pub fn new(any_of: &[&str], name: &str) -> Self {
        Self {
            any_of: any_of.iter().map(|s| s.to_string()).collect(),
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn requiring(mut self, all_of: &[&str]) -> Self {
        self.all_of = all_of.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn up_to_port(mut self, max_port: usize) -> Self {
        self.max_port = Some(max_port);
        self
    }

    pub fn pinned_to(mut self, port: usize) -> Self {
        self.port_override = Some(port);
        self
    }

    pub fn matches(&self, raw_name: &str) -> bool {
        self.any_of.iter().any(|p| raw_name.contains(p.as_str()))
            && self.all_of.iter().all(|p| raw_name.contains(p.as_str()))
    }
}

/// Outcome of normalizing one device name
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedProfile {
    /// Empty when nothing should be published for the port
    pub name: String,
    pub port_override: Option<usize>,
}

/// Ordered profile rules plus the fallbacks applied after them
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfileTable {
    rules: Vec<ProfileRule>,
    ime_overrides: Vec<String>,
    keyboard_name: String,
}

impl ProfileTable {
    pub fn new(rules: Vec<ProfileRule>, ime_overrides: Vec<String>, keyboard_name: String) -> Self {
        Self {
            rules,
            ime_overrides,
            keyboard_name,
        }
    }

    /// Derive the display name for a device about to be assigned `port`
    pub fn normalize(
        &self,
        raw_name: &str,
        port: usize,
        source: SourceFlags,
        input_method: Option<&str>,
    ) -> ResolvedProfile {
        let mut resolved = match self.rules.iter().find(|rule| rule.matches(raw_name)) {
            Some(rule) => {
                let within_range = rule.max_port.map_or(true, |max| port <= max);
                let name = match (&rule.name, within_range) {
                    (_, false) => String::new(),
                    (Some(name), true) => name.replace(PLAYER_PLACEHOLDER, &(port + 1).to_string()),
                    (None, true) => raw_name.to_string(),
                };
                Some(ResolvedProfile {
                    name,
                    port_override: rule.port_override,
                })
            }
            None => None,
        };

        if let Some(ime) = input_method {
            if self.ime_overrides.iter().any(|o| ime.contains(o.as_str())) {
                let port_override = resolved.as_ref().and_then(|r| r.port_override);
                resolved = Some(ResolvedProfile {
                    name: ime.to_string(),
                    port_override,
                });
            }
        }

        resolved.unwrap_or_else(|| ResolvedProfile {
            name: if source.is_keyboard_only() {
                self.keyboard_name.clone()
            } else {
                raw_name.to_string()
            },
            port_override: None,
        })
    }
}

/// Display name given to plain keyboards
pub const KEYBOARD_FALLBACK_NAME: &str = "RetroKeyboard";

/// Input methods that act as joypad drivers themselves
pub fn default_ime_overrides() -> Vec<String> {
    [
        "net.obsidianx.android.mogaime",
        "com.ccpcreations.android.WiiUseAndroid",
        "com.hexad.bluezime",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Built-in table of known pads, most specific names first
pub fn default_profile_rules() -> Vec<ProfileRule> {
    vec![
        ProfileRule::new(&["keypad-game-zeus", "keypad-zeus"], "Xperia Play"),
        ProfileRule::new(&["iControlPad-"], "iControlPad HID Joystick profile"),
        ProfileRule::new(&["TTT THT Arcade console 2P USB Play"], "TTT THT Arcade (Player {player})")
            .up_to_port(1),
        ProfileRule::new(&["Sun4i-keypad"], "iDroid x360"),
        ProfileRule::new(&["mtk-kpd"], "MUCH iReadyGo i5"),
        ProfileRule::new(&["360 Wireless"], "XBox 360 Wireless"),
        ProfileRule::new(&["Microsoft"], "SideWinder Dual Strike").requiring(&["Dual Strike"]),
        ProfileRule::new(&["Microsoft"], "SideWinder Classic").requiring(&["SideWinder"]),
        ProfileRule::new(&["X-Box"], "XBox 360").requiring(&["Microsoft"]),
        ProfileRule::new(
            &["TigerGame", "Game Controller Adapter", "Dual USB Joypad"],
            "PlayStation2 WiseGroup",
        )
        .requiring(&["WiseGroup"]),
        ProfileRule::new(&["JC-PS102U"], "PlayStation2 JCPS102").requiring(&["WiseGroup"]),
        ProfileRule::new(
            &[
                "PLAYSTATION(R)3",
                "Dualshock3",
                "Sixaxis",
                "Gasia,Co",
                "Gamepad 0",
                "Gamepad 1",
                "Gamepad 2",
                "Gamepad 3",
            ],
            "PlayStation3",
        ),
        ProfileRule::new(&["MOGA"], "Moga IME"),
        ProfileRule::new(&["tincore_adc_joystick"], "JXD S5110B (Skelrom)"),
        ProfileRule::new(&["adc joystick"], "JXD S7300B"),
        ProfileRule::new(&["2-Axis, 8-Button"], "Genius Maxfire G08XU"),
        ProfileRule::new(&["USB,2-axis 8-button gamepad"], "USB 2 Axis 8 button"),
        ProfileRule::new(&["joy_key"], "Archos Gamepad"),
        ProfileRule::new(&["matrix_keyboard"], "JXD S5110B"),
        ProfileRule::new(&["USB Gamepad"], "Thrust Predator"),
        ProfileRule::new(&["ADC joystick"], "JXD S7800B"),
        ProfileRule::new(&["2Axes 11Keys Game  Pad"], "Tomee NES USB"),
        ProfileRule::new(&["rk29-keypad", "GAMEMID"], "GameMID"),
        ProfileRule::new(&["NVIDIA Controller"], "NVIDIA Shield").pinned_to(0),
    ]
}

impl Default for ProfileTable {
    fn default() -> Self {
        Self::new(
            default_profile_rules(),
            default_ime_overrides(),
            KEYBOARD_FALLBACK_NAME.to_string(),
        )
    }
}
