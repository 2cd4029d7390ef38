//! Collapsing of split controllers
//!
//! Some hardware reports a single physical pad as two input devices. An alias
//! group names such hardware; the first device of the group to receive a port
//! becomes the primary, and every later member resolves to the primary's port.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::info;

/// Devices whose raw name contains any of `any_of` form one physical unit
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasGroup {
    pub any_of: Vec<String>,
}

impl AliasGroup {
    pub fn new(any_of: &[&str]) -> Self {
        Self {
            any_of: any_of.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn matches(&self, raw_name: &str) -> bool {
        self.any_of.iter().any(|p| raw_name.contains(p.as_str()))
    }
}

/// Alias groups plus the ids seen for each of them in this session
#[derive(Clone, Debug, Default)]
pub struct AliasPolicy {
    groups: Vec<AliasGroup>,
    primaries: HashMap<usize, i32>,
    aliases: HashMap<i32, i32>,
}

impl AliasPolicy {
    pub fn new(groups: Vec<AliasGroup>) -> Self {
        Self {
            groups,
            primaries: HashMap::new(),
            aliases: HashMap::new(),
        }
    }

    /// The id events from `raw_id` should be resolved under
    pub fn canonical_id(&self, raw_id: i32) -> i32 {
        self.aliases.get(&raw_id).copied().unwrap_or(raw_id)
    }

    /// Index of the first group matching a classified device name
    pub fn group_for(&self, raw_name: &str) -> Option<usize> {
        self.groups.iter().position(|g| g.matches(raw_name))
    }

    pub fn primary_of(&self, group: usize) -> Option<i32> {
        self.primaries.get(&group).copied()
    }

    pub fn set_primary(&mut self, group: usize, raw_id: i32) {
        info!("Raw device {} is the primary of alias group {}", raw_id, group);
        self.primaries.insert(group, raw_id);
    }

    pub fn add_alias(&mut self, secondary: i32, primary: i32) {
        info!("Raw device {} aliased onto raw device {}", secondary, primary);
        self.aliases.insert(secondary, primary);
    }
}

/// Groups known to split one pad into two devices
pub fn default_alias_groups() -> Vec<AliasGroup> {
    vec![AliasGroup::new(&["keypad-game-zeus", "keypad-zeus"])]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_ids_are_their_own_canonical_id() {
        let policy = AliasPolicy::new(default_alias_groups());
        assert_eq!(policy.canonical_id(12), 12);
    }

    #[test]
    fn secondary_resolves_to_primary() {
        let mut policy = AliasPolicy::new(default_alias_groups());
        let group = policy.group_for("keypad-game-zeus").unwrap();
        assert_eq!(policy.primary_of(group), None);

        policy.set_primary(group, 3);
        assert_eq!(policy.group_for("keypad-zeus"), Some(group));
        policy.add_alias(9, 3);
        assert_eq!(policy.canonical_id(9), 3);
        assert_eq!(policy.canonical_id(3), 3);
    }

    #[test]
    fn other_names_have_no_group() {
        let policy = AliasPolicy::new(default_alias_groups());
        assert_eq!(policy.group_for("Xbox Wireless Controller"), None);
    }
}
