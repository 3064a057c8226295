//! Scene nodes.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::module::Unit;
use crate::id::Guid;

/// Action on a single load output.
pub const ACTION_CIRCUIT: u8 = 0;
/// Action on every member of a room.
pub const ACTION_GROUP: u8 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "$type", rename = "Scene", rename_all = "PascalCase")]
pub struct SceneNode {
    pub guid: Guid,
    pub operator: u8,
    pub parent_slot: Option<Guid>,
    pub unit: Unit,
    pub name: String,
    pub delay: u32,
    pub actions: Vec<ActionNode>,
    pub scene_movers: bool,
    #[serde(rename = "AutoProgrammedID")]
    pub auto_programmed_id: u32,
    pub auto_programmed_scene: bool,
    pub only_shades: u8,
}

impl SceneNode {
    #[must_use]
    pub fn new(guid: Guid, name: String, unit: Unit, movers: bool) -> Self {
        Self {
            guid,
            operator: if movers { 6 } else { 1 },
            parent_slot: None,
            unit,
            name,
            delay: 0,
            actions: Vec::new(),
            scene_movers: movers,
            auto_programmed_id: 0,
            auto_programmed_scene: false,
            only_shades: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "$type", rename = "Action", rename_all = "PascalCase")]
pub struct ActionNode {
    pub level: u8,
    pub action_type: u8,
    pub custom_action_values_serialized: Option<CustomActionValues>,
    pub target_guid: Guid,
}

/// Per-member overrides of a group action, keyed by load GUID.
///
/// Serialized as a `$type`-tagged dictionary, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomActionValues(Vec<(Guid, CustomActionValue)>);

impl CustomActionValues {
    /// Insert or replace the override of `target`.
    pub fn insert(&mut self, target: Guid, value: CustomActionValue) {
        if let Some(entry) = self.0.iter_mut().find(|(guid, _)| *guid == target) {
            entry.1 = value;
        } else {
            self.0.push((target, value));
        }
    }

    #[must_use]
    pub fn get(&self, target: Guid) -> Option<&CustomActionValue> {
        self.0.iter().find(|(guid, _)| *guid == target).map(|(_, v)| v)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn targets(&self) -> impl Iterator<Item = Guid> + '_ {
        self.0.iter().map(|(guid, _)| *guid)
    }
}

impl Serialize for CustomActionValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len() + 1))?;
        map.serialize_entry("$type", "CustomActionValueDictionary")?;
        for (guid, value) in &self.0 {
            map.serialize_entry(&guid.to_string(), value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "$type", rename = "CustomActionValue", rename_all = "PascalCase")]
pub struct CustomActionValue {
    pub enable: bool,
    pub level: u8,
}

impl CustomActionValue {
    /// Explicitly excluded member.
    pub const DISABLED: Self = Self {
        enable: false,
        level: 0,
    };
}
