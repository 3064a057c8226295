//! Document model: the closed set of node types emitted to the
//! programming software.
//!
//! Every node serializes with an internal `"$type"` tag and PascalCase
//! field names. Nodes reference each other only through [`Guid`]s;
//! [`Document::audit`] collects definitions and references so callers can
//! check that the tree is closed and free of duplicates.

mod hierarchy;
mod keypad;
mod load;
mod module;
mod scene;

use std::collections::{HashMap, HashSet};

use serde::Serialize;

pub use hierarchy::{AreaNode, BoardNode, RoomNode};
pub use keypad::{KEYPAD_DRIVER, KEYPAD_PROFILE, KeypadNode, RockerButtonNode, StyleProperties};
pub use load::{
    DIMMER_PROFILE, HVAC_CONTROL_MODEL, HVAC_PROFILE, HvacNode, LightNode, LoadOutput,
    ON_OFF_PROFILE, SHADE_PROFILE, ShadeNode,
};
pub use module::{ModuleNode, ModuleNodeKind, SlotNode, Unit, UnitComposer};
pub use scene::{
    ACTION_CIRCUIT, ACTION_GROUP, ActionNode, CustomActionValue, CustomActionValues, SceneNode,
};

use crate::catalog::SlotKind;
use crate::id::Guid;

/// Version of the document layout written by this crate.
pub const SCHEMA_VERSION: u32 = 1;

/// Root of the compiled document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "$type", rename = "Project", rename_all = "PascalCase")]
pub struct Document {
    pub areas: Vec<AreaNode>,
    pub scenes: Vec<SceneNode>,
    pub scripts: Vec<Script>,
    pub variables: Vec<Variable>,
    pub special_actions: Vec<SpecialAction>,
    pub saved_profiles: Option<Vec<Guid>>,
    pub saved_control_models: Option<Vec<Guid>>,
    pub client_info: ClientInfoNode,
    pub name: String,
    pub path: Option<String>,
    pub guid: Guid,
    pub created: String,
    pub last_modified: String,
    pub last_upload: Option<String>,
    pub last_time_saved: String,
    pub programmer_info: ProgrammerInfoNode,
    pub cloud_config: CloudConfigNode,
    pub project_schema_version: u32,
    pub software_version: String,
    #[serde(rename = "SelectedTimeZoneID")]
    pub selected_time_zone_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub notes: Option<String>,
    #[serde(rename = "RoehnAppExport")]
    pub app_export: bool,
}

/// Scripts are never generated; the collection is kept for the layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Script {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "$type", rename = "ClientInfo", rename_all = "PascalCase")]
pub struct ClientInfoNode {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "$type", rename = "ProgrammerInfo", rename_all = "PascalCase")]
pub struct ProgrammerInfoNode {
    pub name: String,
    pub email: String,
    pub guid: Guid,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "$type", rename = "CloudConfig", rename_all = "PascalCase")]
pub struct CloudConfigNode {
    pub cloud_homesystems_id: u32,
    pub cloud_serial_number: u32,
    pub remote_acess: bool,
    pub cloud_configuration: Option<String>,
    pub cloud_local_name: Option<String>,
    pub cloud_password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "$type", rename = "Variable", rename_all = "PascalCase")]
pub struct Variable {
    pub name: String,
    pub description: String,
    pub guid: Guid,
    pub configurable: bool,
    pub memorizable: bool,
    pub is_startup: bool,
    pub allows_modify: bool,
    pub variable_type: u8,
    pub numeric_sub_type: u8,
    pub initial_value: i64,
    pub id: u32,
}

impl Variable {
    /// The built-in variable raised once after boot.
    #[must_use]
    pub fn startup(guid: Guid) -> Self {
        Self {
            name: "Startup".to_string(),
            description: "This variable indicates that the system has just been booted."
                .to_string(),
            guid,
            configurable: false,
            memorizable: false,
            is_startup: true,
            allows_modify: false,
            variable_type: 0,
            numeric_sub_type: 0,
            initial_value: 0,
            id: 1,
        }
    }
}

/// Built-in action available at project, area and room level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialActionKind {
    AllHvac,
    AllLights,
    AllShades,
    Off,
    Volume,
}

impl SpecialActionKind {
    /// Default set, in document order.
    pub const DEFAULTS: [Self; 5] = [
        Self::AllHvac,
        Self::AllLights,
        Self::AllShades,
        Self::Off,
        Self::Volume,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::AllHvac => "All HVAC",
            Self::AllLights => "All Lights",
            Self::AllShades => "All Shades",
            Self::Off => "OFF",
            Self::Volume => "Volume",
        }
    }

    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::Volume => 1,
            Self::AllLights => 2,
            Self::AllShades => 3,
            Self::AllHvac => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "$type", rename = "SpecialAction", rename_all = "PascalCase")]
pub struct SpecialAction {
    pub name: String,
    pub guid: Guid,
    #[serde(rename = "Type")]
    pub kind: u8,
}

impl SpecialAction {
    #[must_use]
    pub fn new(kind: SpecialActionKind, guid: Guid) -> Self {
        Self {
            name: kind.label().to_string(),
            guid,
            kind: kind.code(),
        }
    }
}

/// Node GUIDs defined and referenced across a document.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GuidAudit {
    pub definitions: Vec<Guid>,
    pub references: Vec<Guid>,
}

impl GuidAudit {
    fn define(&mut self, guid: Guid) {
        self.definitions.push(guid);
    }

    fn reference(&mut self, guid: Guid) {
        if !guid.is_zero() {
            self.references.push(guid);
        }
    }

    /// GUIDs defined by more than one node.
    #[must_use]
    pub fn duplicates(&self) -> Vec<Guid> {
        let mut seen = HashSet::new();
        let mut out: Vec<Guid> = self
            .definitions
            .iter()
            .copied()
            .filter(|g| !seen.insert(*g))
            .collect();
        out.sort();
        out.dedup();
        out
    }

    /// References without a matching definition.
    #[must_use]
    pub fn dangling(&self) -> Vec<Guid> {
        let defined: HashSet<Guid> = self.definitions.iter().copied().collect();
        let mut out: Vec<Guid> = self
            .references
            .iter()
            .copied()
            .filter(|g| !defined.contains(g))
            .collect();
        out.sort();
        out.dedup();
        out
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.duplicates().is_empty() && self.dangling().is_empty()
    }
}

impl Document {
    /// Walk the tree and collect every node GUID definition and every
    /// GUID reference (slot entries, registries, button and action targets,
    /// override keys).
    #[must_use]
    pub fn audit(&self) -> GuidAudit {
        let mut audit = GuidAudit::default();
        audit.define(self.guid);
        self.variables.iter().for_each(|v| audit.define(v.guid));
        self.special_actions.iter().for_each(|s| audit.define(s.guid));
        self.scenes.iter().for_each(|s| audit_scene(&mut audit, s));

        for area in &self.areas {
            audit.define(area.guid);
            area.special_actions.iter().for_each(|s| audit.define(s.guid));
            area.scenes.iter().for_each(|s| audit_scene(&mut audit, s));
            for room in &area.rooms {
                audit.define(room.guid);
                room.special_actions.iter().for_each(|s| audit.define(s.guid));
                room.load_outputs.iter().for_each(|l| audit.define(l.guid()));
                room.scenes.iter().for_each(|s| audit_scene(&mut audit, s));
                for keypad in &room.user_interfaces {
                    audit.define(keypad.guid);
                    for button in &keypad.list_keypad_buttons {
                        audit.define(button.guid);
                        audit.reference(button.target_object_guid);
                    }
                }
                for board in &room.boards {
                    audit.define(board.guid);
                    for module in &board.modules {
                        audit.define(module.guid);
                        for slot in &module.slots {
                            slot.sub_items.iter().for_each(|g| audit.reference(*g));
                        }
                    }
                }
            }
        }
        audit
    }

    pub fn rooms(&self) -> impl Iterator<Item = &RoomNode> {
        self.areas.iter().flat_map(|a| a.rooms.iter())
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleNode> {
        self.rooms()
            .flat_map(|r| r.boards.iter())
            .flat_map(|b| b.modules.iter())
    }

    /// Subscriber registry of every controller, keyed by controller GUID.
    ///
    /// The trailing [`Guid::ZERO`] terminator is not part of the registry.
    #[must_use]
    pub fn registries(&self) -> HashMap<Guid, Vec<Guid>> {
        self.modules()
            .filter_map(|m| {
                let slot = m.slot(SlotKind::Acnet.name())?;
                let entries = slot.occupied().map(|(_, g)| g).collect();
                Some((m.guid, entries))
            })
            .collect()
    }

    /// Every unit id used anywhere in the document.
    #[must_use]
    pub fn unit_ids(&self) -> Vec<u32> {
        let mut ids = Vec::new();
        for room in self.rooms() {
            ids.extend(room.load_outputs.iter().flat_map(LoadOutput::units).map(|u| u.id));
            ids.extend(room.scenes.iter().map(|s| s.unit.id));
            for keypad in &room.user_interfaces {
                ids.extend(keypad.composers().map(|c| c.unit.id));
            }
            for board in &room.boards {
                ids.extend(board.modules.iter().flat_map(ModuleNode::units).map(|u| u.id));
            }
        }
        ids
    }
}

fn audit_scene(audit: &mut GuidAudit, scene: &SceneNode) {
    audit.define(scene.guid);
    for action in &scene.actions {
        audit.reference(action.target_guid);
        if let Some(values) = &action.custom_action_values_serialized {
            values.targets().for_each(|g| audit.reference(g));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_report_dangling_reference() {
        let mut audit = GuidAudit::default();
        audit.define(Guid::from_u128(1));
        audit.reference(Guid::from_u128(1));
        audit.reference(Guid::from_u128(2));
        audit.reference(Guid::ZERO);
        assert_eq!(audit.dangling(), vec![Guid::from_u128(2)]);
        assert!(!audit.is_closed());
    }

    #[test]
    fn should_report_duplicate_definition() {
        let mut audit = GuidAudit::default();
        audit.define(Guid::from_u128(1));
        audit.define(Guid::from_u128(1));
        assert_eq!(audit.duplicates(), vec![Guid::from_u128(1)]);
    }

    #[test]
    fn should_serialize_special_action_with_type_code() {
        let action = SpecialAction::new(SpecialActionKind::AllLights, Guid::from_u128(3));
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["$type"], "SpecialAction");
        assert_eq!(json["Name"], "All Lights");
        assert_eq!(json["Type"], 2);
    }

    #[test]
    fn should_serialize_startup_variable() {
        let json = serde_json::to_value(Variable::startup(Guid::from_u128(4))).unwrap();
        assert_eq!(json["$type"], "Variable");
        assert_eq!(json["IsStartup"], true);
        assert_eq!(json["Id"], 1);
    }
}
