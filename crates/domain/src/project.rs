//! Project snapshot: the read-only source model handed to the engine.
//!
//! The persistence collaborator exports one project's full entity graph as a
//! [`ProjectSnapshot`]: areas own rooms, rooms own boards, circuits, keypads
//! and scenes, boards own modules. Cross-references (links, button targets,
//! scene actions, parent controllers) are source ids.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::catalog::{ElectricalSpec, ModuleCatalog, ModuleType};
use crate::circuit::{Circuit, Link};
use crate::error::{PanelError, PreconditionError, UnresolvedReference};
use crate::id::{AreaId, BoardId, CircuitId, Guid, ModuleId, RoomId, SceneId};
use crate::keypad::Keypad;
use crate::module::Module;
use crate::scene::Scene;
use crate::time::Timestamp;

/// Root namespace from which project namespaces are derived when a
/// snapshot carries no GUID of its own.
const ROOT_NAMESPACE: Guid = Guid::from_uuid(uuid::Uuid::NAMESPACE_OID);

/// One project's full entity graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub name: String,
    /// Namespace for every GUID minted by a compile of this project.
    #[serde(default)]
    pub guid: Option<Guid>,
    #[serde(default)]
    pub metadata: ProjectMetadata,
    /// Per-type overrides of the built-in electrical ratings.
    #[serde(default)]
    pub catalog: BTreeMap<ModuleType, ElectricalSpec>,
    #[serde(default)]
    pub areas: Vec<Area>,
}

/// Descriptive project data copied into the document header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectMetadata {
    pub client: ClientInfo,
    pub programmer: ProgrammerInfo,
    pub software_version: Option<String>,
    pub timezone_id: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub created: Option<Timestamp>,
    pub modified: Option<Timestamp>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgrammerInfo {
    pub name: String,
    pub email: String,
    pub guid: Option<Guid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: AreaId,
    pub name: String,
    #[serde(default)]
    pub rooms: Vec<Room>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    #[serde(default)]
    pub boards: Vec<Board>,
    #[serde(default)]
    pub circuits: Vec<Circuit>,
    #[serde(default)]
    pub keypads: Vec<Keypad>,
    #[serde(default)]
    pub scenes: Vec<Scene>,
}

/// An electrical panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub modules: Vec<Module>,
}

impl ProjectSnapshot {
    /// An empty project.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            guid: None,
            metadata: ProjectMetadata::default(),
            catalog: BTreeMap::new(),
            areas: Vec::new(),
        }
    }

    /// GUID namespace of this project.
    #[must_use]
    pub fn namespace(&self) -> Guid {
        self.guid
            .unwrap_or_else(|| Guid::derive(ROOT_NAMESPACE, &self.name))
    }

    /// Built-in catalog with this project's overrides applied.
    #[must_use]
    pub fn module_catalog(&self) -> ModuleCatalog {
        ModuleCatalog::with_overrides(&self.catalog)
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.areas.iter().flat_map(|a| a.rooms.iter())
    }

    pub fn boards(&self) -> impl Iterator<Item = &Board> {
        self.rooms().flat_map(|r| r.boards.iter())
    }

    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.boards().flat_map(|b| b.modules.iter())
    }

    pub fn circuits(&self) -> impl Iterator<Item = &Circuit> {
        self.rooms().flat_map(|r| r.circuits.iter())
    }

    pub fn keypads(&self) -> impl Iterator<Item = &Keypad> {
        self.rooms().flat_map(|r| r.keypads.iter())
    }

    #[must_use]
    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms().find(|r| r.id == id)
    }

    #[must_use]
    pub fn circuit(&self, id: CircuitId) -> Option<&Circuit> {
        self.circuits().find(|c| c.id == id)
    }

    pub fn circuit_mut(&mut self, id: CircuitId) -> Option<&mut Circuit> {
        self.areas
            .iter_mut()
            .flat_map(|a| a.rooms.iter_mut())
            .flat_map(|r| r.circuits.iter_mut())
            .find(|c| c.id == id)
    }

    #[must_use]
    pub fn module(&self, id: ModuleId) -> Option<&Module> {
        self.modules().find(|m| m.id == id)
    }

    /// Find a module by name anywhere in the project.
    #[must_use]
    pub fn module_by_name(&self, name: &str) -> Option<&Module> {
        self.modules().find(|m| m.name == name)
    }

    #[must_use]
    pub fn scene(&self, id: SceneId) -> Option<&Scene> {
        self.rooms()
            .flat_map(|r| r.scenes.iter())
            .find(|s| s.id == id)
    }

    /// Existing links per module, keyed by channel.
    #[must_use]
    pub fn links_by_module(&self) -> HashMap<ModuleId, BTreeMap<u16, &Circuit>> {
        let mut out: HashMap<ModuleId, BTreeMap<u16, &Circuit>> = HashMap::new();
        for circuit in self.circuits() {
            if let Some(link) = circuit.link {
                out.entry(link.module_id)
                    .or_default()
                    .insert(link.channel, circuit);
            }
        }
        out
    }

    /// The module acting as logic server: the flagged one, otherwise the
    /// first controller in project order.
    ///
    /// # Errors
    ///
    /// Returns [`PreconditionError::MultipleLogicServers`] when more than one
    /// module is flagged.
    pub fn logic_server(&self) -> Result<Option<&Module>, PreconditionError> {
        let flagged: Vec<&Module> = self.modules().filter(|m| m.is_logic_server).collect();
        match flagged.as_slice() {
            [] => Ok(self.modules().find(|m| m.is_controller())),
            [single] => Ok(Some(*single)),
            many => Err(PreconditionError::MultipleLogicServers { found: many.len() }),
        }
    }

    /// Check the project-wide preconditions of a compilation.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Precondition`] when two modules share a name or
    /// more than one logic server is flagged.
    pub fn check_preconditions(&self) -> Result<(), PanelError> {
        let mut names = HashMap::new();
        for module in self.modules() {
            if names.insert(module.name.as_str(), module.id).is_some() {
                return Err(PreconditionError::DuplicateModuleName {
                    name: module.name.clone(),
                }
                .into());
            }
        }
        self.logic_server()?;
        Ok(())
    }

    /// Record `link` on the circuit.
    ///
    /// # Errors
    ///
    /// Returns [`UnresolvedReference`] when the circuit is not in the project.
    pub fn apply_link(&mut self, circuit: CircuitId, link: Link) -> Result<(), UnresolvedReference> {
        let target = self.circuit_mut(circuit).ok_or_else(|| UnresolvedReference {
            kind: "circuit",
            id: circuit.to_string(),
        })?;
        target.link = Some(link);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::keypad::{Button, ButtonTarget};
    use crate::scene::Action;
    use crate::id::{ButtonId, KeypadId};

    pub(crate) const LIGHT: CircuitId = CircuitId::new(1);
    pub(crate) const SHADE: CircuitId = CircuitId::new(2);
    pub(crate) const HVAC: CircuitId = CircuitId::new(3);

    fn module(id: i64, name: &str, module_type: ModuleType) -> Module {
        Module::builder()
            .id(ModuleId::new(id))
            .name(name)
            .module_type(module_type)
            .build()
            .unwrap()
    }

    /// One area, one room with a light, a shade and an HVAC unit, and a
    /// board holding a controller plus one module per circuit class.
    pub(crate) fn living_room_project() -> ProjectSnapshot {
        let circuits = vec![
            Circuit::builder()
                .id(LIGHT)
                .identifier("L1")
                .light(false, 60.0)
                .build()
                .unwrap(),
            Circuit::builder().id(SHADE).identifier("P1").shade().build().unwrap(),
            Circuit::builder().id(HVAC).identifier("AC1").hvac().build().unwrap(),
        ];
        let board = Board {
            id: BoardId::new(100),
            name: "QD1".to_string(),
            notes: None,
            modules: vec![
                module(1000, "M4", ModuleType::AqlGvM4),
                module(1001, "RL12-1", ModuleType::Rl12),
                module(1002, "LX4-1", ModuleType::Lx4),
                module(1003, "SA1-1", ModuleType::Sa1),
            ],
        };
        let mut button = Button::new(ButtonId::new(1), 1);
        button.target = Some(ButtonTarget::Circuit(LIGHT));
        let keypad = Keypad {
            id: KeypadId::new(1),
            name: "Entrada".to_string(),
            model: None,
            color: None,
            button_color: None,
            button_count: 1,
            hsnet: None,
            dev_id: None,
            controller: None,
            notes: None,
            buttons: vec![button],
        };
        let scene = Scene {
            id: SceneId::new(1),
            name: "Noite".to_string(),
            guid: None,
            movers: false,
            actions: vec![Action::circuit(LIGHT, 30)],
        };

        let mut project = ProjectSnapshot::new("Casa");
        project.areas.push(Area {
            id: AreaId::new(1),
            name: "Térreo".to_string(),
            rooms: vec![Room {
                id: RoomId::new(10),
                name: "Living".to_string(),
                boards: vec![board],
                circuits,
                keypads: vec![keypad],
                scenes: vec![scene],
            }],
        });
        project
    }

    #[test]
    fn should_find_entities_across_the_tree() {
        let project = living_room_project();
        assert_eq!(project.circuit(SHADE).unwrap().identifier, "P1");
        assert_eq!(project.module_by_name("LX4-1").unwrap().id, ModuleId::new(1002));
        assert!(project.room(RoomId::new(10)).is_some());
        assert!(project.scene(SceneId::new(1)).is_some());
        assert_eq!(project.boards().count(), 1);
    }

    #[test]
    fn should_pick_first_controller_when_no_logic_server_is_flagged() {
        let project = living_room_project();
        let server = project.logic_server().unwrap().unwrap();
        assert_eq!(server.id, ModuleId::new(1000));
    }

    #[test]
    fn should_fail_when_two_logic_servers_are_flagged() {
        let mut project = living_room_project();
        for module in &mut project.areas[0].rooms[0].boards[0].modules {
            module.is_logic_server = true;
        }
        assert!(matches!(
            project.check_preconditions(),
            Err(PanelError::Precondition(PreconditionError::MultipleLogicServers { found: 4 }))
        ));
    }

    #[test]
    fn should_fail_when_module_names_collide() {
        let mut project = living_room_project();
        project.areas[0].rooms[0].boards[0].modules[2].name = "RL12-1".to_string();
        assert!(matches!(
            project.check_preconditions(),
            Err(PanelError::Precondition(PreconditionError::DuplicateModuleName { .. }))
        ));
    }

    #[test]
    fn should_apply_link_to_circuit() {
        let mut project = living_room_project();
        let link = Link {
            module_id: ModuleId::new(1001),
            channel: 3,
        };
        project.apply_link(LIGHT, link).unwrap();
        assert_eq!(project.circuit(LIGHT).unwrap().link, Some(link));
        let by_module = project.links_by_module();
        assert_eq!(by_module[&ModuleId::new(1001)][&3].id, LIGHT);
    }

    #[test]
    fn should_fail_when_linking_unknown_circuit() {
        let mut project = living_room_project();
        let link = Link {
            module_id: ModuleId::new(1001),
            channel: 3,
        };
        assert!(project.apply_link(CircuitId::new(77), link).is_err());
    }

    #[test]
    fn should_derive_stable_namespace_from_name_when_guid_is_missing() {
        let a = ProjectSnapshot::new("Casa");
        let b = ProjectSnapshot::new("Casa");
        assert_eq!(a.namespace(), b.namespace());
        assert_ne!(a.namespace(), ProjectSnapshot::new("Apto").namespace());
    }

    #[test]
    fn should_deserialize_minimal_snapshot() {
        let json = r#"{"name":"Casa","catalog":{"RL4":{"channel_current":2.5}}}"#;
        let project: ProjectSnapshot = serde_json::from_str(json).unwrap();
        assert!(project.areas.is_empty());
        assert!(project.module_catalog().electrical(ModuleType::Rl4).is_some());
    }
}
