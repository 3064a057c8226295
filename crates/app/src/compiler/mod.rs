//! Compilation engine: turns a [`ProjectSnapshot`] into a linked
//! [`Document`].
//!
//! The passes run in a fixed order on one thread:
//!
//! 1. containers (areas, rooms, boards) and their GUIDs
//! 2. address plan, then modules with their parent controllers
//! 3. load outputs and the channel links recorded in the snapshot
//! 4. scenes, then keypads (both need every circuit GUID)
//! 5. registry consistency
//! 6. serialization and a closing GUID audit
//!
//! Per-entity problems become [`Issue`]s in the [`CompileReport`]; only
//! precondition, allocation and audit failures abort.

pub mod addressing;
pub mod allocator;
pub mod factory;
pub mod guid_index;
pub mod hierarchy;
pub mod linker;
pub mod registry;
pub mod resolver;
pub mod serializer;

use std::collections::{BTreeMap, HashMap};

use panelforge_domain::catalog::{ModuleCatalog, ModuleType};
use panelforge_domain::circuit::{Circuit, CircuitKind};
use panelforge_domain::document::{
    Document, HVAC_CONTROL_MODEL, HVAC_PROFILE, HvacNode, LightNode, LoadOutput, SHADE_PROFILE,
    ShadeNode, Unit,
};
use panelforge_domain::electrical::NOMINAL_VOLTAGE;
use panelforge_domain::error::{
    AllocationError, LinkError, PanelError, PreconditionError, UnresolvedReference,
};
use panelforge_domain::id::{BoardId, Guid, ModuleId, RoomId};
use panelforge_domain::module::Module;
use panelforge_domain::project::ProjectSnapshot;
use panelforge_domain::time::{self, Timestamp};
use serde::Serialize;

use addressing::{Address, AddressRequest, Addressee, DevIdFallback};
use allocator::{IdentifierPools, Pool};
use factory::{ButtonPlan, ModuleParams};
use guid_index::{GuidIndex, SourceKey};
use hierarchy::{BoardIdx, Hierarchy, ModuleIdx, RoomIdx};

pub use registry::RegistrySummary;

/// Defaults applied where the snapshot says nothing.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub tech_area: String,
    pub tech_room: String,
    pub board_name: String,
    pub software_version: String,
    pub timezone_id: String,
    /// Preferred HSNET address of the logic server.
    pub logic_server_hsnet: u16,
    /// Supply voltage used to check recorded links against current limits.
    pub voltage: f64,
    /// Fixed "now", for reproducible output.
    pub timestamp: Option<Timestamp>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            tech_area: "Área Técnica".to_string(),
            tech_room: "Sala Técnica".to_string(),
            board_name: "Quadro Elétrico".to_string(),
            software_version: "1.0.8.67".to_string(),
            timezone_id: "America/Bahia".to_string(),
            logic_server_hsnet: 245,
            voltage: NOMINAL_VOLTAGE,
            timestamp: None,
        }
    }
}

/// A skipped or degraded entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub subject: String,
    pub message: String,
}

impl Issue {
    #[must_use]
    pub fn new(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompileReport {
    pub issues: Vec<Issue>,
    pub registries: Vec<RegistrySummary>,
}

/// Result of a successful compile.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub document: Document,
    pub report: CompileReport,
}

/// Compile `project` into a document.
///
/// # Errors
///
/// - [`PanelError::Precondition`] for duplicate module names, several logic
///   servers or a non-positive voltage
/// - [`PanelError::Allocation`] when an identifier pool runs out
/// - [`PanelError::Unresolved`] when the finished document is not closed
#[tracing::instrument(skip_all, fields(project = %project.name))]
pub fn compile(
    project: &ProjectSnapshot,
    options: &CompileOptions,
) -> Result<Compilation, PanelError> {
    project.check_preconditions()?;
    if !options.voltage.is_finite() || options.voltage <= 0.0 {
        return Err(PreconditionError::NonPositiveVoltage.into());
    }
    let now = options.timestamp.unwrap_or_else(time::now);

    let mut compiler = Compiler::new(project, options);
    compiler.place_containers();
    compiler.place_modules()?;
    compiler.place_loads()?;
    compiler.link_circuits();
    compiler.place_scenes()?;
    compiler.place_keypads()?;

    let Compiler {
        mut index,
        mut tree,
        mut issues,
        ..
    } = compiler;
    let registries = registry::synchronize(&mut tree, &mut issues);
    let document = serializer::serialize(tree.into_parts(), project, &mut index, options, now);
    check_closure(&document)?;

    for issue in &issues {
        tracing::warn!(subject = %issue.subject, "{}", issue.message);
    }
    tracing::info!(
        guids = index.len(),
        issues = issues.len(),
        controllers = registries.len(),
        "compilation finished"
    );
    Ok(Compilation {
        document,
        report: CompileReport { issues, registries },
    })
}

/// Check `draw` against the ratings of `module_type`, given the current
/// already committed per channel of the same module.
fn check_current(
    catalog: &ModuleCatalog,
    module_type: ModuleType,
    channel: u16,
    draw: f64,
    loads: &BTreeMap<u16, f64>,
) -> Result<(), LinkError> {
    let Some(spec) = catalog.electrical(module_type) else {
        return Ok(());
    };
    let on_channel = loads.get(&channel).copied().unwrap_or(0.0);
    spec.check(channel, draw + on_channel, |c| {
        loads.get(&c).copied().unwrap_or(0.0)
    })
}

fn check_closure(document: &Document) -> Result<(), UnresolvedReference> {
    let audit = document.audit();
    if let Some(guid) = audit.duplicates().first() {
        return Err(UnresolvedReference {
            kind: "guid",
            id: format!("{guid} (defined twice)"),
        });
    }
    if let Some(guid) = audit.dangling().first() {
        return Err(UnresolvedReference {
            kind: "guid",
            id: guid.to_string(),
        });
    }
    Ok(())
}

struct Compiler<'a> {
    project: &'a ProjectSnapshot,
    options: &'a CompileOptions,
    pools: IdentifierPools,
    index: GuidIndex,
    tree: Hierarchy,
    issues: Vec<Issue>,
    rooms: HashMap<RoomId, RoomIdx>,
    boards: HashMap<BoardId, BoardIdx>,
    addresses: HashMap<Addressee, Address>,
    logic_server: Option<ModuleIdx>,
}

impl<'a> Compiler<'a> {
    fn new(project: &'a ProjectSnapshot, options: &'a CompileOptions) -> Self {
        Self {
            project,
            options,
            pools: IdentifierPools::new(),
            index: GuidIndex::new(project.namespace()),
            tree: Hierarchy::new(),
            issues: Vec::new(),
            rooms: HashMap::new(),
            boards: HashMap::new(),
            addresses: HashMap::new(),
            logic_server: None,
        }
    }

    fn note(&mut self, subject: impl Into<String>, message: impl Into<String>) {
        self.issues.push(Issue::new(subject, message));
    }

    fn place_containers(&mut self) {
        let project = self.project;
        for area in &project.areas {
            let area_idx =
                self.tree
                    .ensure_area(&mut self.index, &area.name, Some(SourceKey::Area(area.id)));
            for room in &area.rooms {
                let room_idx = self.tree.ensure_room(
                    &mut self.index,
                    area_idx,
                    &room.name,
                    Some(SourceKey::Room(room.id)),
                );
                self.rooms.insert(room.id, room_idx);
                for board in &room.boards {
                    let board_idx = self.tree.ensure_board(
                        &mut self.index,
                        room_idx,
                        &board.name,
                        Some(SourceKey::Board(board.id)),
                    );
                    self.tree.board_mut(board_idx).notes.clone_from(&board.notes);
                    self.boards.insert(board.id, board_idx);
                }
            }
        }
        tracing::debug!(rooms = self.rooms.len(), boards = self.boards.len(), "containers placed");
    }

    fn address_requests(&self, server: Option<&Module>) -> Vec<AddressRequest> {
        let mut requests = Vec::new();
        if server.is_none() {
            requests.push(AddressRequest {
                owner: Addressee::DefaultController,
                subject: "default controller".to_string(),
                hsnet: None,
                dev_id: None,
                fallback_hsnet: Some(self.options.logic_server_hsnet),
                fallback_dev_id: DevIdFallback::Preferred(1),
            });
        }
        for module in self.project.modules() {
            let is_server = server.is_some_and(|s| s.id == module.id);
            requests.push(AddressRequest {
                owner: Addressee::Module(module.id),
                subject: format!("module {:?}", module.name),
                hsnet: module.hsnet,
                dev_id: module.dev_id,
                fallback_hsnet: is_server.then_some(self.options.logic_server_hsnet),
                fallback_dev_id: module
                    .module_type
                    .controller_profile()
                    .map_or(DevIdFallback::Scan, |p| {
                        DevIdFallback::Preferred(p.default_dev_id)
                    }),
            });
        }
        for keypad in self.project.keypads().filter(|k| k.validate().is_ok()) {
            requests.push(AddressRequest {
                owner: Addressee::Keypad(keypad.id),
                subject: format!("keypad {:?}", keypad.name),
                hsnet: keypad.hsnet,
                dev_id: keypad.dev_id,
                fallback_hsnet: None,
                fallback_dev_id: DevIdFallback::FollowHsnet,
            });
        }
        requests
    }

    fn address(&self, owner: Addressee) -> Result<Address, UnresolvedReference> {
        self.addresses
            .get(&owner)
            .copied()
            .ok_or_else(|| UnresolvedReference {
                kind: "address",
                id: format!("{owner:?}"),
            })
    }

    fn place_modules(&mut self) -> Result<(), PanelError> {
        let project = self.project;
        let server = project.logic_server()?;
        let requests = self.address_requests(server);
        self.addresses = addressing::plan(&requests, &mut self.pools, &mut self.issues)?;

        if server.is_none() {
            self.logic_server = Some(self.synthesize_controller()?);
        }

        let (controllers, peripherals): (Vec<&Module>, Vec<&Module>) =
            project.modules().partition(|m| m.is_controller());
        let boards: HashMap<_, _> = project
            .boards()
            .flat_map(|b| b.modules.iter().map(move |m| (m.id, b.id)))
            .collect();

        for module in controllers.into_iter().chain(peripherals) {
            let is_server = server.is_some_and(|s| s.id == module.id);
            let board = boards
                .get(&module.id)
                .and_then(|id| self.boards.get(id))
                .copied()
                .ok_or_else(|| UnresolvedReference {
                    kind: "board",
                    id: format!("of module {}", module.id),
                })?;
            let address = self.address(Addressee::Module(module.id))?;
            let guid = self.index.mint(SourceKey::Module(module.id), None);
            let node = factory::module_node(
                ModuleParams {
                    name: module.name.clone(),
                    module_type: module.module_type,
                    guid,
                    hsnet: address.hsnet,
                    dev_id: address.dev_id,
                    ip_address: module.ip_address.clone(),
                    logic_server: is_server,
                    notes: module.notes.clone(),
                },
                &mut self.pools,
            )?;
            let idx = self
                .tree
                .add_module(board, node, module.module_type, Some(module.id));
            if is_server {
                self.logic_server = Some(idx);
            }
        }

        for module in project.modules() {
            self.attach_to_controller(module);
        }
        tracing::debug!(modules = self.tree.modules().count(), "modules placed");
        Ok(())
    }

    fn synthesize_controller(&mut self) -> Result<ModuleIdx, PanelError> {
        let options = self.options;
        let area = self.tree.ensure_area(&mut self.index, &options.tech_area, None);
        let room = self
            .tree
            .ensure_room(&mut self.index, area, &options.tech_room, None);
        let board = self
            .tree
            .ensure_board(&mut self.index, room, &options.board_name, None);
        let address = self.address(Addressee::DefaultController)?;
        let board_guid = self.tree.board(board).guid;
        let module_type = ModuleType::AqlGvM4;
        let node = factory::module_node(
            ModuleParams {
                name: module_type.model_name().to_string(),
                module_type,
                guid: self.index.mint_anonymous(board_guid, "module:logic-server"),
                hsnet: address.hsnet,
                dev_id: address.dev_id,
                ip_address: None,
                logic_server: true,
                notes: None,
            },
            &mut self.pools,
        )?;
        tracing::info!(hsnet = address.hsnet, "no controller in project, default logic server added");
        Ok(self.tree.add_module(board, node, module_type, None))
    }

    fn attach_to_controller(&mut self, module: &Module) {
        let Some(idx) = self.tree.module_by_source(module.id) else {
            return;
        };
        if Some(idx) == self.logic_server {
            return;
        }
        let parent = match module.parent_controller {
            Some(parent_id) => match self.tree.module_by_source(parent_id) {
                Some(parent) if parent != idx && self.tree.module(parent).module_type.is_controller() => {
                    Some(parent)
                }
                _ => {
                    self.note(
                        format!("module {:?}", module.name),
                        format!("parent controller {parent_id} is not a controller, using the logic server"),
                    );
                    self.logic_server
                }
            },
            None => self.logic_server,
        };
        self.tree.module_mut(idx).parent = parent;
    }

    fn room_idx(&self, id: RoomId) -> Result<RoomIdx, UnresolvedReference> {
        self.rooms.get(&id).copied().ok_or_else(|| UnresolvedReference {
            kind: "room",
            id: id.to_string(),
        })
    }

    fn unit(&mut self) -> Result<Unit, AllocationError> {
        self.pools.allocate(Pool::UnitId, None).map(Unit::new)
    }

    fn load_output(&mut self, circuit: &Circuit, guid: Guid) -> Result<LoadOutput, AllocationError> {
        let name = circuit.display_name().to_string();
        Ok(match circuit.kind {
            CircuitKind::Light { dimmable, power } => {
                LoadOutput::Circuit(LightNode::new(name, guid, self.unit()?, dimmable, power))
            }
            CircuitKind::Shade => LoadOutput::Shade(ShadeNode {
                shade_type: 0,
                shade_icon: 0,
                profile_guid: SHADE_PROFILE,
                unit_movement: self.unit()?,
                unit_opened_percentage: self.unit()?,
                unit_current_position: self.unit()?,
                name,
                guid,
                description: "Persiana".to_string(),
            }),
            CircuitKind::Hvac => LoadOutput::Hvac(HvacNode {
                profile_guid: HVAC_PROFILE,
                control_model_guid: HVAC_CONTROL_MODEL,
                unit: None,
                name,
                guid,
                description: "HVAC".to_string(),
            }),
        })
    }

    fn place_loads(&mut self) -> Result<(), PanelError> {
        let project = self.project;
        for room in project.rooms() {
            let room_idx = self.room_idx(room.id)?;
            for circuit in &room.circuits {
                let guid = self.index.mint(SourceKey::Circuit(circuit.id), None);
                let load = self.load_output(circuit, guid)?;
                self.tree.room_mut(room_idx).loads.push(load);
            }
        }
        Ok(())
    }

    fn link_circuits(&mut self) {
        let project = self.project;
        let catalog = project.module_catalog();
        let mut committed: HashMap<ModuleId, BTreeMap<u16, f64>> = HashMap::new();
        let mut linked = 0usize;
        for circuit in project.circuits() {
            let Some(link) = circuit.link else {
                continue;
            };
            let subject = format!("circuit {}", circuit.identifier);
            let Some(module) = project.module(link.module_id) else {
                self.note(subject, format!("linked to unknown module {}", link.module_id));
                continue;
            };
            let Some(guid) = self.index.get(SourceKey::Circuit(circuit.id)) else {
                continue;
            };
            let draw = circuit.current_draw(self.options.voltage);
            let loads = committed.entry(module.id).or_default();
            if let Err(err) = check_current(&catalog, module.module_type, link.channel, draw, loads) {
                self.note(subject, format!("not linked to {}: {err}", module.name));
                continue;
            }
            match linker::link(&mut self.tree, circuit, guid, &module.name, link.channel) {
                Ok(placement) => {
                    *loads.entry(placement.channel).or_default() += draw;
                    linked += 1;
                    tracing::debug!(
                        circuit = %circuit.identifier,
                        module = %module.name,
                        channel = placement.channel,
                        "circuit linked"
                    );
                }
                Err(err) => self.note(subject, err.to_string()),
            }
        }
        tracing::debug!(linked, "links written");
    }

    fn place_scenes(&mut self) -> Result<(), PanelError> {
        let project = self.project;
        for room in project.rooms() {
            let room_idx = self.room_idx(room.id)?;
            for scene in &room.scenes {
                let subject = format!("scene {:?}", scene.name);
                if let Err(err) = scene.check_movers(project) {
                    self.note(subject, format!("skipped: {err}"));
                    continue;
                }
                let unit = self.unit()?;
                let guid = self.index.mint(SourceKey::Scene(scene.id), scene.guid);
                match resolver::resolve_scene(scene, guid, unit, project, &self.index, &mut self.issues) {
                    Ok(node) => self.tree.room_mut(room_idx).scenes.push(node),
                    Err(err) => self.note(subject, format!("skipped: {err}")),
                }
            }
        }
        Ok(())
    }

    fn place_keypads(&mut self) -> Result<(), PanelError> {
        let project = self.project;
        for room in project.rooms() {
            let room_idx = self.room_idx(room.id)?;
            for keypad in &room.keypads {
                let subject = format!("keypad {:?}", keypad.name);
                if let Err(err) = keypad.validate() {
                    self.note(subject, format!("skipped: {err}"));
                    continue;
                }
                let address = self.address(Addressee::Keypad(keypad.id))?;
                let guid = self.index.mint(SourceKey::Keypad(keypad.id), None);

                let mut plans = Vec::with_capacity(keypad.buttons.len());
                for button in &keypad.buttons {
                    if let Err(err) = keypad.check_button(button) {
                        self.note(subject.clone(), format!("button {} skipped: {err}", button.id));
                        continue;
                    }
                    let button_guid = self.index.mint(SourceKey::Button(button.id), button.guid);
                    let target = match resolver::resolve_button(button, &self.index) {
                        Ok(target) => target,
                        Err(message) => {
                            self.note(subject.clone(), format!("{message}, left unlinked"));
                            None
                        }
                    };
                    plans.push(ButtonPlan {
                        button,
                        guid: button_guid,
                        target,
                    });
                }

                let controller = match keypad.controller {
                    Some(id) => match self.tree.module_by_source(id) {
                        Some(idx) if self.tree.module(idx).module_type.is_controller() => Some(idx),
                        _ => {
                            self.note(
                                subject.clone(),
                                format!("controller {id} is not a controller, using the logic server"),
                            );
                            self.logic_server
                        }
                    },
                    None => self.logic_server,
                };
                let node = factory::keypad_node(
                    keypad,
                    guid,
                    address.hsnet,
                    address.dev_id,
                    plans,
                    &mut self.pools,
                )?;
                self.tree.add_keypad(room_idx, node, controller);
            }
        }
        Ok(())
    }
}
