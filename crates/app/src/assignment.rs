//! Assignment engine: binds unlinked circuits to free module channels.
//!
//! Rooms with the most unlinked circuits go first. Inside a room dimmable
//! lights go before the rest, then lights before shades before HVAC. Each
//! circuit scores every module of a compatible type and takes the first
//! channel, in ascending order, that passes the channel and current-group
//! limits. A circuit that fits nowhere is reported and the batch goes on.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use panelforge_domain::catalog::{ModuleCatalog, ModuleType};
use panelforge_domain::circuit::{Circuit, CircuitKind, Link};
use panelforge_domain::error::{LinkError, PanelError, PreconditionError, UnresolvedReference};
use panelforge_domain::id::{CircuitId, ModuleId, RoomId};
use panelforge_domain::module::Module;
use panelforge_domain::project::ProjectSnapshot;
use serde::{Serialize, Serializer};

const AFFINITY_WEIGHT: i64 = 10;
const PRIORITY_WEIGHT: i64 = 5;
const DIMMER_PENALTY: i64 = -100;

/// A link decided by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProposedLink {
    pub circuit_id: CircuitId,
    pub module_id: ModuleId,
    pub channel: u16,
}

/// Why a circuit could not be placed.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureReason {
    NoCompatibleModule,
    NoFreeChannel,
    ChannelCurrentExceeded { required: f64, rating: f64 },
    GroupCurrentExceeded { total: f64, max: f64 },
}

impl FailureReason {
    fn from_capacity(err: LinkError) -> Option<Self> {
        match err {
            LinkError::ChannelCurrentExceeded { required, rating } => {
                Some(Self::ChannelCurrentExceeded { required, rating })
            }
            LinkError::GroupCurrentExceeded { total, max } => {
                Some(Self::GroupCurrentExceeded { total, max })
            }
            _ => None,
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCompatibleModule => f.write_str("no compatible module in the project"),
            Self::NoFreeChannel => f.write_str("every compatible module is full"),
            Self::ChannelCurrentExceeded { required, rating } => write!(
                f,
                "circuit draws {required:.2}A, above the {rating}A channel rating"
            ),
            Self::GroupCurrentExceeded { total, max } => write!(
                f,
                "current group would carry {total:.2}A, above its {max}A limit"
            ),
        }
    }
}

impl Serialize for FailureReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentFailure {
    pub circuit_id: CircuitId,
    pub reason: FailureReason,
}

/// Outcome of one batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssignmentReport {
    pub links_created: usize,
    pub links: Vec<ProposedLink>,
    pub failures: Vec<AssignmentFailure>,
}

impl AssignmentReport {
    /// Write the proposed links into `project`.
    ///
    /// # Errors
    ///
    /// Returns [`UnresolvedReference`] when a circuit no longer exists.
    pub fn apply(&self, project: &mut ProjectSnapshot) -> Result<(), UnresolvedReference> {
        for link in &self.links {
            project.apply_link(
                link.circuit_id,
                Link {
                    module_id: link.module_id,
                    channel: link.channel,
                },
            )?;
        }
        Ok(())
    }
}

/// Module types a circuit may go to, best first.
#[must_use]
pub fn type_priorities(kind: CircuitKind) -> &'static [ModuleType] {
    match kind {
        CircuitKind::Light { dimmable: true, .. } => {
            &[ModuleType::Dim8, ModuleType::Rl12, ModuleType::Rl4]
        }
        CircuitKind::Light { dimmable: false, .. } => {
            &[ModuleType::Rl12, ModuleType::Rl4, ModuleType::Dim8]
        }
        CircuitKind::Shade => &[ModuleType::Lx4],
        CircuitKind::Hvac => &[ModuleType::Sa1],
    }
}

#[derive(Debug)]
struct ModuleState<'a> {
    module: &'a Module,
    /// Current committed on each occupied channel.
    occupied: BTreeMap<u16, f64>,
    affinity: HashMap<RoomId, usize>,
}

impl ModuleState<'_> {
    fn free_channels(&self) -> usize {
        usize::from(self.module.module_type.channel_count()).saturating_sub(self.occupied.len())
    }

    fn committed(&self, channel: u16) -> f64 {
        self.occupied.get(&channel).copied().unwrap_or(0.0)
    }

    fn score(&self, circuit: &Circuit, room: RoomId) -> i64 {
        let priorities = type_priorities(circuit.kind);
        let module_type = self.module.module_type;
        let rank = priorities
            .iter()
            .position(|t| *t == module_type)
            .unwrap_or(priorities.len());
        let priority = if matches!(circuit.kind, CircuitKind::Light { dimmable: false, .. })
            && module_type == ModuleType::Dim8
        {
            DIMMER_PENALTY
        } else {
            i64::try_from(priorities.len() - rank).unwrap_or(0) * PRIORITY_WEIGHT
        };
        let affinity = i64::try_from(self.affinity.get(&room).copied().unwrap_or(0)).unwrap_or(0);
        let free = i64::try_from(self.free_channels()).unwrap_or(0);
        affinity * AFFINITY_WEIGHT + free + priority
    }
}

/// Automatic channel assignment over one project snapshot.
pub struct AssignmentEngine<'a> {
    project: &'a ProjectSnapshot,
    catalog: ModuleCatalog,
    voltage: f64,
}

impl<'a> AssignmentEngine<'a> {
    /// Prepare a run at `voltage` volts.
    ///
    /// # Errors
    ///
    /// - [`PreconditionError::BoardCount`] unless the project has exactly one board
    /// - [`PreconditionError::NonPositiveVoltage`] when `voltage` is not a positive number
    pub fn new(project: &'a ProjectSnapshot, voltage: f64) -> Result<Self, PanelError> {
        let boards = project.boards().count();
        if boards != 1 {
            return Err(PreconditionError::BoardCount { found: boards }.into());
        }
        if !voltage.is_finite() || voltage <= 0.0 {
            return Err(PreconditionError::NonPositiveVoltage.into());
        }
        Ok(Self {
            project,
            catalog: project.module_catalog(),
            voltage,
        })
    }

    fn module_states(&self) -> Vec<ModuleState<'a>> {
        let project = self.project;
        let mut states: Vec<ModuleState<'a>> = project
            .modules()
            .filter(|m| m.module_type.channel_count() > 0)
            .map(|module| ModuleState {
                module,
                occupied: BTreeMap::new(),
                affinity: HashMap::new(),
            })
            .collect();

        for room in project.rooms() {
            for circuit in &room.circuits {
                let Some(link) = circuit.link else {
                    continue;
                };
                let Some(state) = states.iter_mut().find(|s| s.module.id == link.module_id) else {
                    continue;
                };
                if link.channel == 0 || link.channel > state.module.module_type.channel_count() {
                    continue;
                }
                *state.occupied.entry(link.channel).or_default() += circuit.current_draw(self.voltage);
                *state.affinity.entry(room.id).or_default() += 1;
            }
        }
        states
    }

    /// Propose links for every unlinked circuit. Nothing is written.
    #[tracing::instrument(skip_all, fields(project = %self.project.name, voltage = self.voltage))]
    pub fn run(&self) -> AssignmentReport {
        let mut states = self.module_states();

        let mut rooms: Vec<(RoomId, Vec<&Circuit>)> = self
            .project
            .rooms()
            .map(|room| {
                let pending: Vec<&Circuit> =
                    room.circuits.iter().filter(|c| c.link.is_none()).collect();
                (room.id, pending)
            })
            .filter(|(_, pending)| !pending.is_empty())
            .collect();
        rooms.sort_by_key(|(_, pending)| Reverse(pending.len()));

        let mut report = AssignmentReport::default();
        for (room, mut circuits) in rooms {
            // CircuitClass orders light < shade < hvac, the order of the type priority table.
            circuits.sort_by_key(|c| (!c.is_dimmable(), c.class()));
            for circuit in circuits {
                match self.place(&mut states, circuit, room) {
                    Ok(link) => {
                        tracing::debug!(
                            circuit = %circuit.identifier,
                            module = %link.module_id,
                            channel = link.channel,
                            "circuit assigned"
                        );
                        report.links.push(link);
                    }
                    Err(reason) => {
                        tracing::warn!(circuit = %circuit.identifier, %reason, "circuit not assigned");
                        report.failures.push(AssignmentFailure {
                            circuit_id: circuit.id,
                            reason,
                        });
                    }
                }
            }
        }
        report.links_created = report.links.len();
        tracing::info!(
            links = report.links_created,
            failures = report.failures.len(),
            "assignment finished"
        );
        report
    }

    fn place(
        &self,
        states: &mut [ModuleState<'a>],
        circuit: &Circuit,
        room: RoomId,
    ) -> Result<ProposedLink, FailureReason> {
        let priorities = type_priorities(circuit.kind);
        let compatible: Vec<usize> = states
            .iter()
            .enumerate()
            .filter(|(_, s)| priorities.contains(&s.module.module_type))
            .map(|(i, _)| i)
            .collect();
        if compatible.is_empty() {
            return Err(FailureReason::NoCompatibleModule);
        }

        let mut candidates: Vec<(usize, i64)> = compatible
            .into_iter()
            .filter(|i| states[*i].free_channels() > 0)
            .map(|i| (i, states[i].score(circuit, room)))
            .collect();
        candidates.sort_by_key(|(_, score)| Reverse(*score));

        let draw = circuit.current_draw(self.voltage);
        let mut rejection = None;
        for (i, _) in candidates {
            let state = &states[i];
            let module_type = state.module.module_type;
            let channel = (1..=module_type.channel_count())
                .filter(|ch| !state.occupied.contains_key(ch))
                .find(|ch| match self.catalog.electrical(module_type) {
                    None => true,
                    Some(spec) => match spec.check(*ch, draw, |c| state.committed(c)) {
                        Ok(()) => true,
                        Err(err) => {
                            if rejection.is_none() {
                                rejection = FailureReason::from_capacity(err);
                            }
                            false
                        }
                    },
                });
            if let Some(channel) = channel {
                let state = &mut states[i];
                state.occupied.insert(channel, draw);
                *state.affinity.entry(room).or_default() += 1;
                return Ok(ProposedLink {
                    circuit_id: circuit.id,
                    module_id: state.module.id,
                    channel,
                });
            }
        }
        Err(rejection.unwrap_or(FailureReason::NoFreeChannel))
    }
}
