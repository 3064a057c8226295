//! Application services: one struct per use-case.
//!
//! Services take their ports as generic parameters at construction, so the
//! same code runs against the JSON adapters and the in-memory test doubles.

pub mod assignment_service;
pub mod compile_service;
pub mod link_service;

pub use assignment_service::AssignmentService;
pub use compile_service::CompileService;
pub use link_service::LinkService;

#[cfg(test)]
pub(crate) mod fakes {
    use std::future::Future;
    use std::sync::Mutex;

    use panelforge_domain::catalog::ModuleType;
    use panelforge_domain::circuit::Circuit;
    use panelforge_domain::document::Document;
    use panelforge_domain::error::PanelError;
    use panelforge_domain::id::{AreaId, BoardId, CircuitId, ModuleId, RoomId};
    use panelforge_domain::module::Module;
    use panelforge_domain::project::{Area, Board, ProjectSnapshot, Room};

    use crate::ports::{DocumentSink, SnapshotRepository};

    pub struct InMemorySnapshots {
        pub stored: Mutex<ProjectSnapshot>,
        pub saves: Mutex<usize>,
    }

    impl InMemorySnapshots {
        pub fn new(project: ProjectSnapshot) -> Self {
            Self {
                stored: Mutex::new(project),
                saves: Mutex::new(0),
            }
        }

        pub fn current(&self) -> ProjectSnapshot {
            self.stored.lock().unwrap().clone()
        }

        pub fn save_count(&self) -> usize {
            *self.saves.lock().unwrap()
        }
    }

    impl SnapshotRepository for InMemorySnapshots {
        fn load(&self) -> impl Future<Output = Result<ProjectSnapshot, PanelError>> + Send {
            let project = self.current();
            async { Ok(project) }
        }

        fn save(
            &self,
            project: &ProjectSnapshot,
        ) -> impl Future<Output = Result<(), PanelError>> + Send {
            *self.stored.lock().unwrap() = project.clone();
            *self.saves.lock().unwrap() += 1;
            async { Ok(()) }
        }
    }

    #[derive(Default)]
    pub struct CapturingSink {
        pub written: Mutex<Vec<Document>>,
    }

    impl DocumentSink for CapturingSink {
        fn write(&self, document: &Document) -> impl Future<Output = Result<(), PanelError>> + Send {
            self.written.lock().unwrap().push(document.clone());
            async { Ok(()) }
        }
    }

    pub const RELAY: ModuleId = ModuleId::new(20);
    pub const SHADES: ModuleId = ModuleId::new(21);

    pub fn light(id: i64, dimmable: bool, power: f64) -> Circuit {
        Circuit::builder()
            .id(CircuitId::new(id))
            .identifier(format!("L{id}"))
            .light(dimmable, power)
            .build()
            .unwrap()
    }

    pub fn module(id: ModuleId, name: &str, module_type: ModuleType) -> Module {
        Module::builder()
            .id(id)
            .name(name)
            .module_type(module_type)
            .build()
            .unwrap()
    }

    /// One room, one board holding an RL12 and an LX4.
    pub fn project(circuits: Vec<Circuit>) -> ProjectSnapshot {
        let mut project = ProjectSnapshot::new("Apartamento 101");
        project.areas.push(Area {
            id: AreaId::new(1),
            name: "Térreo".to_string(),
            rooms: vec![Room {
                id: RoomId::new(1),
                name: "Sala".to_string(),
                boards: vec![Board {
                    id: BoardId::new(1),
                    name: "QD1".to_string(),
                    notes: None,
                    modules: vec![
                        module(RELAY, "RL12-1", ModuleType::Rl12),
                        module(SHADES, "LX4-1", ModuleType::Lx4),
                    ],
                }],
                circuits,
                keypads: Vec::new(),
                scenes: Vec::new(),
            }],
        });
        project
    }
}
