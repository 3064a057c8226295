//! # panelforge-app
//!
//! Application layer: the compilation engine, the assignment engine,
//! **port definitions** (traits) and the use-cases built on them.
//!
//! ## Responsibilities
//! - Turn a [`ProjectSnapshot`](panelforge_domain::project::ProjectSnapshot)
//!   into a linked document (`compiler`): identifier pools, GUID index,
//!   hierarchy, channel links, scene and button resolution, registries
//! - Bind unlinked circuits to free channels under the electrical limits
//!   (`assignment`)
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `SnapshotRepository`: load & save the project snapshot
//!   - `DocumentSink`: write the compiled document
//! - Define **driving/inbound ports** as use-case structs:
//!   - `CompileService`: load, compile, write
//!   - `AssignmentService`: batch auto-linking, optionally saved
//!   - `LinkService`: manual link and unlink of one circuit
//!
//! ## Dependency rule
//! Depends on `panelforge-domain` only. Never imports adapter crates.
//! Adapters depend on *this* crate, not the reverse.

pub mod assignment;
pub mod compiler;
pub mod ports;
pub mod services;
