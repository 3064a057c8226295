//! Port definitions: the traits adapters implement.
//!
//! The core only reads a project snapshot and writes a document. Both
//! boundaries are declared here so services and adapters can share them
//! without depending on each other.

pub mod document_sink;
pub mod snapshot;

pub use document_sink::DocumentSink;
pub use snapshot::SnapshotRepository;
