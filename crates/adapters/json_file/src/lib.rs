//! # panelforge-adapter-json
//!
//! File persistence adapter using [`serde_json`] and `tokio::fs`.
//!
//! ## Responsibilities
//! - Implement `SnapshotRepository` over one JSON snapshot file
//! - Implement `DocumentSink` writing the compiled document as JSON
//! - Map IO and decoding failures into `PanelError::Storage`
//!
//! ## Dependency rule
//! Depends on `panelforge-app` (for port traits) and `panelforge-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod document_sink;
pub mod error;
pub mod snapshot_repo;

pub use document_sink::JsonDocumentSink;
pub use error::StorageError;
pub use snapshot_repo::JsonSnapshotRepository;
