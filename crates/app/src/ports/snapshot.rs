//! Snapshot port: where the project entity graph is read from and saved to.

use std::future::Future;

use panelforge_domain::error::PanelError;
use panelforge_domain::project::ProjectSnapshot;

/// Source of one project's [`ProjectSnapshot`].
pub trait SnapshotRepository {
    /// Read the whole snapshot.
    fn load(&self) -> impl Future<Output = Result<ProjectSnapshot, PanelError>> + Send;

    /// Replace the stored snapshot with `project`.
    fn save(
        &self,
        project: &ProjectSnapshot,
    ) -> impl Future<Output = Result<(), PanelError>> + Send;
}
