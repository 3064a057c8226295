//! Assignment service: batch auto-linking over the stored snapshot.

use panelforge_domain::error::PanelError;

use crate::assignment::{AssignmentEngine, AssignmentReport};
use crate::ports::SnapshotRepository;

/// Runs the [`AssignmentEngine`] against the stored snapshot.
pub struct AssignmentService<R> {
    repo: R,
    voltage: f64,
}

impl<R: SnapshotRepository> AssignmentService<R> {
    /// Create a new service computing currents at `voltage` volts.
    pub fn new(repo: R, voltage: f64) -> Self {
        Self { repo, voltage }
    }

    /// Propose links for every unlinked circuit.
    ///
    /// With `apply` set, the proposed links are written into the snapshot
    /// and saved in one go; otherwise nothing is persisted.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Precondition`] before any change when the
    /// project does not have exactly one board or the voltage is not
    /// positive, or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn assign(&self, apply: bool) -> Result<AssignmentReport, PanelError> {
        let mut project = self.repo.load().await?;
        let report = AssignmentEngine::new(&project, self.voltage)?.run();
        if apply && report.links_created > 0 {
            report.apply(&mut project)?;
            self.repo.save(&project).await?;
            tracing::info!(links = report.links_created, "links saved");
        }
        Ok(report)
    }
}
