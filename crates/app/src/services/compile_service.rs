//! Compile service: snapshot in, document out.

use panelforge_domain::error::PanelError;

use crate::compiler::{self, CompileOptions, CompileReport, Compilation};
use crate::ports::{DocumentSink, SnapshotRepository};

/// Loads the project, compiles it and hands the document to the sink.
pub struct CompileService<R, W> {
    repo: R,
    sink: W,
    options: CompileOptions,
}

impl<R: SnapshotRepository, W: DocumentSink> CompileService<R, W> {
    /// Create a new service backed by the given repository and sink.
    pub fn new(repo: R, sink: W, options: CompileOptions) -> Self {
        Self {
            repo,
            sink,
            options,
        }
    }

    /// Compile the stored snapshot and write the resulting document.
    ///
    /// Nothing is written when compilation aborts.
    ///
    /// # Errors
    ///
    /// Returns the fatal [`PanelError`] that stopped the compile, or a
    /// storage error from either port.
    #[tracing::instrument(skip(self))]
    pub async fn compile(&self) -> Result<CompileReport, PanelError> {
        let project = self.repo.load().await?;
        let Compilation { document, report } = compiler::compile(&project, &self.options)?;
        self.sink.write(&document).await?;
        tracing::info!(
            issues = report.issues.len(),
            "document written"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fakes::{CapturingSink, InMemorySnapshots, RELAY, light, project};
    use panelforge_domain::error::PreconditionError;
    use panelforge_domain::time::Timestamp;

    fn options() -> CompileOptions {
        CompileOptions {
            timestamp: Some(Timestamp::from_timestamp(1_700_000_000, 0).unwrap()),
            ..CompileOptions::default()
        }
    }

    #[tokio::test]
    async fn should_write_closed_document_when_project_is_valid() {
        let mut circuit = light(1, false, 60.0);
        circuit.link = Some(panelforge_domain::circuit::Link {
            module_id: RELAY,
            channel: 1,
        });
        let svc = CompileService::new(
            InMemorySnapshots::new(project(vec![circuit])),
            CapturingSink::default(),
            options(),
        );

        let report = svc.compile().await.unwrap();

        assert!(report.issues.is_empty());
        let written = svc.sink.written.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].audit().is_closed());
    }

    #[tokio::test]
    async fn should_not_write_when_preconditions_fail() {
        let mut snapshot = project(Vec::new());
        let duplicate = snapshot.areas[0].rooms[0].boards[0].modules[0].name.clone();
        snapshot.areas[0].rooms[0].boards[0].modules[1].name = duplicate;
        let svc = CompileService::new(
            InMemorySnapshots::new(snapshot),
            CapturingSink::default(),
            options(),
        );

        let result = svc.compile().await;

        assert!(matches!(
            result,
            Err(PanelError::Precondition(PreconditionError::DuplicateModuleName { .. }))
        ));
        assert!(svc.sink.written.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_report_issue_when_recorded_link_is_incompatible() {
        let mut circuit = light(1, false, 60.0);
        circuit.link = Some(panelforge_domain::circuit::Link {
            module_id: crate::services::fakes::SHADES,
            channel: 1,
        });
        let svc = CompileService::new(
            InMemorySnapshots::new(project(vec![circuit])),
            CapturingSink::default(),
            options(),
        );

        let report = svc.compile().await.unwrap();

        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].subject, "circuit L1");
    }
}
