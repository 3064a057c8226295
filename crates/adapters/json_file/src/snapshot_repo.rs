//! JSON file implementation of [`SnapshotRepository`].

use std::future::Future;
use std::path::{Path, PathBuf};

use panelforge_app::ports::SnapshotRepository;
use panelforge_domain::error::PanelError;
use panelforge_domain::project::ProjectSnapshot;

use crate::error::StorageError;

/// Snapshot stored as a single JSON file.
pub struct JsonSnapshotRepository {
    path: PathBuf,
}

impl JsonSnapshotRepository {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotRepository for JsonSnapshotRepository {
    fn load(&self) -> impl Future<Output = Result<ProjectSnapshot, PanelError>> + Send {
        let path = self.path.clone();
        async move {
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(StorageError::io(&path))?;
            let project: ProjectSnapshot =
                serde_json::from_slice(&bytes).map_err(|source| StorageError::Json {
                    path: path.clone(),
                    source,
                })?;
            tracing::debug!(path = %path.display(), project = %project.name, "snapshot loaded");
            Ok(project)
        }
    }

    fn save(
        &self,
        project: &ProjectSnapshot,
    ) -> impl Future<Output = Result<(), PanelError>> + Send {
        let path = self.path.clone();
        let encoded = serde_json::to_vec_pretty(project).map_err(StorageError::from);
        async move {
            let bytes = encoded?;
            // The old snapshot stays in place until the new one is fully written.
            let staging = path.with_extension("json.tmp");
            tokio::fs::write(&staging, &bytes)
                .await
                .map_err(StorageError::io(&staging))?;
            tokio::fs::rename(&staging, &path)
                .await
                .map_err(StorageError::io(&path))?;
            tracing::debug!(path = %path.display(), "snapshot saved");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panelforge_domain::circuit::Circuit;
    use panelforge_domain::id::{AreaId, CircuitId, RoomId};
    use panelforge_domain::project::{Area, Room};

    fn project() -> ProjectSnapshot {
        let mut project = ProjectSnapshot::new("Casa de Praia");
        project.areas.push(Area {
            id: AreaId::new(1),
            name: "Térreo".to_string(),
            rooms: vec![Room {
                id: RoomId::new(2),
                name: "Varanda".to_string(),
                boards: Vec::new(),
                circuits: vec![
                    Circuit::builder()
                        .id(CircuitId::new(3))
                        .identifier("L3")
                        .light(true, 40.0)
                        .build()
                        .unwrap(),
                ],
                keypads: Vec::new(),
                scenes: Vec::new(),
            }],
        });
        project
    }

    #[tokio::test]
    async fn should_load_what_was_saved() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonSnapshotRepository::new(dir.path().join("project.json"));

        repo.save(&project()).await.unwrap();
        let loaded = repo.load().await.unwrap();

        assert_eq!(loaded, project());
        assert!(!dir.path().join("project.json.tmp").exists());
    }

    #[tokio::test]
    async fn should_return_storage_error_when_file_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonSnapshotRepository::new(dir.path().join("missing.json"));

        let result = repo.load().await;

        assert!(matches!(result, Err(PanelError::Storage(_))));
    }

    #[tokio::test]
    async fn should_return_storage_error_when_json_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, b"{\"name\": 12").unwrap();

        let err = JsonSnapshotRepository::new(&path).load().await.unwrap_err();

        assert!(err.to_string().contains("storage"));
        let PanelError::Storage(source) = err else {
            panic!("expected a storage error");
        };
        assert!(source.to_string().contains("broken.json"));
    }
}
