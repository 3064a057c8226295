//! JSON file implementation of [`DocumentSink`].

use std::future::Future;
use std::path::PathBuf;

use panelforge_app::ports::DocumentSink;
use panelforge_domain::document::Document;
use panelforge_domain::error::PanelError;

use crate::error::StorageError;

/// Writes each compiled document to one output file.
pub struct JsonDocumentSink {
    path: PathBuf,
    pretty: bool,
}

impl JsonDocumentSink {
    /// Create a sink writing to `path`, indented when `pretty` is set.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, pretty: bool) -> Self {
        Self {
            path: path.into(),
            pretty,
        }
    }
}

impl DocumentSink for JsonDocumentSink {
    fn write(&self, document: &Document) -> impl Future<Output = Result<(), PanelError>> + Send {
        let path = self.path.clone();
        let encoded = if self.pretty {
            serde_json::to_vec_pretty(document)
        } else {
            serde_json::to_vec(document)
        }
        .map_err(StorageError::from);
        async move {
            let bytes = encoded?;
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(StorageError::io(parent))?;
            }
            tokio::fs::write(&path, &bytes)
                .await
                .map_err(StorageError::io(&path))?;
            tracing::info!(path = %path.display(), bytes = bytes.len(), "document written");
            Ok(())
        }
    }
}
