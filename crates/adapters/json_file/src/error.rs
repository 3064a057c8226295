//! Storage-specific error type wrapping IO and JSON errors.

use std::path::PathBuf;

use panelforge_domain::error::PanelError;

/// Errors originating from the JSON file layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading or writing a file failed.
    #[error("cannot access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file content is not a valid snapshot.
    #[error("invalid JSON in {}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A value could not be encoded.
    #[error("JSON serialization error")]
    Encode(#[from] serde_json::Error),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}

impl From<StorageError> for PanelError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
