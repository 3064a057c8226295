//! Document sink port: destination of compiled documents.

use std::future::Future;

use panelforge_domain::document::Document;
use panelforge_domain::error::PanelError;

pub trait DocumentSink {
    /// Persist a compiled document, replacing any previous output.
    fn write(&self, document: &Document) -> impl Future<Output = Result<(), PanelError>> + Send;
}
