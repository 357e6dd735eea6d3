use std::sync::Arc;

use tracing::info;

use crate::export::{ExportError, IndexClient};
use crate::record::Record;

/// Indexes every record as a document of `doc_type` in `index`.
pub struct SearchIndexExporter {
    client: Arc<dyn IndexClient>,
    index: String,
    doc_type: String,
}

impl SearchIndexExporter {
    pub fn new(client: Arc<dyn IndexClient>, index: impl Into<String>, doc_type: impl Into<String>) -> Self {
        Self {
            client,
            index: index.into(),
            doc_type: doc_type.into(),
        }
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn doc_type(&self) -> &str {
        &self.doc_type
    }

    /// Creates the index unless it already exists.
    pub async fn provision(&self) -> Result<(), ExportError> {
        if self.client.index_exists(&self.index).await? {
            info!("Index {} already exists", self.index);
            return Ok(());
        }

        self.client.create_index(&self.index).await?;
        info!("Created index {}", self.index);
        Ok(())
    }

    pub async fn export(&self, record: &Record) -> Result<(), ExportError> {
        let body: serde_json::Value = serde_json::to_value(record)?;
        self.client
            .index_document(&self.index, &self.doc_type, &body)
            .await
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
