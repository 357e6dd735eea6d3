//! # Export Backends
//!
//! A [`Backend`] is chosen once, when the pipeline is built, and every
//! record produced afterwards goes through it:
//!
//! - [`console::ConsoleExporter`] prints one JSON document per line.
//! - [`search_index::SearchIndexExporter`] indexes the document through an
//!   [`IndexClient`], provisioning the index beforehand.
//!
//! Exports are single best-effort writes: a failure is reported to the
//! caller and the record is gone.

use std::io;

use async_trait::async_trait;
use thiserror::Error;

use crate::record::Record;

pub mod console;
pub mod elastic;
pub mod search_index;

pub use console::ConsoleExporter;
pub use elastic::ElasticClient;
pub use search_index::SearchIndexExporter;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to serialize record")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write record")]
    Io(#[from] io::Error),

    #[error("search index answered {status}: {body}")]
    Index { status: u16, body: String },

    #[error("search index request failed")]
    Transport(#[from] reqwest::Error),
}

/// The calls the search-index backend needs from a document store.
#[async_trait]
pub trait IndexClient: Send + Sync {
    async fn index_exists(&self, name: &str) -> Result<bool, ExportError>;

    async fn create_index(&self, name: &str) -> Result<(), ExportError>;

    async fn index_document(
        &self,
        name: &str,
        category: &str,
        body: &serde_json::Value,
    ) -> Result<(), ExportError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Console,
    SearchIndex,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Console => write!(f, "console"),
            BackendKind::SearchIndex => write!(f, "search index"),
        }
    }
}

pub enum Backend {
    Console(ConsoleExporter),
    SearchIndex(SearchIndexExporter),
}

impl Backend {
    pub fn kind(&self) -> BackendKind {
        match self {
            Backend::Console(_) => BackendKind::Console,
            Backend::SearchIndex(_) => BackendKind::SearchIndex,
        }
    }

    /// One-time setup before the first export. Nothing to do for the console.
    pub async fn provision(&self) -> Result<(), ExportError> {
        match self {
            Backend::Console(_) => Ok(()),
            Backend::SearchIndex(exporter) => exporter.provision().await,
        }
    }

    pub async fn export(&self, record: &Record) -> Result<(), ExportError> {
        match self {
            Backend::Console(exporter) => exporter.export(record),
            Backend::SearchIndex(exporter) => exporter.export(record).await,
        }
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Console(_) => f.write_str("Backend::Console"),
            Backend::SearchIndex(exporter) => f
                .debug_struct("Backend::SearchIndex")
                .field("index", &exporter.index())
                .field("doc_type", &exporter.doc_type())
                .finish(),
        }
    }
}
