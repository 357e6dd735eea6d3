//! # Pipeline Configuration
//!
//! A [`Pipeline`] is everything a classification task needs: the markers,
//! the export backend, the naming of exported documents and the dispatch
//! limits. It is assembled once from an ordered list of [`BuildOption`]s and
//! never changes afterwards; tasks share it behind an `Arc`.
//!
//! ```ignore
//! let pipeline = Pipeline::build(vec![
//!     pipeline::set_elastic("http://localhost:9200"),
//!     pipeline::set_index_name("scanners"),
//! ])
//! .await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use badcapt_common::config::{DEFAULT_DOC_TYPE, DEFAULT_INDEX_NAME};
use badcapt_markers::{Marker, SeriesMarker};
use thiserror::Error;
use tracing::info;

use crate::export::{Backend, ConsoleExporter, ElasticClient, ExportError, IndexClient, SearchIndexExporter};
use crate::registry::MarkerRegistry;
use crate::sniffer::{Admission, DispatchLimits};
use crate::suppress::HitSuppressor;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("failed to provision the export backend")]
    Provisioning(#[source] ExportError),

    #[error("search index client: {0}")]
    Client(String),
}

/// Where records go. Resolved into a [`Backend`] once all options are applied,
/// so the naming options may come in any order.
pub enum Sink {
    Console(ConsoleExporter),
    SearchIndex(Arc<dyn IndexClient>),
}

/// Mutable state the options work on.
pub struct Settings {
    default_markers: bool,
    markers: Vec<Arc<dyn Marker>>,
    series: Vec<Arc<dyn SeriesMarker>>,
    sink: Sink,
    index_name: String,
    doc_type: String,
    limits: DispatchLimits,
    suppression: Option<(usize, Duration)>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_markers: true,
            markers: Vec::new(),
            series: Vec::new(),
            sink: Sink::Console(ConsoleExporter::stdout()),
            index_name: DEFAULT_INDEX_NAME.to_string(),
            doc_type: DEFAULT_DOC_TYPE.to_string(),
            limits: DispatchLimits::default(),
            suppression: None,
        }
    }
}

/// One configuration step. Options run in the order given; the first error
/// aborts the build.
pub type BuildOption = Box<dyn FnOnce(&mut Settings) -> Result<(), ConfigError> + Send>;

pub fn add_marker<M: Marker + 'static>(marker: M) -> BuildOption {
    Box::new(move |settings: &mut Settings| {
        settings.markers.push(Arc::new(marker));
        Ok(())
    })
}

pub fn add_series_marker<M: SeriesMarker + 'static>(marker: M) -> BuildOption {
    Box::new(move |settings: &mut Settings| {
        settings.series.push(Arc::new(marker));
        Ok(())
    })
}

/// Drops the built-in fingerprints; only markers added explicitly run.
pub fn without_default_markers() -> BuildOption {
    Box::new(|settings: &mut Settings| {
        settings.default_markers = false;
        Ok(())
    })
}

pub fn set_backend(sink: Sink) -> BuildOption {
    Box::new(move |settings: &mut Settings| {
        settings.sink = sink;
        Ok(())
    })
}

/// Exports to the Elasticsearch instance at `url`.
pub fn set_elastic(url: impl Into<String>) -> BuildOption {
    let url: String = url.into();
    Box::new(move |settings: &mut Settings| {
        let client: ElasticClient = ElasticClient::new(&url)?;
        settings.sink = Sink::SearchIndex(Arc::new(client));
        Ok(())
    })
}

pub fn set_index_name(name: impl Into<String>) -> BuildOption {
    let name: String = name.into();
    Box::new(move |settings: &mut Settings| {
        validate_index_name(&name)?;
        settings.index_name = name;
        Ok(())
    })
}

pub fn set_doc_type(name: impl Into<String>) -> BuildOption {
    let name: String = name.into();
    Box::new(move |settings: &mut Settings| {
        if name.trim().is_empty() || name.contains('/') {
            return Err(ConfigError::InvalidOption(format!("document type {name:?}")));
        }
        settings.doc_type = name;
        Ok(())
    })
}

pub fn set_max_in_flight(limit: usize) -> BuildOption {
    Box::new(move |settings: &mut Settings| {
        settings.limits.max_in_flight = non_zero("max in flight", limit)?;
        Ok(())
    })
}

pub fn set_queue_size(size: usize) -> BuildOption {
    Box::new(move |settings: &mut Settings| {
        settings.limits.queue_size = non_zero("queue size", size)?;
        Ok(())
    })
}

pub fn set_admission(admission: Admission) -> BuildOption {
    Box::new(move |settings: &mut Settings| {
        settings.limits.admission = admission;
        Ok(())
    })
}

pub fn set_grace_period(grace: Duration) -> BuildOption {
    Box::new(move |settings: &mut Settings| {
        settings.limits.grace_period = grace;
        Ok(())
    })
}

/// Lets each (source, tag) pair through at most once per `window`,
/// remembering up to `capacity` pairs.
pub fn set_suppression(capacity: usize, window: Duration) -> BuildOption {
    Box::new(move |settings: &mut Settings| {
        let capacity: usize = non_zero("suppression capacity", capacity)?;
        if window.is_zero() {
            return Err(ConfigError::InvalidOption("suppression window must be positive".to_string()));
        }
        settings.suppression = Some((capacity, window));
        Ok(())
    })
}

fn non_zero(what: &str, value: usize) -> Result<usize, ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidOption(format!("{what} must be positive")));
    }
    Ok(value)
}

fn validate_index_name(name: &str) -> Result<(), ConfigError> {
    const FORBIDDEN: &[char] = &['\\', '/', '*', '?', '"', '<', '>', '|', ' ', ',', '#', ':'];

    let invalid: bool = name.is_empty()
        || name.starts_with(['-', '_', '+'])
        || name.chars().any(|c| c.is_uppercase() || FORBIDDEN.contains(&c));
    if invalid {
        return Err(ConfigError::InvalidOption(format!("index name {name:?}")));
    }
    Ok(())
}

/// The immutable configuration shared by every classification task.
#[derive(Debug)]
pub struct Pipeline {
    registry: MarkerRegistry,
    backend: Backend,
    index_name: String,
    doc_type: String,
    limits: DispatchLimits,
    suppressor: Option<HitSuppressor>,
}

impl Pipeline {
    /// Applies `options` to the defaults, then provisions the backend.
    pub async fn build(options: Vec<BuildOption>) -> Result<Self, ConfigError> {
        let mut settings: Settings = Settings::default();
        for option in options {
            option(&mut settings)?;
        }

        let pipeline: Pipeline = Pipeline::from(settings);
        pipeline
            .backend
            .provision()
            .await
            .map_err(ConfigError::Provisioning)?;

        info!(
            "Pipeline ready: {} marker(s), exporting to {}",
            pipeline.registry.len(),
            pipeline.backend.kind()
        );
        Ok(pipeline)
    }

    pub fn registry(&self) -> &MarkerRegistry {
        &self.registry
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn doc_type(&self) -> &str {
        &self.doc_type
    }

    pub fn limits(&self) -> &DispatchLimits {
        &self.limits
    }

    pub fn suppressor(&self) -> Option<&HitSuppressor> {
        self.suppressor.as_ref()
    }
}

impl From<Settings> for Pipeline {
    fn from(settings: Settings) -> Self {
        let mut registry: MarkerRegistry = if settings.default_markers {
            MarkerRegistry::with_defaults()
        } else {
            MarkerRegistry::new()
        };
        for marker in settings.markers {
            registry.register(marker);
        }
        for marker in settings.series {
            registry.register_series(marker);
        }

        let backend: Backend = match settings.sink {
            Sink::Console(exporter) => Backend::Console(exporter),
            Sink::SearchIndex(client) => Backend::SearchIndex(SearchIndexExporter::new(
                client,
                settings.index_name.clone(),
                settings.doc_type.clone(),
            )),
        };

        Self {
            registry,
            backend,
            index_name: settings.index_name,
            doc_type: settings.doc_type,
            limits: settings.limits,
            suppressor: settings
                .suppression
                .map(|(capacity, window)| HitSuppressor::new(capacity, window)),
        }
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
