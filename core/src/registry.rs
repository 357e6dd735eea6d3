//! Ordered collection of markers applied to every captured packet.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use badcapt_common::packet::Packet;
use badcapt_markers::{Marker, SeriesMarker, default_markers};
use tracing::warn;

#[derive(Clone, Default)]
pub struct MarkerRegistry {
    markers: Vec<Arc<dyn Marker>>,
    series: Vec<Arc<dyn SeriesMarker>>,
}

impl MarkerRegistry {
    /// An empty registry: every packet comes out untagged.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in scanner fingerprints.
    pub fn with_defaults() -> Self {
        Self {
            markers: default_markers(),
            series: Vec::new(),
        }
    }

    pub fn register(&mut self, marker: Arc<dyn Marker>) {
        self.markers.push(marker);
    }

    pub fn register_series(&mut self, marker: Arc<dyn SeriesMarker>) {
        self.series.push(marker);
    }

    /// Runs every marker, single-packet ones first, and concatenates their
    /// tags in registration order.
    ///
    /// A marker that panics contributes no tags; the others still run.
    pub fn apply(&self, packet: &Packet) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();

        for marker in &self.markers {
            match panic::catch_unwind(AssertUnwindSafe(|| marker.mark(packet))) {
                Ok(found) => tags.extend(found),
                Err(_) => warn!("Marker {} panicked, ignoring its result", marker.name()),
            }
        }

        let series: &[Packet] = std::slice::from_ref(packet);
        for marker in &self.series {
            match panic::catch_unwind(AssertUnwindSafe(|| marker.mark(series))) {
                Ok(found) => tags.extend(found),
                Err(_) => warn!("Series marker {} panicked, ignoring its result", marker.name()),
            }
        }

        tags
    }

    pub fn len(&self) -> usize {
        self.markers.len() + self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty() && self.series.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.markers
            .iter()
            .map(|marker| marker.name().to_string())
            .chain(self.series.iter().map(|marker| marker.name().to_string()))
            .collect()
    }
}

impl std::fmt::Debug for MarkerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkerRegistry")
            .field("markers", &self.names())
            .finish()
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
