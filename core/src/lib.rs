//! # badcapt core
//!
//! Everything between the capture source and the export sink:
//!
//! - [`registry`] runs the markers over a packet.
//! - [`record`] turns a tagged packet into the exported document.
//! - [`export`] writes documents to the console or to a search index.
//! - [`dispatcher`] ties the three together for a single packet.
//! - [`sniffer`] reads packets and dispatches them concurrently.
//! - [`pipeline`] assembles the immutable configuration shared by all tasks.

pub mod capture;
pub mod dispatcher;
pub mod export;
pub mod pipeline;
pub mod record;
pub mod registry;
pub mod sniffer;
pub mod suppress;

pub use dispatcher::{DispatchError, Dispatcher, Outcome};
pub use pipeline::{BuildOption, ConfigError, Pipeline, Settings, Sink};
pub use sniffer::{Admission, CaptureStats, DispatchLimits, Sniffer};
