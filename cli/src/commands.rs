pub mod listen;

use std::time::Duration;

use badcapt_common::config::{
    CaptureOptions, DEFAULT_DOC_TYPE, DEFAULT_ELASTIC_URL, DEFAULT_GRACE_PERIOD, DEFAULT_INDEX_NAME,
    DEFAULT_MAX_IN_FLIGHT, DEFAULT_QUEUE_SIZE, DEFAULT_READ_TIMEOUT, DEFAULT_SNAPLEN,
    DEFAULT_SUPPRESS_CAPACITY,
};
use badcapt_core::pipeline::{self, BuildOption};
use badcapt_core::sniffer::Admission;
use clap::Parser;
use clap::builder::TypedValueParser;

#[derive(Parser, Debug)]
#[command(name = "badcapt", version)]
#[command(about = "Captures packets sent by known mass scanners and exports them.")]
pub struct CommandLine {
    /// Interface to capture on
    #[arg(short, long, env = "BADCAPT_IFACE")]
    pub iface: String,

    /// Elasticsearch URL records are indexed into
    #[arg(short, long, env = "BADCAPT_ELASTIC", default_value = DEFAULT_ELASTIC_URL)]
    pub elastic: String,

    /// Print records to stdout instead of indexing them
    #[arg(short, long, env = "BADCAPT_DEBUG")]
    pub debug: bool,

    /// Index the records are written to
    #[arg(long, env = "BADCAPT_INDEX", default_value = DEFAULT_INDEX_NAME)]
    pub index: String,

    /// Document type of every record
    #[arg(long, env = "BADCAPT_DOC_TYPE", default_value = DEFAULT_DOC_TYPE)]
    pub doc_type: String,

    /// Bytes kept from each frame
    #[arg(long, env = "BADCAPT_SNAPLEN", default_value_t = DEFAULT_SNAPLEN,
          value_parser = clap::value_parser!(u16).range(64..).map(usize::from))]
    pub snaplen: usize,

    /// Leave the interface out of promiscuous mode
    #[arg(long, env = "BADCAPT_NO_PROMISC")]
    pub no_promisc: bool,

    /// Classification tasks allowed to run at once
    #[arg(long, env = "BADCAPT_MAX_IN_FLIGHT", default_value_t = DEFAULT_MAX_IN_FLIGHT)]
    pub max_in_flight: usize,

    /// Packets buffered between the reader and the classifiers
    #[arg(long, env = "BADCAPT_QUEUE_SIZE", default_value_t = DEFAULT_QUEUE_SIZE)]
    pub queue_size: usize,

    /// Drop packets when the queue is full instead of pausing the capture
    #[arg(long, env = "BADCAPT_DROP_WHEN_FULL")]
    pub drop_when_full: bool,

    /// Milliseconds running tasks get to finish on shutdown
    #[arg(long, env = "BADCAPT_GRACE_MS", default_value_t = DEFAULT_GRACE_PERIOD.as_millis() as u64)]
    pub grace_ms: u64,

    /// Export each (source, tag) pair at most once per this many seconds
    #[arg(long, env = "BADCAPT_SUPPRESS_WINDOW_SECS")]
    pub suppress_window_secs: Option<u64>,

    /// Pairs remembered for suppression
    #[arg(long, env = "BADCAPT_SUPPRESS_CAPACITY", default_value_t = DEFAULT_SUPPRESS_CAPACITY)]
    pub suppress_capacity: usize,

    /// Enable debug logging
    #[arg(short, long, env = "BADCAPT_VERBOSE")]
    pub verbose: bool,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Pipeline options in the order they are applied.
    pub fn build_options(&self) -> Vec<BuildOption> {
        let mut options: Vec<BuildOption> = vec![
            pipeline::set_index_name(self.index.clone()),
            pipeline::set_doc_type(self.doc_type.clone()),
            pipeline::set_max_in_flight(self.max_in_flight),
            pipeline::set_queue_size(self.queue_size),
            pipeline::set_grace_period(Duration::from_millis(self.grace_ms)),
        ];

        if !self.debug {
            options.push(pipeline::set_elastic(self.elastic.clone()));
        }
        if self.drop_when_full {
            options.push(pipeline::set_admission(Admission::Drop));
        }
        if let Some(secs) = self.suppress_window_secs {
            options.push(pipeline::set_suppression(
                self.suppress_capacity,
                Duration::from_secs(secs),
            ));
        }

        options
    }

    pub fn capture_options(&self) -> CaptureOptions {
        CaptureOptions {
            snaplen: self.snaplen,
            promiscuous: !self.no_promisc,
            read_timeout: Some(DEFAULT_READ_TIMEOUT),
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
