//! Defaults shared by the capture side and the export side.

use std::time::Duration;

/// Index the records are written to unless overridden.
pub const DEFAULT_INDEX_NAME: &str = "badcapt";

/// Document category (mapping type) used for every record.
pub const DEFAULT_DOC_TYPE: &str = "bcrecord";

pub const DEFAULT_ELASTIC_URL: &str = "http://localhost:9200";

/// Bytes kept from every frame.
pub const DEFAULT_SNAPLEN: usize = 1600;

pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(250);

/// Upper bound on classification tasks running at the same time.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 512;

/// Packets buffered between the reader and the dispatcher.
pub const DEFAULT_QUEUE_SIZE: usize = 4096;

/// How long in-flight tasks may keep running once a shutdown is requested.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Keys remembered by the hit suppressor when it is enabled.
pub const DEFAULT_SUPPRESS_CAPACITY: usize = 65_536;

/// Parameters used to open a live capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOptions {
    /// Maximum number of bytes kept from each frame.
    pub snaplen: usize,
    /// Puts the interface in promiscuous mode.
    pub promiscuous: bool,
    /// Read timeout of the underlying channel.
    ///
    /// A finite timeout lets the reader notice a stop request while the
    /// wire is quiet.
    pub read_timeout: Option<Duration>,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            snaplen: DEFAULT_SNAPLEN,
            promiscuous: true,
            read_timeout: Some(DEFAULT_READ_TIMEOUT),
        }
    }
}
