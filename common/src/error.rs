use std::io;

use thiserror::Error;

/// Failures of a packet source.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// No interface with that name exists on this host.
    #[error("interface {0} not found")]
    InterfaceNotFound(String),

    /// The interface opened, but does not deliver Ethernet frames.
    #[error("non-ethernet channel for {0}")]
    UnsupportedChannel(String),

    #[error("opening on {name}")]
    Open {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to read packet")]
    Read(#[source] io::Error),

    /// Nothing arrived before the read timeout expired.
    #[error("read timed out")]
    Timeout,

    #[error("failed to start the capture reader")]
    Reader(#[source] io::Error),
}

impl CaptureError {
    /// Whether the capture loop may keep reading after this error.
    pub fn is_transient(&self) -> bool {
        matches!(self, CaptureError::Read(_) | CaptureError::Timeout)
    }
}
