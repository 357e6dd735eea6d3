//! Sources of decoded packets.

use std::collections::VecDeque;

use badcapt_common::error::CaptureError;
use badcapt_common::packet::{CaptureInfo, Packet};
use badcapt_protocols::decode_frame;
use chrono::Utc;

mod live;

pub use live::LiveCapture;

/// A sequential reader of packets.
///
/// `Ok(None)` means the source is exhausted. [`CaptureError::Timeout`] and
/// [`CaptureError::Read`] are transient; the caller may keep reading.
pub trait PacketSource: Send {
    fn next_packet(&mut self) -> Result<Option<Packet>, CaptureError>;

    /// Releases the underlying handle. Called once the reader is done.
    fn close(&mut self) {}
}

/// Plays back a fixed sequence of packets and read errors, then ends.
#[derive(Debug, Default)]
pub struct ReplaySource {
    items: VecDeque<Result<Packet, CaptureError>>,
}

impl ReplaySource {
    pub fn new(packets: impl IntoIterator<Item = Packet>) -> Self {
        Self::scripted(packets.into_iter().map(Ok))
    }

    pub fn scripted(items: impl IntoIterator<Item = Result<Packet, CaptureError>>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }

    /// Decodes raw Ethernet frames, timestamped as they are decoded.
    pub fn from_frames<B: AsRef<[u8]>>(frames: impl IntoIterator<Item = B>) -> Self {
        Self::new(frames.into_iter().map(|frame| {
            let bytes: &[u8] = frame.as_ref();
            decode_frame(bytes, CaptureInfo::new(Utc::now(), bytes.len(), bytes.len()))
        }))
    }

    pub fn remaining(&self) -> usize {
        self.items.len()
    }
}

impl PacketSource for ReplaySource {
    fn next_packet(&mut self) -> Result<Option<Packet>, CaptureError> {
        self.items.pop_front().transpose()
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
