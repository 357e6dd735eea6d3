//! Classification of a single packet, from markers to export.

use std::sync::Arc;

use badcapt_common::packet::Packet;
use thiserror::Error;
use tracing::trace;

use crate::export::ExportError;
use crate::pipeline::Pipeline;
use crate::record::{Record, RecordError, TaggedPacket};
use crate::suppress::HitSuppressor;

/// What happened to a packet that went through the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No marker recognised the packet.
    Discarded,
    /// Every tag was already exported for this source within the window.
    Suppressed,
    /// Tagged, but not an IPv4 TCP/UDP packet.
    Unclassifiable,
    Exported,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    pipeline: Arc<Pipeline>,
}

impl Dispatcher {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub async fn handle(&self, packet: Packet) -> Result<Outcome, DispatchError> {
        let tags: Vec<String> = self.pipeline.registry().apply(&packet);
        if tags.is_empty() {
            return Ok(Outcome::Discarded);
        }

        let tagged: TaggedPacket = TaggedPacket::new(packet, tags);
        let mut record: Record = match Record::try_from(&tagged) {
            Ok(record) => record,
            Err(e) if e.is_unclassifiable() => {
                trace!("Dropping tagged packet {:?}: {e}", tagged.tags);
                return Ok(Outcome::Unclassifiable);
            }
            Err(e) => return Err(e.into()),
        };

        let suppressor: Option<&HitSuppressor> = self.pipeline.suppressor();
        if let Some(suppressor) = suppressor {
            record.tags = suppressor.filter(record.src_ip, record.tags);
            if record.tags.is_empty() {
                return Ok(Outcome::Suppressed);
            }
        }

        if let Err(e) = self.pipeline.backend().export(&record).await {
            if let Some(suppressor) = suppressor {
                suppressor.release(record.src_ip, &record.tags);
            }
            return Err(e.into());
        }
        Ok(Outcome::Exported)
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
