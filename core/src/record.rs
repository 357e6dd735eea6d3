//! The document exported for every packet a marker recognised.

use std::net::Ipv4Addr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use badcapt_common::packet::Packet;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use thiserror::Error;

/// A packet together with everything the markers had to say about it.
#[derive(Debug, Clone)]
pub struct TaggedPacket {
    pub packet: Packet,
    pub tags: Vec<String>,
}

impl TaggedPacket {
    pub fn new(packet: Packet, tags: Vec<String>) -> Self {
        Self { packet, tags }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Tcp,
    Udp,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("packet has no ipv4 layer")]
    UnsupportedNetworkLayer,

    #[error("packet has neither a tcp nor a udp layer")]
    UnsupportedTransport,

    #[error("packet carries no tags")]
    Untagged,
}

impl RecordError {
    /// The packet simply does not fit the record shape.
    pub fn is_unclassifiable(&self) -> bool {
        matches!(
            self,
            RecordError::UnsupportedNetworkLayer | RecordError::UnsupportedTransport
        )
    }
}

/// Normalised view of a tagged packet. Field order is the order of the
/// serialised document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub src_ip: Ipv4Addr,
    pub transport: Transport,
    pub src_port: u16,
    pub dst_ip: Ipv4Addr,
    pub dst_port: u16,
    #[serde(rename = "date")]
    pub timestamp: DateTime<Utc>,
    pub tags: Vec<String>,
    #[serde(serialize_with = "as_base64", skip_serializing_if = "Vec::is_empty")]
    pub payload: Vec<u8>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub payload_str: String,
}

impl TryFrom<&TaggedPacket> for Record {
    type Error = RecordError;

    fn try_from(tagged: &TaggedPacket) -> Result<Self, Self::Error> {
        if tagged.tags.is_empty() {
            return Err(RecordError::Untagged);
        }

        let packet: &Packet = &tagged.packet;
        let ip = packet.ipv4().ok_or(RecordError::UnsupportedNetworkLayer)?;

        let (transport, src_port, dst_port) = if let Some(tcp) = packet.tcp() {
            (Transport::Tcp, tcp.source_port, tcp.destination_port)
        } else if let Some(udp) = packet.udp() {
            (Transport::Udp, udp.source_port, udp.destination_port)
        } else {
            return Err(RecordError::UnsupportedTransport);
        };

        let payload: Vec<u8> = packet.payload().map(<[u8]>::to_vec).unwrap_or_default();
        let payload_str: String = String::from_utf8_lossy(&payload).into_owned();

        Ok(Record {
            src_ip: ip.source,
            transport,
            src_port,
            dst_ip: ip.destination,
            dst_port,
            timestamp: packet.metadata().timestamp,
            tags: tagged.tags.clone(),
            payload,
            payload_str,
        })
    }
}

fn as_base64<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(bytes))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
