//! # Decoded Packet Model
//!
//! A [`Packet`] is a frame that went through layer decoding: every layer the
//! decoder recognised is available as a typed header, every layer it could
//! not decode is simply absent. Nothing in here ever refers back to the raw
//! frame, so a packet can be moved freely into a classification task.

use std::net::{Ipv4Addr, Ipv6Addr};

use chrono::{DateTime, Utc};

/// TCP control bits, as they appear in the flags byte of the header.
pub mod tcp_flags {
    pub const FIN: u8 = 0x01;
    pub const SYN: u8 = 0x02;
    pub const RST: u8 = 0x04;
    pub const PSH: u8 = 0x08;
    pub const ACK: u8 = 0x10;
    pub const URG: u8 = 0x20;
}

/// Metadata attached to a frame when it was read from the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureInfo {
    pub timestamp: DateTime<Utc>,
    /// Bytes actually captured (bounded by the snap length).
    pub capture_length: usize,
    /// Size of the frame on the wire.
    pub length: usize,
}

impl CaptureInfo {
    pub fn new(timestamp: DateTime<Utc>, capture_length: usize, length: usize) -> Self {
        Self {
            timestamp,
            capture_length,
            length,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Layer {
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    pub identification: u16,
    pub ttl: u8,
    /// Next level protocol number (6 for TCP, 17 for UDP, ...).
    pub protocol: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv6Layer {
    pub source: Ipv6Addr,
    pub destination: Ipv6Addr,
    pub next_header: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpLayer {
    pub source_port: u16,
    pub destination_port: u16,
    pub sequence: u32,
    pub acknowledgement: u32,
    pub flags: u8,
    pub window: u16,
}

impl TcpLayer {
    /// True when every bit of `mask` is set.
    pub fn has_flags(&self, mask: u8) -> bool {
        self.flags & mask == mask
    }

    /// A connection opener: SYN without ACK.
    pub fn is_syn(&self) -> bool {
        self.has_flags(tcp_flags::SYN) && !self.has_flags(tcp_flags::ACK)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpLayer {
    pub source_port: u16,
    pub destination_port: u16,
    pub length: u16,
}

/// The set of layers decoded out of one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layers {
    pub ipv4: Option<Ipv4Layer>,
    pub ipv6: Option<Ipv6Layer>,
    pub tcp: Option<TcpLayer>,
    pub udp: Option<UdpLayer>,
    /// Application payload carried by the transport segment, if any.
    pub payload: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    metadata: CaptureInfo,
    layers: Layers,
}

impl Packet {
    pub fn new(metadata: CaptureInfo, layers: Layers) -> Self {
        Self { metadata, layers }
    }

    pub fn metadata(&self) -> &CaptureInfo {
        &self.metadata
    }

    pub fn layers(&self) -> &Layers {
        &self.layers
    }

    pub fn ipv4(&self) -> Option<&Ipv4Layer> {
        self.layers.ipv4.as_ref()
    }

    pub fn ipv6(&self) -> Option<&Ipv6Layer> {
        self.layers.ipv6.as_ref()
    }

    pub fn tcp(&self) -> Option<&TcpLayer> {
        self.layers.tcp.as_ref()
    }

    pub fn udp(&self) -> Option<&UdpLayer> {
        self.layers.udp.as_ref()
    }

    /// Application payload, `None` when the segment carried no bytes.
    pub fn payload(&self) -> Option<&[u8]> {
        self.layers.payload.as_deref()
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

#[cfg(test)]
mod tests {
    use super::*;

    fn tcp_with_flags(flags: u8) -> TcpLayer {
        TcpLayer {
            source_port: 40000,
            destination_port: 80,
            sequence: 1,
            acknowledgement: 0,
            flags,
            window: 1024,
        }
    }

    #[test]
    fn is_syn_should_accept_bare_syn() {
        assert!(tcp_with_flags(tcp_flags::SYN).is_syn());
    }

    #[test]
    fn is_syn_should_reject_syn_ack() {
        assert!(!tcp_with_flags(tcp_flags::SYN | tcp_flags::ACK).is_syn());
    }

    #[test]
    fn payload_should_be_none_without_application_layer() {
        let info: CaptureInfo = CaptureInfo::new(Utc::now(), 54, 54);
        let packet: Packet = Packet::new(info, Layers::default());
        assert!(packet.payload().is_none());
        assert!(packet.ipv4().is_none());
        assert!(packet.tcp().is_none());
    }
}
