//! # Packet Markers
//!
//! A marker looks at a single decoded packet and names what it recognises
//! in it. Markers know nothing about each other, about previous packets,
//! or about where the tags end up; the pipeline runs all of them and
//! collects whatever they return.
//!
//! The built-in markers fingerprint well-known mass scanners by the header
//! fields their packet generators set:
//! - [`mirai::MiraiMarker`]: TCP sequence number equal to the target address.
//! - [`zmap::ZmapMarker`]: fixed IPv4 identification of 54321.
//! - [`masscan::MasscanMarker`]: IPv4 identification derived from target and sequence.

use std::sync::Arc;

use badcapt_common::packet::Packet;

pub mod masscan;
pub mod mirai;
pub mod zmap;

/// Classifies a single packet.
///
/// An empty result means the marker has no opinion about the packet.
pub trait Marker: Send + Sync {
    fn mark(&self, packet: &Packet) -> Vec<String>;

    /// Name used when the marker is reported in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Classifies a series of packets.
pub trait SeriesMarker: Send + Sync {
    fn mark(&self, packets: &[Packet]) -> Vec<String>;

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> Marker for F
where
    F: Fn(&Packet) -> Vec<String> + Send + Sync,
{
    fn mark(&self, packet: &Packet) -> Vec<String> {
        self(packet)
    }
}

impl<F> SeriesMarker for F
where
    F: Fn(&[Packet]) -> Vec<String> + Send + Sync,
{
    fn mark(&self, packets: &[Packet]) -> Vec<String> {
        self(packets)
    }
}

/// The scanner fingerprints every pipeline starts with.
pub fn default_markers() -> Vec<Arc<dyn Marker>> {
    vec![
        Arc::new(mirai::MiraiMarker),
        Arc::new(zmap::ZmapMarker),
        Arc::new(masscan::MasscanMarker),
    ]
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
