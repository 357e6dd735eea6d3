//! ZMap writes a constant IPv4 identification into every probe it sends,
//! whatever the probe module.

use badcapt_common::packet::Packet;

use crate::Marker;

pub const TAG: &str = "zmap";

/// IPv4 identification hard-coded in ZMap's packet templates.
pub const ZMAP_IP_ID: u16 = 54321;

#[derive(Debug, Default, Clone, Copy)]
pub struct ZmapMarker;

impl Marker for ZmapMarker {
    fn mark(&self, packet: &Packet) -> Vec<String> {
        match packet.ipv4() {
            Some(ip) if ip.identification == ZMAP_IP_ID => vec![TAG.to_string()],
            _ => Vec::new(),
        }
    }

    fn name(&self) -> &str {
        TAG
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
    use crate::tests::{tcp_packet, udp_packet};
    use badcapt_protocols::frame::{Ipv4Header, TcpHeader};
    use std::net::Ipv4Addr;

    fn header(id: u16) -> Ipv4Header {
        Ipv4Header::new(Ipv4Addr::new(192, 0, 2, 10), Ipv4Addr::new(198, 51, 100, 1))
            .with_identification(id)
    }

    #[test]
    fn mark_should_tag_zmap_tcp_probe() {
        let packet = tcp_packet(header(ZMAP_IP_ID), TcpHeader::syn(44321, 443, 99));
        assert_eq!(ZmapMarker.mark(&packet), vec![TAG]);
    }

    #[test]
    fn mark_should_tag_zmap_udp_probe() {
        assert_eq!(ZmapMarker.mark(&udp_packet(header(ZMAP_IP_ID), 44321, 161)), vec![TAG]);
    }

    #[test]
    fn mark_should_ignore_other_identifications() {
        let packet = tcp_packet(header(ZMAP_IP_ID - 1), TcpHeader::syn(44321, 443, 99));
        assert!(ZmapMarker.mark(&packet).is_empty());
    }
}
