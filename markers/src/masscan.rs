//! Masscan derives the IPv4 identification of its SYN probes from the
//! target, so replies can be matched without keeping state:
//! `id = (dst_ip ^ dst_port ^ seq) & 0xffff`.

use badcapt_common::packet::Packet;

use crate::Marker;

pub const TAG: &str = "masscan";

#[derive(Debug, Default, Clone, Copy)]
pub struct MasscanMarker;

/// The identification masscan would have put on a probe to `dst_ip:dst_port`
/// carrying sequence number `seq`.
pub fn expected_ip_id(dst_ip: u32, dst_port: u16, seq: u32) -> u16 {
    ((dst_ip ^ u32::from(dst_port) ^ seq) & 0xffff) as u16
}

impl Marker for MasscanMarker {
    fn mark(&self, packet: &Packet) -> Vec<String> {
        let (Some(ip), Some(tcp)) = (packet.ipv4(), packet.tcp()) else {
            return Vec::new();
        };
        if !tcp.is_syn() {
            return Vec::new();
        }

        let expected: u16 =
            expected_ip_id(u32::from(ip.destination), tcp.destination_port, tcp.sequence);
        if ip.identification == expected {
            vec![TAG.to_string()]
        } else {
            Vec::new()
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
    use crate::tests::tcp_packet;
    use badcapt_common::packet::tcp_flags;
    use badcapt_protocols::frame::{Ipv4Header, TcpHeader};
    use std::net::Ipv4Addr;

    const SOURCE: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 5);
    const TARGET: Ipv4Addr = Ipv4Addr::new(203, 0, 113, 9);
    const SEQ: u32 = 0x1234_5678;

    fn masscan_header() -> Ipv4Header {
        Ipv4Header::new(SOURCE, TARGET).with_identification(expected_ip_id(u32::from(TARGET), 23, SEQ))
    }

    #[test]
    fn expected_ip_id_should_fold_target_into_sixteen_bits() {
        // 0xcb007109 ^ 0x17 ^ 0x12345678 = 0xd9342766
        assert_eq!(expected_ip_id(u32::from(TARGET), 23, SEQ), 0x2766);
    }

    #[test]
    fn mark_should_tag_masscan_syn() {
        let packet = tcp_packet(masscan_header(), TcpHeader::syn(51413, 23, SEQ));
        assert_eq!(MasscanMarker.mark(&packet), vec![TAG]);
    }

    #[test]
    fn mark_should_ignore_non_syn_segments() {
        let tcp: TcpHeader = TcpHeader::syn(51413, 23, SEQ).with_flags(tcp_flags::SYN | tcp_flags::ACK);
        assert!(MasscanMarker.mark(&tcp_packet(masscan_header(), tcp)).is_empty());
    }

    #[test]
    fn mark_should_ignore_mismatched_identification() {
        let ip: Ipv4Header = masscan_header().with_identification(1);
        assert!(MasscanMarker.mark(&tcp_packet(ip, TcpHeader::syn(51413, 23, SEQ))).is_empty());
    }
}
