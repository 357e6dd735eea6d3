//! Mirai and its forks seed every SYN with the target address as the TCP
//! sequence number.

use badcapt_common::packet::Packet;

use crate::Marker;

pub const TAG: &str = "mirai";

#[derive(Debug, Default, Clone, Copy)]
pub struct MiraiMarker;

impl Marker for MiraiMarker {
    fn mark(&self, packet: &Packet) -> Vec<String> {
        let (Some(ip), Some(tcp)) = (packet.ipv4(), packet.tcp()) else {
            return Vec::new();
        };

        if tcp.sequence == u32::from(ip.destination) {
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
