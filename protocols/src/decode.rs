//! Layer decoding of captured Ethernet frames.
//!
//! The decoder walks Ethernet (with optional 802.1Q tags), IPv4 or IPv6, and
//! TCP or UDP. Every header is validated against the bytes actually
//! captured before it is recorded; a truncated or inconsistent header stops
//! the walk and leaves that layer, and everything above it, absent.

use badcapt_common::packet::{
    CaptureInfo, Ipv4Layer, Ipv6Layer, Layers, Packet, TcpLayer, UdpLayer,
};
use pnet::packet::{
    ethernet::{EtherType, EtherTypes, EthernetPacket},
    ip::{IpNextHeaderProtocol, IpNextHeaderProtocols},
    ipv4::Ipv4Packet,
    ipv6::Ipv6Packet,
    tcp::TcpPacket,
    udp::UdpPacket,
    vlan::VlanPacket,
};
use tracing::trace;

pub const ETH_HDR_LEN: usize = 14;
pub const VLAN_HDR_LEN: usize = 4;
pub const IPV4_MIN_HDR_LEN: usize = 20;
pub const IPV6_HDR_LEN: usize = 40;
pub const TCP_MIN_HDR_LEN: usize = 20;
pub const UDP_HDR_LEN: usize = 8;

/// Decodes an Ethernet frame into a [`Packet`]. Never fails: whatever could
/// not be decoded is left out of the layer set.
pub fn decode_frame(frame: &[u8], metadata: CaptureInfo) -> Packet {
    let mut layers: Layers = Layers::default();

    match EthernetPacket::new(frame) {
        Some(eth) => decode_ethertype(eth.get_ethertype(), &frame[ETH_HDR_LEN..], &mut layers),
        None => trace!("frame of {} bytes is shorter than an Ethernet header", frame.len()),
    }

    Packet::new(metadata, layers)
}

fn decode_ethertype(ethertype: EtherType, bytes: &[u8], layers: &mut Layers) {
    match ethertype {
        EtherTypes::Ipv4 => decode_ipv4(bytes, layers),
        EtherTypes::Ipv6 => decode_ipv6(bytes, layers),
        EtherTypes::Vlan => {
            if let Some(vlan) = VlanPacket::new(bytes) {
                decode_ethertype(vlan.get_ethertype(), &bytes[VLAN_HDR_LEN..], layers);
            }
        }
        _ => {}
    }
}

fn decode_ipv4(bytes: &[u8], layers: &mut Layers) {
    let Some(ip) = Ipv4Packet::new(bytes) else {
        return;
    };
    let header_len: usize = ip.get_header_length() as usize * 4;
    if ip.get_version() != 4 || header_len < IPV4_MIN_HDR_LEN || header_len > bytes.len() {
        trace!("dropping malformed IPv4 header");
        return;
    }

    let protocol: IpNextHeaderProtocol = ip.get_next_level_protocol();
    layers.ipv4 = Some(Ipv4Layer {
        source: ip.get_source(),
        destination: ip.get_destination(),
        identification: ip.get_identification(),
        ttl: ip.get_ttl(),
        protocol: protocol.0,
    });

    // Only the first fragment carries the transport header.
    if ip.get_fragment_offset() != 0 {
        return;
    }

    // A zero total length shows up on segmentation-offloaded traffic.
    let total_len: usize = ip.get_total_length() as usize;
    let end: usize = if total_len < header_len {
        bytes.len()
    } else {
        total_len.min(bytes.len())
    };

    decode_transport(protocol, &bytes[header_len..end], layers);
}

fn decode_ipv6(bytes: &[u8], layers: &mut Layers) {
    let Some(ip) = Ipv6Packet::new(bytes) else {
        return;
    };
    if ip.get_version() != 6 {
        return;
    }

    let next_header: IpNextHeaderProtocol = ip.get_next_header();
    layers.ipv6 = Some(Ipv6Layer {
        source: ip.get_source(),
        destination: ip.get_destination(),
        next_header: next_header.0,
    });

    let payload_len: usize = ip.get_payload_length() as usize;
    let end: usize = if payload_len == 0 {
        bytes.len()
    } else {
        (IPV6_HDR_LEN + payload_len).min(bytes.len())
    };

    decode_transport(next_header, &bytes[IPV6_HDR_LEN..end], layers);
}

fn decode_transport(protocol: IpNextHeaderProtocol, segment: &[u8], layers: &mut Layers) {
    match protocol {
        IpNextHeaderProtocols::Tcp => decode_tcp(segment, layers),
        IpNextHeaderProtocols::Udp => decode_udp(segment, layers),
        _ => {}
    }
}

fn decode_tcp(segment: &[u8], layers: &mut Layers) {
    let Some(tcp) = TcpPacket::new(segment) else {
        return;
    };
    let offset: usize = tcp.get_data_offset() as usize * 4;
    if offset < TCP_MIN_HDR_LEN || offset > segment.len() {
        trace!("dropping TCP header with data offset {offset}");
        return;
    }

    layers.tcp = Some(TcpLayer {
        source_port: tcp.get_source(),
        destination_port: tcp.get_destination(),
        sequence: tcp.get_sequence(),
        acknowledgement: tcp.get_acknowledgement(),
        flags: tcp.get_flags(),
        window: tcp.get_window(),
    });
    layers.payload = non_empty(&segment[offset..]);
}

fn decode_udp(segment: &[u8], layers: &mut Layers) {
    let Some(udp) = UdpPacket::new(segment) else {
        return;
    };
    let length: usize = udp.get_length() as usize;
    let end: usize = if length < UDP_HDR_LEN {
        segment.len()
    } else {
        length.min(segment.len())
    };

    layers.udp = Some(UdpLayer {
        source_port: udp.get_source(),
        destination_port: udp.get_destination(),
        length: udp.get_length(),
    });
    layers.payload = non_empty(&segment[UDP_HDR_LEN..end]);
}

fn non_empty(bytes: &[u8]) -> Option<Vec<u8>> {
    if bytes.is_empty() {
        None
    } else {
        Some(bytes.to_vec())
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
