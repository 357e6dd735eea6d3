//! Construction of complete Ethernet frames.
//!
//! Used to replay known scanner probes through the pipeline and to feed the
//! decoder with well-formed traffic.

use std::net::{Ipv4Addr, Ipv6Addr};

use anyhow::Context;
use pnet::packet::{
    ethernet::{EtherType, EtherTypes, MutableEthernetPacket},
    ip::{IpNextHeaderProtocol, IpNextHeaderProtocols},
    ipv4::{self, MutableIpv4Packet},
    ipv6::MutableIpv6Packet,
    tcp::{self, MutableTcpPacket},
    udp::{self, MutableUdpPacket},
};
use pnet::util::MacAddr;

use badcapt_common::packet::tcp_flags;

use crate::decode::{ETH_HDR_LEN, IPV4_MIN_HDR_LEN, IPV6_HDR_LEN, TCP_MIN_HDR_LEN, UDP_HDR_LEN};

const SOURCE_MAC: MacAddr = MacAddr(0x02, 0x00, 0x00, 0x00, 0x00, 0x01);
const DESTINATION_MAC: MacAddr = MacAddr(0x02, 0x00, 0x00, 0x00, 0x00, 0x02);
const DEFAULT_TTL: u8 = 64;
const DEFAULT_WINDOW: u16 = 1024;

/// Fields of the IPv4 header that matter to a fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Header {
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    pub identification: u16,
    pub ttl: u8,
}

impl Ipv4Header {
    pub fn new(source: Ipv4Addr, destination: Ipv4Addr) -> Self {
        Self {
            source,
            destination,
            identification: 0,
            ttl: DEFAULT_TTL,
        }
    }

    pub fn with_identification(mut self, identification: u16) -> Self {
        self.identification = identification;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpHeader {
    pub source_port: u16,
    pub destination_port: u16,
    pub sequence: u32,
    pub acknowledgement: u32,
    pub flags: u8,
    pub window: u16,
}

impl TcpHeader {
    /// A bare SYN, the first packet of every half-open scan.
    pub fn syn(source_port: u16, destination_port: u16, sequence: u32) -> Self {
        Self {
            source_port,
            destination_port,
            sequence,
            acknowledgement: 0,
            flags: tcp_flags::SYN,
            window: DEFAULT_WINDOW,
        }
    }

    pub fn with_flags(mut self, flags: u8) -> Self {
        self.flags = flags;
        self
    }
}

/// Ethernet + IPv4 + TCP.
pub fn create_tcp_frame(ip: &Ipv4Header, tcp: &TcpHeader, payload: &[u8]) -> anyhow::Result<Vec<u8>> {
    let segment: Vec<u8> = create_tcp_segment(ip, tcp, payload)?;
    create_ipv4_frame(ip, IpNextHeaderProtocols::Tcp, &segment)
}

/// Ethernet + IPv4 + UDP.
pub fn create_udp_frame(
    ip: &Ipv4Header,
    src_port: u16,
    dst_port: u16,
    payload: &[u8],
) -> anyhow::Result<Vec<u8>> {
    let mut segment: Vec<u8> = create_udp_segment(src_port, dst_port, payload)?;
    {
        let mut udp: MutableUdpPacket =
            MutableUdpPacket::new(&mut segment).context("creating udp packet")?;
        let checksum: u16 = udp::ipv4_checksum(&udp.to_immutable(), &ip.source, &ip.destination);
        udp.set_checksum(checksum);
    }
    create_ipv4_frame(ip, IpNextHeaderProtocols::Udp, &segment)
}

/// Ethernet + IPv4 around an arbitrary upper-layer segment.
pub fn create_ipv4_frame(
    ip: &Ipv4Header,
    protocol: IpNextHeaderProtocol,
    segment: &[u8],
) -> anyhow::Result<Vec<u8>> {
    let ip_len: usize = IPV4_MIN_HDR_LEN + segment.len();
    let mut buffer: Vec<u8> = vec![0u8; ETH_HDR_LEN + ip_len];

    write_ethernet_header(&mut buffer, EtherTypes::Ipv4)?;
    {
        let mut pkt: MutableIpv4Packet =
            MutableIpv4Packet::new(&mut buffer[ETH_HDR_LEN..]).context("creating ipv4 packet")?;
        pkt.set_version(4);
        pkt.set_header_length(5);
        pkt.set_total_length(u16::try_from(ip_len).context("ipv4 packet exceeds 65535 bytes")?);
        pkt.set_identification(ip.identification);
        pkt.set_ttl(ip.ttl);
        pkt.set_next_level_protocol(protocol);
        pkt.set_source(ip.source);
        pkt.set_destination(ip.destination);
        pkt.set_payload(segment);
        let checksum: u16 = ipv4::checksum(&pkt.to_immutable());
        pkt.set_checksum(checksum);
    }

    Ok(buffer)
}

/// Ethernet + IPv6 + UDP.
pub fn create_ipv6_udp_frame(
    source: Ipv6Addr,
    destination: Ipv6Addr,
    src_port: u16,
    dst_port: u16,
    payload: &[u8],
) -> anyhow::Result<Vec<u8>> {
    let mut segment: Vec<u8> = create_udp_segment(src_port, dst_port, payload)?;
    {
        let mut udp: MutableUdpPacket =
            MutableUdpPacket::new(&mut segment).context("creating udp packet")?;
        let checksum: u16 = udp::ipv6_checksum(&udp.to_immutable(), &source, &destination);
        udp.set_checksum(checksum);
    }

    let mut buffer: Vec<u8> = vec![0u8; ETH_HDR_LEN + IPV6_HDR_LEN + segment.len()];
    write_ethernet_header(&mut buffer, EtherTypes::Ipv6)?;
    {
        let mut pkt: MutableIpv6Packet =
            MutableIpv6Packet::new(&mut buffer[ETH_HDR_LEN..]).context("creating ipv6 packet")?;
        pkt.set_version(6);
        pkt.set_payload_length(u16::try_from(segment.len()).context("ipv6 payload exceeds 65535 bytes")?);
        pkt.set_next_header(IpNextHeaderProtocols::Udp);
        pkt.set_hop_limit(DEFAULT_TTL);
        pkt.set_source(source);
        pkt.set_destination(destination);
        pkt.set_payload(&segment);
    }

    Ok(buffer)
}

fn write_ethernet_header(buffer: &mut [u8], ethertype: EtherType) -> anyhow::Result<()> {
    let mut eth: MutableEthernetPacket =
        MutableEthernetPacket::new(buffer).context("creating ethernet header")?;
    eth.set_source(SOURCE_MAC);
    eth.set_destination(DESTINATION_MAC);
    eth.set_ethertype(ethertype);
    Ok(())
}

fn create_tcp_segment(ip: &Ipv4Header, header: &TcpHeader, payload: &[u8]) -> anyhow::Result<Vec<u8>> {
    let mut buffer: Vec<u8> = vec![0u8; TCP_MIN_HDR_LEN + payload.len()];
    {
        let mut tcp: MutableTcpPacket =
            MutableTcpPacket::new(&mut buffer).context("creating tcp packet")?;
        tcp.set_source(header.source_port);
        tcp.set_destination(header.destination_port);
        tcp.set_sequence(header.sequence);
        tcp.set_acknowledgement(header.acknowledgement);
        tcp.set_data_offset(5);
        tcp.set_flags(header.flags);
        tcp.set_window(header.window);
        tcp.set_payload(payload);
        let checksum: u16 = tcp::ipv4_checksum(&tcp.to_immutable(), &ip.source, &ip.destination);
        tcp.set_checksum(checksum);
    }
    Ok(buffer)
}

fn create_udp_segment(src_port: u16, dst_port: u16, payload: &[u8]) -> anyhow::Result<Vec<u8>> {
    let total_len: usize = UDP_HDR_LEN + payload.len();
    let mut buffer: Vec<u8> = vec![0u8; total_len];
    {
        let mut udp: MutableUdpPacket =
            MutableUdpPacket::new(&mut buffer).context("creating udp packet")?;
        udp.set_source(src_port);
        udp.set_destination(dst_port);
        udp.set_length(u16::try_from(total_len).context("udp datagram exceeds 65535 bytes")?);
        udp.set_payload(payload);
    }
    Ok(buffer)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
