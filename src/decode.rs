//! Raw frame decoding into [`PacketRecord`]s.
//!
//! Walks Ethernet (with VLAN recursion) into IPv4/IPv6, then TCP/UDP, and
//! pulls out the addressing fields and application payload the aggregation
//! pipeline consumes. TCP payloads that open with a TLS handshake record get
//! a cipher-suite view attached.

use crate::error::FlowLensError;
use crate::packet::{PacketRecord, TransportProtocol};
use crate::tls;
use pnet::packet::{
    ethernet::{EtherType, EtherTypes, EthernetPacket},
    ip::{IpNextHeaderProtocol, IpNextHeaderProtocols},
    ipv4::{Ipv4Flags, Ipv4Packet},
    ipv6::Ipv6Packet,
    tcp::TcpPacket,
    udp::UdpPacket,
    vlan::VlanPacket,
    Packet,
};
use std::net::IpAddr;
use tracing::debug;

/// Decodes one captured Ethernet frame.
///
/// Frames this decoder cannot attribute (non-IP ethertypes, IPv4 fragments,
/// non-TCP/UDP transports, truncated headers) are errors here; the pipeline
/// maps them to the unknown-key sentinel so they are still counted.
pub fn decode_frame(frame: &[u8]) -> Result<PacketRecord, FlowLensError> {
    EthernetPacket::new(frame)
        .ok_or_else(|| FlowLensError::UnexpectedPacket("ethernet packet too short".to_string()))
        .and_then(|packet| visit_ethernet(packet.get_ethertype(), packet.payload()))
}

fn visit_ethernet(ether_type: EtherType, payload: &[u8]) -> Result<PacketRecord, FlowLensError> {
    match ether_type {
        EtherTypes::Vlan => VlanPacket::new(payload)
            .ok_or_else(|| FlowLensError::UnexpectedPacket("vlan packet too short".to_string()))
            .and_then(visit_vlan),

        EtherTypes::Ipv4 => Ipv4Packet::new(payload)
            .ok_or_else(|| FlowLensError::UnexpectedPacket("ipv4 packet too short".to_string()))
            .and_then(visit_ipv4),

        EtherTypes::Ipv6 => Ipv6Packet::new(payload)
            .ok_or_else(|| FlowLensError::UnexpectedPacket("ipv6 packet too short".to_string()))
            .and_then(visit_ipv6),

        ty => Err(FlowLensError::UnsupportedEthernetType(ty)),
    }
}

fn visit_vlan(packet: VlanPacket) -> Result<PacketRecord, FlowLensError> {
    visit_ethernet(packet.get_ethertype(), packet.payload())
}

fn visit_ipv4(packet: Ipv4Packet) -> Result<PacketRecord, FlowLensError> {
    if packet.get_fragment_offset() > 0
        || (packet.get_flags() & Ipv4Flags::MoreFragments) == Ipv4Flags::MoreFragments
    {
        return Err(FlowLensError::UnexpectedPacket(
            "ipv4 fragment".to_string(),
        ));
    }

    visit_transport(
        IpAddr::V4(packet.get_source()),
        IpAddr::V4(packet.get_destination()),
        packet.get_next_level_protocol(),
        packet.payload(),
    )
}

fn visit_ipv6(packet: Ipv6Packet) -> Result<PacketRecord, FlowLensError> {
    visit_transport(
        IpAddr::V6(packet.get_source()),
        IpAddr::V6(packet.get_destination()),
        packet.get_next_header(),
        packet.payload(),
    )
}

fn visit_transport(
    src: IpAddr,
    dst: IpAddr,
    protocol: IpNextHeaderProtocol,
    payload: &[u8],
) -> Result<PacketRecord, FlowLensError> {
    match protocol {
        IpNextHeaderProtocols::Tcp => TcpPacket::new(payload)
            .ok_or_else(|| FlowLensError::UnexpectedPacket("tcp packet too short".to_string()))
            .map(|tcp| visit_tcp(src, dst, tcp)),

        IpNextHeaderProtocols::Udp => UdpPacket::new(payload)
            .ok_or_else(|| FlowLensError::UnexpectedPacket("udp packet too short".to_string()))
            .map(|udp| visit_udp(src, dst, udp)),

        other => Err(FlowLensError::UnsupportedProtocol(format!(
            "non-TCP/UDP transport: {other}"
        ))),
    }
}

fn visit_tcp(src: IpAddr, dst: IpAddr, tcp: TcpPacket) -> PacketRecord {
    let payload = tcp.payload();
    let tls_view = if tls::looks_like_handshake(payload) {
        match tls::extract_handshake(payload) {
            Ok(view) => Some(view),
            Err(e) => {
                debug!("TLS-looking payload did not parse: {e}");
                None
            }
        }
    } else {
        None
    };

    PacketRecord {
        timestamp: None,
        src_addr: Some(src),
        dst_addr: Some(dst),
        src_port: Some(tcp.get_source()),
        dst_port: Some(tcp.get_destination()),
        transport: Some(TransportProtocol::Tcp),
        payload: Some(payload.to_vec()),
        tls: tls_view,
    }
}

fn visit_udp(src: IpAddr, dst: IpAddr, udp: UdpPacket) -> PacketRecord {
    PacketRecord {
        timestamp: None,
        src_addr: Some(src),
        dst_addr: Some(dst),
        src_port: Some(udp.get_source()),
        dst_port: Some(udp.get_destination()),
        transport: Some(TransportProtocol::Udp),
        payload: Some(udp.payload().to_vec()),
        tls: None,
    }
}
