//! Ethernet frame decoding down to the UDP layer.

use pnet::packet::Packet;
use pnet::packet::ethernet::{EtherTypes, EthernetPacket};
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::ipv6::Ipv6Packet;
use pnet::packet::udp::UdpPacket;

/// A UDP datagram extracted from a captured frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UdpDatagram {
    pub source_port: u16,
    pub dest_port: u16,
    pub payload: Vec<u8>,
}

/// A frame whose headers end before they should.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("truncated {0} header")]
    Truncated(&'static str),
}

/// Extract the UDP datagram carried by an Ethernet frame.
///
/// Returns `Ok(None)` when the frame is not UDP over IPv4 or IPv6.
pub fn parse_udp(frame: &[u8]) -> Result<Option<UdpDatagram>, FrameError> {
    let ethernet = EthernetPacket::new(frame).ok_or(FrameError::Truncated("ethernet"))?;

    let transport = match ethernet.get_ethertype() {
        EtherTypes::Ipv4 => {
            let ipv4 = Ipv4Packet::new(ethernet.payload()).ok_or(FrameError::Truncated("ipv4"))?;
            if ipv4.get_next_level_protocol() != IpNextHeaderProtocols::Udp {
                return Ok(None);
            }
            ipv4.payload().to_vec()
        }
        EtherTypes::Ipv6 => {
            let ipv6 = Ipv6Packet::new(ethernet.payload()).ok_or(FrameError::Truncated("ipv6"))?;
            if ipv6.get_next_header() != IpNextHeaderProtocols::Udp {
                return Ok(None);
            }
            ipv6.payload().to_vec()
        }
        _ => return Ok(None),
    };

    let udp = UdpPacket::new(&transport).ok_or(FrameError::Truncated("udp"))?;

    Ok(Some(UdpDatagram {
        source_port: udp.get_source(),
        dest_port: udp.get_destination(),
        payload: udp.payload().to_vec(),
    }))
}
