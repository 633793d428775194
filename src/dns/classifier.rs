//! Classification of captured frames into DNS resolutions.
//!
//! A frame is relevant when it is a UDP datagram sent from port 53 carrying a
//! DNS response with at least one answer whose data is an IPv4 address. The
//! query name of such a response together with that address forms a
//! [`Resolution`]; everything else is ignored with a reason, or rejected with
//! a [`ClassifyError`] when it cannot be decoded at all.

use hickory_proto::op::{Message, MessageType};
use hickory_proto::serialize::binary::BinDecodable;
use tracing::{error, trace};

use super::{DomainName, ResolvedAddress};
use crate::metrics::PACKETS_TOTAL;
use crate::network::{FrameError, parse_udp};

/// Source port of DNS server replies.
pub const DNS_PORT: u16 = 53;

/// A domain name together with the address a DNS server answered for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub domain: DomainName,
    pub address: ResolvedAddress,
}

/// Why a well-formed frame is not a scan target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Not a UDP datagram over IPv4 or IPv6.
    NotUdp,
    /// UDP, but not sent by a DNS server or not a DNS response.
    NotDnsResponse,
    /// A DNS response without answer records.
    NoAnswer,
    /// The query name contains `in-addr`.
    ReverseLookup,
    /// The first answer is not an IPv4 address (CNAME, AAAA, ...).
    NotIpv4,
}

impl IgnoreReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotUdp => "not_udp",
            Self::NotDnsResponse => "not_dns_response",
            Self::NoAnswer => "no_answer",
            Self::ReverseLookup => "reverse_lookup",
            Self::NotIpv4 => "not_ipv4",
        }
    }
}

/// Outcome of inspecting a decodable frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Resolution(Resolution),
    Ignored(IgnoreReason),
}

/// A frame that looked like a DNS response but could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("truncated {0} header")]
    Truncated(&'static str),

    #[error("failed to decode DNS message: {0}")]
    Decode(String),

    #[error("DNS response has no question section")]
    MissingQuestion,
}

impl From<FrameError> for ClassifyError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::Truncated(layer) => Self::Truncated(layer),
        }
    }
}

/// Inspect a captured Ethernet frame.
pub fn inspect(frame: &[u8]) -> Result<Verdict, ClassifyError> {
    let Some(datagram) = parse_udp(frame)? else {
        return Ok(Verdict::Ignored(IgnoreReason::NotUdp));
    };

    if datagram.source_port != DNS_PORT {
        return Ok(Verdict::Ignored(IgnoreReason::NotDnsResponse));
    }

    inspect_message(&datagram.payload)
}

/// Inspect the DNS payload of a datagram sent from port 53.
pub fn inspect_message(payload: &[u8]) -> Result<Verdict, ClassifyError> {
    let message = Message::from_bytes(payload).map_err(|e| ClassifyError::Decode(e.to_string()))?;

    if message.message_type() != MessageType::Response {
        return Ok(Verdict::Ignored(IgnoreReason::NotDnsResponse));
    }

    let Some(answer) = message.answers().first() else {
        return Ok(Verdict::Ignored(IgnoreReason::NoAnswer));
    };

    let query = message
        .queries()
        .first()
        .ok_or(ClassifyError::MissingQuestion)?;

    let domain = DomainName::new(query.name().to_ascii());
    let candidate = answer.data().to_string();

    if domain.is_reverse_lookup() {
        return Ok(Verdict::Ignored(IgnoreReason::ReverseLookup));
    }

    let Some(address) = ResolvedAddress::parse(&candidate) else {
        return Ok(Verdict::Ignored(IgnoreReason::NotIpv4));
    };

    Ok(Verdict::Resolution(Resolution { domain, address }))
}

/// Classify a frame, swallowing decode errors.
///
/// Malformed frames are logged and reported as not relevant so a single bad
/// packet never stops the capture loop.
pub fn classify(frame: &[u8]) -> Option<Resolution> {
    match inspect(frame) {
        Ok(Verdict::Resolution(resolution)) => {
            metrics::counter!(PACKETS_TOTAL, "outcome" => "resolution").increment(1);
            Some(resolution)
        }
        Ok(Verdict::Ignored(reason)) => {
            trace!(reason = reason.as_str(), "packet ignored");
            metrics::counter!(PACKETS_TOTAL, "outcome" => reason.as_str()).increment(1);
            None
        }
        Err(err) => {
            error!("Skipping malformed packet: {err}");
            metrics::counter!(PACKETS_TOTAL, "outcome" => "malformed").increment(1);
            None
        }
    }
}
