//! Packet capture abstraction and the capture loop.
//!
//! Provides a trait-based abstraction over packet capture to enable:
//! - Testing without real network interfaces
//! - Different capture backends

use std::fmt;
use std::io;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use pnet::datalink::{self, Channel, DataLinkReceiver, NetworkInterface};
use tracing::{debug, info, warn};

use super::frame::parse_udp;
use crate::error::{NetworkError, Result};

/// Consecutive read failures tolerated before the capture is declared dead.
const MAX_CONSECUTIVE_ERRORS: u32 = 32;

/// What a capture produced when asked for the next packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureEvent {
    /// A raw link-layer frame.
    Packet(Vec<u8>),
    /// Nothing arrived before the read timeout.
    Idle,
    /// The source has no more packets.
    Closed,
}

/// Trait for packet capture implementations.
pub trait PacketCapture: Send {
    /// Receive the next capture event.
    ///
    /// An error means the capture cannot continue.
    fn next_event(&mut self) -> Result<CaptureEvent>;
}

/// The frames delivered to the pipeline: UDP traffic on a single port.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureFilter {
    port: u16,
}

impl CaptureFilter {
    /// `udp and port 53`.
    pub const fn dns() -> Self {
        Self { port: 53 }
    }

    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Whether a frame is a UDP datagram from or to the filter port.
    pub fn matches(&self, frame: &[u8]) -> bool {
        matches!(
            parse_udp(frame),
            Ok(Some(datagram)) if datagram.source_port == self.port || datagram.dest_port == self.port
        )
    }
}

impl fmt::Display for CaptureFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "udp and port {}", self.port)
    }
}

/// Counters for one run of the capture loop.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CaptureStats {
    pub frames_seen: u64,
    pub frames_matched: u64,
}

/// Drive a capture until it closes, `running` is cleared, or `on_packet`
/// asks to stop.
///
/// Frames are handed to `on_packet` one at a time and are not retained.
pub fn run_capture<C, F>(
    capture: &mut C,
    filter: &CaptureFilter,
    running: &AtomicBool,
    mut on_packet: F,
) -> Result<CaptureStats>
where
    C: PacketCapture + ?Sized,
    F: FnMut(&[u8]) -> ControlFlow<()>,
{
    let mut stats = CaptureStats::default();

    while running.load(Ordering::SeqCst) {
        match capture.next_event()? {
            CaptureEvent::Packet(frame) => {
                stats.frames_seen += 1;
                if !filter.matches(&frame) {
                    continue;
                }
                stats.frames_matched += 1;
                if on_packet(&frame).is_break() {
                    debug!("packet handler requested capture stop");
                    break;
                }
            }
            CaptureEvent::Idle => {}
            CaptureEvent::Closed => {
                info!("Capture source closed");
                break;
            }
        }
    }

    Ok(stats)
}

/// Find the interface to capture on.
///
/// With a name, the interface must exist. Without one (or with an empty
/// name), returns the first interface that is:
/// - Up (active)
/// - Not a loopback interface
/// - Has at least one IP address
pub fn find_interface(name: Option<&str>) -> Result<NetworkInterface> {
    let interfaces = datalink::interfaces();

    match name.filter(|name| !name.is_empty()) {
        Some(name) => interfaces
            .into_iter()
            .find(|iface| iface.name == name)
            .ok_or_else(|| NetworkError::UnknownInterface(name.to_string()).into()),
        None => interfaces
            .into_iter()
            .find(|iface| iface.is_up() && !iface.is_loopback() && !iface.ips.is_empty())
            .ok_or_else(|| NetworkError::NoInterface.into()),
    }
}

/// Operator-facing message for a capture that could not be opened.
pub fn open_failure_message(interface: Option<&str>, err: &NetworkError) -> String {
    format!(
        "Cannot capture on {}: {err} (Make sure `interface` matches your network interface)",
        interface
            .filter(|name| !name.is_empty())
            .unwrap_or("the default interface")
    )
}

/// Production packet capture using pnet.
pub struct PnetCapture {
    interface: String,
    rx: Box<dyn DataLinkReceiver>,
    consecutive_errors: u32,
}

impl PnetCapture {
    /// Open a capture on the named interface, or the default one.
    pub fn open(name: Option<&str>, read_timeout: Duration) -> Result<Self> {
        let interface = find_interface(name)?;
        Self::new(&interface, read_timeout)
    }

    /// Create a new capture for the given interface.
    pub fn new(interface: &NetworkInterface, read_timeout: Duration) -> Result<Self> {
        let config = datalink::Config {
            read_timeout: Some(read_timeout),
            ..Default::default()
        };

        let rx = match datalink::channel(interface, config) {
            Ok(Channel::Ethernet(_tx, rx)) => rx,
            Ok(_) => return Err(NetworkError::UnsupportedChannel(interface.name.clone()).into()),
            Err(e) => {
                return Err(NetworkError::ChannelOpen {
                    interface: interface.name.clone(),
                    reason: e.to_string(),
                }
                .into());
            }
        };

        Ok(Self {
            interface: interface.name.clone(),
            rx,
            consecutive_errors: 0,
        })
    }

    pub fn interface_name(&self) -> &str {
        &self.interface
    }
}

impl PacketCapture for PnetCapture {
    fn next_event(&mut self) -> Result<CaptureEvent> {
        match self.rx.next() {
            Ok(frame) => {
                self.consecutive_errors = 0;
                Ok(CaptureEvent::Packet(frame.to_vec()))
            }
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                Ok(CaptureEvent::Idle)
            }
            Err(e) => {
                self.consecutive_errors += 1;
                if self.consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                    return Err(NetworkError::Capture(format!(
                        "{} consecutive read errors on {}, last: {e}",
                        self.consecutive_errors, self.interface
                    ))
                    .into());
                }
                warn!("Failed to read from {}: {e}", self.interface);
                Ok(CaptureEvent::Idle)
            }
        }
    }
}
