//! Network-related modules for packet capture and frame decoding.

pub(crate) mod capture;
pub(crate) mod frame;

pub use capture::{
    CaptureEvent, CaptureFilter, CaptureStats, PacketCapture, PnetCapture, find_interface,
    open_failure_message, run_capture,
};
pub use frame::{FrameError, UdpDatagram, parse_udp};
