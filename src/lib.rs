//! Radio ACK - acknowledged delivery over a half-duplex packet radio
//!
//! Turns a best-effort "send a packet, maybe it arrives" radio primitive into
//! a request/acknowledge primitive with bounded retries. Every send ends in
//! one of three outcomes: delivered, retries exhausted, or a hard error.
//!
//! # Layout
//! - [`contracts`]: wire format, framing and XOR checksum
//! - [`ack_manager`]: session state, send-and-wait retry loop, timeout poller
//! - [`receiver`]: inbound dispatcher with automatic ACK replies
//! - [`transmitter`]: collaborator traits (radio, clock, delay) and std impls
//! - [`config`]: configuration and statistics
//! - [`udp`]: a UDP-backed transceiver for host-side links
//!
//! Only one outbound DATA message may be unacknowledged at a time.

pub mod errors;
pub mod contracts;
pub mod config;
pub mod events;
pub mod transmitter;
pub mod receiver;
pub mod ack_manager;
pub mod udp;

pub use ack_manager::{AckManager, LinkState, Settlement};
pub use config::{AckConfig, AckStats};
pub use contracts::{Message, MessageType, Reply};
pub use errors::{AckError, FrameError, Result, UdpError};
pub use events::{Callbacks, EventSink};
pub use transmitter::{Clock, Delay, RadioMode, SystemClock, ThreadSleep, Transceiver};

/// Maximum payload size (in bytes) - one radio packet minus the header
pub const MAX_PAYLOAD_SIZE: usize = 200;

/// Fixed header size: type, id, payload length, checksum
pub const HEADER_SIZE: usize = 4;

/// Largest frame that can appear on the wire
pub const MAX_FRAME_SIZE: usize = HEADER_SIZE + MAX_PAYLOAD_SIZE;

/// ACK timeout duration in milliseconds
pub const ACK_TIMEOUT_MS: u32 = 2000;

/// Retries after the first attempt before a send is given up
pub const MAX_RETRANSMIT_ATTEMPTS: u8 = 3;

/// Yield interval of the send-and-wait loop in milliseconds
pub const POLL_INTERVAL_MS: u32 = 10;

/// Timeout handed to the radio for a single transmission
pub const TRANSMIT_TIMEOUT_MS: u32 = 1000;
