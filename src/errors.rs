//! Error types for radio ACK operations
//!
//! [`FrameError`] covers framing problems, which the inbound path swallows
//! silently. [`AckError`] holds the outcomes a sender sees, and [`UdpError`]
//! the failures of the host-side UDP link.
use std::io;

use thiserror::Error;

use crate::transmitter::RadioMode;

/// Result type alias for radio ACK operations
pub type Result<T> = std::result::Result<T, AckError>;

/// Failure to build or parse a wire frame
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Buffer shorter than the fixed header
    #[error("Frame too short: required {required} bytes, available {available}")]
    TooShort { required: usize, available: usize },

    /// Declared payload length disagrees with the buffer length
    #[error("Invalid frame length: expected {expected} bytes, received {received}")]
    LengthMismatch { expected: usize, received: usize },

    /// Payload larger than a single radio packet can carry
    #[error("Payload too large: {len} bytes exceeds maximum of {max}")]
    PayloadTooLarge { len: usize, max: usize },

    /// Embedded checksum does not match the recomputed one
    #[error("Checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    /// Type byte is not DATA, ACK or NACK
    #[error("Unknown message type: {0:#04x}")]
    UnknownType(u8),

    /// ACK/NACK frame carrying payload bytes
    #[error("Control message carries {0} payload bytes")]
    ControlWithPayload(usize),
}

/// Send outcome other than success
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AckError {
    /// Rejected before any transmission was attempted
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] FrameError),

    /// Radio reported failure while transmitting; never retried
    #[error("Transmit error for message {msg_id}: {reason}")]
    TransmitError { msg_id: u8, reason: String },

    /// No matching ACK after every allowed attempt
    #[error("Retries exhausted for message {msg_id} after {attempts} attempts")]
    ExhaustedRetries { msg_id: u8, attempts: u32 },
}

/// Failure of the UDP link standing in for the radio
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UdpError {
    /// Asked to transmit while in the wrong mode
    #[error("Radio in {actual:?} mode, expected {expected:?}")]
    WrongMode { expected: RadioMode, actual: RadioMode },

    /// Socket error, or a datagram that could not be fully sent
    #[error("I/O error: {0}")]
    Io(String),
}

/// Convert from io::Error to UdpError
impl From<io::Error> for UdpError {
    fn from(err: io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
