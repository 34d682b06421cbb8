//! Wire format for the radio ACK protocol
//!
//! Every frame is a 4-byte header followed by up to [`MAX_PAYLOAD_SIZE`]
//! payload bytes:
//!
//! ```text
//! byte 0: msg_type    (1 = DATA, 2 = ACK, 3 = NACK)
//! byte 1: msg_id      (0-255)
//! byte 2: payload_len (0-200)
//! byte 3: checksum    (XOR of every other byte of the frame)
//! bytes 4..: payload
//! ```
//!
//! Frames are built and parsed field by field. Nothing here depends on the
//! in-memory layout of [`Message`].
use crate::errors::FrameError;
use crate::{HEADER_SIZE, MAX_PAYLOAD_SIZE};

const TYPE_OFFSET: usize = 0;
const ID_OFFSET: usize = 1;
const LEN_OFFSET: usize = 2;
const CHECKSUM_OFFSET: usize = 3;

/// Message type carried in the first header byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// Application payload, answered with an ACK
    Data = 0x01,
    /// Positive acknowledgment of a DATA id
    Ack = 0x02,
    /// Negative acknowledgment of a DATA id
    Nack = 0x03,
}

impl MessageType {
    /// Wire value of this type
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for MessageType {
    type Error = FrameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(Self::Data),
            0x02 => Ok(Self::Ack),
            0x03 => Ok(Self::Nack),
            other => Err(FrameError::UnknownType(other)),
        }
    }
}

/// Control replies a receiver can send back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reply {
    Ack,
    Nack,
}

impl From<Reply> for MessageType {
    fn from(reply: Reply) -> Self {
        match reply {
            Reply::Ack => MessageType::Ack,
            Reply::Nack => MessageType::Nack,
        }
    }
}

/// A decoded protocol message
///
/// Messages are transient: they exist only for the duration of the call that
/// builds or consumes them. The checksum is not stored; it is derived on
/// encode and verified on decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    kind: MessageType,
    id: u8,
    payload: Vec<u8>,
}

impl Message {
    /// Create a DATA message
    ///
    /// # Errors
    /// Returns `FrameError::PayloadTooLarge` if the payload exceeds
    /// [`MAX_PAYLOAD_SIZE`].
    pub fn data(id: u8, payload: &[u8]) -> Result<Self, FrameError> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(FrameError::PayloadTooLarge {
                len: payload.len(),
                max: MAX_PAYLOAD_SIZE,
            });
        }

        Ok(Self {
            kind: MessageType::Data,
            id,
            payload: payload.to_vec(),
        })
    }

    /// Create an ACK or NACK message
    pub fn control(reply: Reply, id: u8) -> Self {
        Self {
            kind: reply.into(),
            id,
            payload: Vec::new(),
        }
    }

    pub fn kind(&self) -> MessageType {
        self.kind
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Checksum this message carries on the wire
    pub fn checksum(&self) -> u8 {
        header_checksum(self.kind, self.id, self.payload.len() as u8) ^ checksum(&self.payload)
    }

    /// Size of the encoded frame in bytes
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// Serialize to the wire layout
    pub fn encode(&self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(self.encoded_len());
        frame.push(self.kind.as_byte());
        frame.push(self.id);
        frame.push(self.payload.len() as u8);
        frame.push(self.checksum());
        frame.extend_from_slice(&self.payload);
        frame
    }

    /// Parse a received frame
    ///
    /// # Errors
    /// - `TooShort` if fewer than [`HEADER_SIZE`] bytes are present
    /// - `PayloadTooLarge` / `LengthMismatch` if the length byte is out of
    ///   range or disagrees with the buffer
    /// - `ChecksumMismatch` if the embedded checksum is wrong
    /// - `UnknownType` / `ControlWithPayload` for structurally foreign frames
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < HEADER_SIZE {
            return Err(FrameError::TooShort {
                required: HEADER_SIZE,
                available: bytes.len(),
            });
        }

        let payload_len = bytes[LEN_OFFSET] as usize;
        if payload_len > MAX_PAYLOAD_SIZE {
            return Err(FrameError::PayloadTooLarge {
                len: payload_len,
                max: MAX_PAYLOAD_SIZE,
            });
        }
        if bytes.len() != HEADER_SIZE + payload_len {
            return Err(FrameError::LengthMismatch {
                expected: HEADER_SIZE + payload_len,
                received: bytes.len(),
            });
        }

        // Everything except the checksum byte itself.
        let expected = checksum(&bytes[..CHECKSUM_OFFSET]) ^ checksum(&bytes[HEADER_SIZE..]);
        let actual = bytes[CHECKSUM_OFFSET];
        if expected != actual {
            return Err(FrameError::ChecksumMismatch { expected, actual });
        }

        let kind = MessageType::try_from(bytes[TYPE_OFFSET])?;
        if kind != MessageType::Data && payload_len > 0 {
            return Err(FrameError::ControlWithPayload(payload_len));
        }

        Ok(Self {
            kind,
            id: bytes[ID_OFFSET],
            payload: bytes[HEADER_SIZE..].to_vec(),
        })
    }
}

/// XOR-fold all bytes; zero-length input yields 0
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}

fn header_checksum(kind: MessageType, id: u8, payload_len: u8) -> u8 {
    kind.as_byte() ^ id ^ payload_len
}

/// Encode a DATA frame
///
/// Fails without producing a partial frame if the payload is oversized.
pub fn encode_data(id: u8, payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    Message::data(id, payload).map(|msg| msg.encode())
}

/// Encode an ACK or NACK frame
pub fn encode_control(reply: Reply, id: u8) -> Vec<u8> {
    Message::control(reply, id).encode()
}

/// Decode a frame, see [`Message::decode`]
pub fn decode(bytes: &[u8]) -> Result<Message, FrameError> {
    Message::decode(bytes)
}
