//! Request and response frame encoding.
//!
//! Request format:
//! - MAGIC (1 byte): 0xF2, anything else is dropped
//! - OPCODE (1 byte): command identifier
//! - PAYLOAD (200 bytes): opcode-specific data, zero padded
//!
//! Response format:
//! - SUCCESS (1 byte): 1 on success, 0 on failure
//! - OPCODE (1 byte): echo of the request opcode
//! - PAYLOAD (200 bytes): opcode-specific data, zero padded

use heapless::Vec;

use crate::text::write_str;

/// Magic byte identifying a command request
pub const COMMAND_MAGIC: u8 = 0xF2;

/// Payload size in bytes (requests and responses)
pub const PAYLOAD_SIZE: usize = 200;

/// Complete frame size (header + payload)
pub const FRAME_SIZE: usize = 2 + PAYLOAD_SIZE;

/// Errors that can occur during frame decoding or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Magic byte mismatch, frame must be dropped silently
    WrongMagic,
    /// Frame is shorter than its header
    Truncated,
    /// Payload exceeds the fixed payload size
    PayloadTooLarge,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// A command request sent by the companion app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Command identifier
    pub opcode: u8,
    /// Fixed-size payload
    pub payload: [u8; PAYLOAD_SIZE],
}

impl Request {
    /// Create a request with the given opcode and payload prefix
    pub fn new(opcode: u8, payload: &[u8]) -> Result<Self, FrameError> {
        if payload.len() > PAYLOAD_SIZE {
            return Err(FrameError::PayloadTooLarge);
        }

        let mut buf = [0u8; PAYLOAD_SIZE];
        buf[..payload.len()].copy_from_slice(payload);

        Ok(Self {
            opcode,
            payload: buf,
        })
    }

    /// Decode a request from raw characteristic bytes
    ///
    /// Short payloads are zero padded, excess bytes are ignored.
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < 2 {
            return Err(FrameError::Truncated);
        }
        if bytes[0] != COMMAND_MAGIC {
            return Err(FrameError::WrongMagic);
        }

        let body = &bytes[2..];
        let len = body.len().min(PAYLOAD_SIZE);
        let mut payload = [0u8; PAYLOAD_SIZE];
        payload[..len].copy_from_slice(&body[..len]);

        Ok(Self {
            opcode: bytes[1],
            payload,
        })
    }

    /// Encode this request into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        if buffer.len() < FRAME_SIZE {
            return Err(FrameError::BufferTooSmall);
        }

        buffer[0] = COMMAND_MAGIC;
        buffer[1] = self.opcode;
        buffer[2..FRAME_SIZE].copy_from_slice(&self.payload);

        Ok(FRAME_SIZE)
    }

    /// Encode this request into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, FRAME_SIZE>, FrameError> {
        let mut buffer = [0u8; FRAME_SIZE];
        let len = self.encode(&mut buffer)?;
        Vec::from_slice(&buffer[..len]).map_err(|_| FrameError::BufferTooSmall)
    }
}

/// A response returned to the companion app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Whether the command succeeded
    pub success: bool,
    /// Echo of the request opcode
    pub opcode: u8,
    /// Fixed-size payload
    pub payload: [u8; PAYLOAD_SIZE],
}

impl Response {
    /// Successful response carrying a string
    pub fn success(opcode: u8, text: &str) -> Self {
        Self::with_text(true, opcode, text)
    }

    /// Failed response carrying a reason string
    pub fn failure(opcode: u8, reason: &str) -> Self {
        Self::with_text(false, opcode, reason)
    }

    /// Response with an empty payload
    pub fn empty(success: bool, opcode: u8) -> Self {
        Self {
            success,
            opcode,
            payload: [0u8; PAYLOAD_SIZE],
        }
    }

    fn with_text(success: bool, opcode: u8, text: &str) -> Self {
        let mut payload = [0u8; PAYLOAD_SIZE];
        write_str(&mut payload, text);
        Self {
            success,
            opcode,
            payload,
        }
    }

    /// Read the payload as a null-terminated string
    pub fn text(&self) -> Option<&str> {
        crate::text::read_str(&self.payload).ok()
    }

    /// Decode a response from raw bytes
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < 2 {
            return Err(FrameError::Truncated);
        }

        let body = &bytes[2..];
        let len = body.len().min(PAYLOAD_SIZE);
        let mut payload = [0u8; PAYLOAD_SIZE];
        payload[..len].copy_from_slice(&body[..len]);

        Ok(Self {
            success: bytes[0] != 0,
            opcode: bytes[1],
            payload,
        })
    }

    /// Encode this response into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        if buffer.len() < FRAME_SIZE {
            return Err(FrameError::BufferTooSmall);
        }

        buffer[0] = self.success as u8;
        buffer[1] = self.opcode;
        buffer[2..FRAME_SIZE].copy_from_slice(&self.payload);

        Ok(FRAME_SIZE)
    }

    /// Encode this response into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, FRAME_SIZE>, FrameError> {
        let mut buffer = [0u8; FRAME_SIZE];
        let len = self.encode(&mut buffer)?;
        Vec::from_slice(&buffer[..len]).map_err(|_| FrameError::BufferTooSmall)
    }
}
