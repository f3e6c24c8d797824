//! Select protocol frame encoding and bounds-checked reply decoding

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

use crate::{
    checksum,
    command::{Command, Subcommand},
    constants::{DESTINATION, ENVELOPE_SIZE, HEAD, LEN_OVERHEAD, MAX_PAYLOAD_SIZE, TAIL, offsets},
    error::{Error, Result},
};

/// Outbound protocol frame
///
/// # Frame Structure
///
/// ```text
/// ┌──────┬─────┬──────┬─────┬────────┬─────────┬──────────┬──────┐
/// │ HEAD │ LEN │ DEST │ CMD │ SUBCMD │ Payload │ Checksum │ TAIL │
/// │ 0xFE │  1  │ 0x00 │  1  │   1    │ N bytes │    1     │ 0xFF │
/// └──────┴─────┴──────┴─────┴────────┴─────────┴──────────┴──────┘
/// ```
///
/// LEN counts DEST through the last payload byte. The checksum is the sum of
/// every preceding byte masked with `0x7F`.
///
/// # Examples
///
/// ```
/// use selectpdu_core::{Command, Frame, Subcommand};
///
/// let frame = Frame::new(Command::Ping, Subcommand::Response);
/// assert_eq!(&frame.encode()[..], &[0xFE, 0x03, 0x00, 0x01, 0x10, 0x12, 0xFF]);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    /// Command code
    pub command: Command,

    /// Subcommand code
    pub subcommand: Subcommand,

    /// Command-specific data
    pub payload: Bytes,
}

impl Frame {
    /// Create a frame with empty payload
    pub fn new(command: Command, subcommand: Subcommand) -> Self {
        Self {
            command,
            subcommand,
            payload: Bytes::new(),
        }
    }

    /// Create a frame with payload
    ///
    /// # Errors
    ///
    /// Returns [`Error::PayloadTooLarge`] if LEN would not fit in one byte.
    pub fn with_payload(
        command: Command,
        subcommand: Subcommand,
        payload: impl Into<Bytes>,
    ) -> Result<Self> {
        let payload = payload.into();
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(Error::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD_SIZE,
            });
        }

        Ok(Self {
            command,
            subcommand,
            payload,
        })
    }

    /// Value of the LEN byte
    pub fn length(&self) -> u8 {
        // with_payload bounds the payload so this never truncates
        (LEN_OVERHEAD + self.payload.len()) as u8
    }

    /// Encode frame to bytes
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(self.size());

        buf.put_u8(HEAD);
        buf.put_u8(self.length());
        buf.put_u8(DESTINATION);
        buf.put_u8(self.command.into());
        buf.put_u8(self.subcommand.into());
        buf.put_slice(&self.payload);

        let checksum = checksum::calculate(&buf);
        buf.put_u8(checksum);
        buf.put_u8(TAIL);

        buf
    }

    /// Get total encoded size
    pub fn size(&self) -> usize {
        ENVELOPE_SIZE + self.payload.len()
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("command", &self.command)
            .field("subcommand", &self.subcommand)
            .field("payload", &hex::encode(&self.payload))
            .finish()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Frame[{}](sub=0x{:02X}, len={})",
            self.command,
            u8::from(self.subcommand),
            self.payload.len()
        )
    }
}

/// Inbound reply
///
/// Replies are interpreted at fixed offsets. Decoding never fails by itself;
/// every accessor checks the reply length first and returns
/// [`Error::FrameTooShort`] rather than reading past the end.
#[derive(Clone, PartialEq, Eq)]
pub struct Reply {
    raw: Bytes,
}

impl Reply {
    /// Wrap raw reply bytes
    pub fn decode(raw: impl Into<Bytes>) -> Self {
        Self { raw: raw.into() }
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Reply length in bytes
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Check if the reply is empty
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Byte at `offset` from HEAD
    pub fn byte(&self, offset: usize) -> Result<u8> {
        self.raw.get(offset).copied().ok_or(Error::FrameTooShort {
            expected: offset + 1,
            actual: self.raw.len(),
        })
    }

    /// Byte at `len - back`
    pub fn byte_from_end(&self, back: usize) -> Result<u8> {
        if back == 0 || back > self.raw.len() {
            return Err(Error::FrameTooShort {
                expected: back.max(1),
                actual: self.raw.len(),
            });
        }
        Ok(self.raw[self.raw.len() - back])
    }

    /// Bytes from `start` up to `trailer` bytes before the end
    pub fn slice(&self, start: usize, trailer: usize) -> Result<&[u8]> {
        if self.raw.len() < start + trailer {
            return Err(Error::FrameTooShort {
                expected: start + trailer,
                actual: self.raw.len(),
            });
        }
        Ok(&self.raw[start..self.raw.len() - trailer])
    }

    /// Echoed command code
    pub fn command_code(&self) -> Result<u8> {
        self.byte(offsets::COMMAND)
    }

    /// Echoed subcommand code
    pub fn subcommand_code(&self) -> Result<u8> {
        self.byte(offsets::SUBCOMMAND)
    }

    /// Echoed command, if it is a known one
    pub fn command(&self) -> Result<Command> {
        Command::try_from(self.command_code()?)
    }

    /// Verify the trailing checksum
    pub fn verify_checksum(&self) -> Result<()> {
        if self.raw.len() < offsets::TRAILER + 1 {
            return Err(Error::FrameTooShort {
                expected: offsets::TRAILER + 1,
                actual: self.raw.len(),
            });
        }
        let position = self.raw.len() - offsets::TRAILER;
        let expected = checksum::calculate(&self.raw[..position]);
        let received = self.raw[position];
        if expected != received {
            return Err(Error::ChecksumMismatch { expected, received });
        }
        Ok(())
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reply")
            .field("command", &self.command().ok())
            .field("raw", &hex::encode(&self.raw))
            .finish()
    }
}
