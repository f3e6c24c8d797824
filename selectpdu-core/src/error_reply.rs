//! Error replies
//!
//! When the unit cannot act on a request it answers with a fixed NACK frame
//! `FE 04 00 10 10 <code> <checksum> FF`. A reply equal to one of these is a
//! failed command, not data to interpret.

use std::fmt;

use crate::{
    command::{Command, Subcommand},
    frame::Frame,
};

/// NACK reasons reported by the unit
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorReply {
    BadCrc = 0x01,
    BadLength = 0x02,
    BadEscape = 0x03,
    PreviousCommandInvalid = 0x04,
    PreviousSubcommandInvalid = 0x05,
    PreviousByteCountInvalid = 0x06,
    DataBytesInvalid = 0x07,
    BadCredentials = 0x08,
    Unknown = 0x10,
    AccessDenied = 0x11,
}

impl ErrorReply {
    /// Every error reply the unit can send
    pub const ALL: [ErrorReply; 10] = [
        Self::BadCrc,
        Self::BadLength,
        Self::BadEscape,
        Self::PreviousCommandInvalid,
        Self::PreviousSubcommandInvalid,
        Self::PreviousByteCountInvalid,
        Self::DataBytesInvalid,
        Self::BadCredentials,
        Self::Unknown,
        Self::AccessDenied,
    ];

    /// Reason code carried in the frame payload
    pub fn code(self) -> u8 {
        self as u8
    }

    /// The exact frame the unit sends for this reason
    pub fn frame(self) -> [u8; 8] {
        let encoded = Frame {
            command: Command::Nack,
            subcommand: Subcommand::Response,
            payload: vec![self.code()].into(),
        }
        .encode();

        let mut frame = [0u8; 8];
        frame.copy_from_slice(&encoded);
        frame
    }

    /// Classify a reply that is byte-for-byte one of the error frames
    pub fn match_frame(reply: &[u8]) -> Option<Self> {
        if reply.len() != 8 {
            return None;
        }
        Self::ALL.into_iter().find(|e| e.frame().as_slice() == reply)
    }

    /// Human readable reason
    pub fn description(self) -> &'static str {
        match self {
            Self::BadCrc => "bad CRC",
            Self::BadLength => "bad length",
            Self::BadEscape => "bad escape sequence",
            Self::PreviousCommandInvalid => "previous command invalid",
            Self::PreviousSubcommandInvalid => "previous subcommand invalid",
            Self::PreviousByteCountInvalid => "previous byte count invalid",
            Self::DataBytesInvalid => "invalid data bytes",
            Self::BadCredentials => "bad credentials",
            Self::Unknown => "unknown error",
            Self::AccessDenied => "access denied",
        }
    }
}

impl fmt::Display for ErrorReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02X})", self.description(), self.code())
    }
}
