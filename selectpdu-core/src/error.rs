//! Error types for selectpdu-core

/// Result type alias for selectpdu operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Reply is too short for the offset being read
    #[error("Frame too short: expected at least {expected} bytes, got {actual} bytes")]
    FrameTooShort {
        expected: usize,
        actual: usize,
    },

    /// Checksum verification failed
    #[error("Checksum mismatch: expected 0x{expected:02X}, received 0x{received:02X}")]
    ChecksumMismatch {
        expected: u8,
        received: u8,
    },

    /// Unknown command code
    #[error("Unknown command code: 0x{0:02X}")]
    UnknownCommand(u8),

    /// Outlet slot outside the addressable range
    #[error("Invalid outlet slot: {0} (expected 1-16)")]
    InvalidSlot(u8),

    /// Outlet state that cannot be requested
    #[error("Invalid outlet state: {0}")]
    InvalidOutletState(u8),

    /// Invalid session state
    #[error("Invalid session state: {0}")]
    InvalidSessionState(String),

    /// Payload too large
    #[error("Payload too large: {size} bytes (max: {max} bytes)")]
    PayloadTooLarge {
        size: usize,
        max: usize,
    },
}

impl Error {
    /// Check if error stems from a malformed or unexpected reply
    pub fn is_malformed_reply(&self) -> bool {
        matches!(
            self,
            Self::FrameTooShort { .. } | Self::ChecksumMismatch { .. } | Self::UnknownCommand(_)
        )
    }

    /// Check if error requires reconnection
    pub fn requires_reconnect(&self) -> bool {
        matches!(self, Self::InvalidSessionState(_))
    }
}
