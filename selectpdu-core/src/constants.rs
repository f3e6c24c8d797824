//! Protocol constants

/// First byte of every frame
pub const HEAD: u8 = 0xFE;

/// Last byte of every frame
pub const TAIL: u8 = 0xFF;

/// Destination byte (always the unit itself)
pub const DESTINATION: u8 = 0x00;

/// ASCII '0', used for the four-digit delay field
pub const ZERO_DELAY: u8 = 0x30;

/// Delay field sent with write and sequence commands ("0000")
pub const ZERO_DELAY_FIELD: [u8; 4] = [ZERO_DELAY; 4];

/// Bytes in the envelope that are not payload: HEAD, LEN, DEST, CMD, SUBCMD, CHECKSUM, TAIL
pub const ENVELOPE_SIZE: usize = 7;

/// Bytes counted by LEN that are not payload: DEST, CMD, SUBCMD
pub const LEN_OVERHEAD: usize = 3;

/// Largest payload whose LEN still fits in one byte
pub const MAX_PAYLOAD_SIZE: usize = u8::MAX as usize - LEN_OVERHEAD;

/// Checksum mask (sum of preceding bytes modulo 0x80)
pub const CHECKSUM_MASK: u8 = 0x7F;

/// Default connection timeout (milliseconds)
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5000;

/// Default read timeout (milliseconds)
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 5000;

/// Default window after a control action during which polling skips the device (milliseconds)
pub const DEFAULT_COOLDOWN_MS: u64 = 5000;

/// Slot status codes returned by the bulk outlet status query
pub mod slot_codes {
    /// Slot is not populated
    pub const ABSENT: u8 = 0x58;

    /// Outlet present and individually switchable ('C')
    pub const CONTROLLABLE: u8 = 0x43;

    /// Outlet present but not switchable ('N')
    pub const FIXED: u8 = 0x4E;
}

/// Reply offsets, counted from HEAD
pub mod offsets {
    /// Command echo
    pub const COMMAND: usize = 3;

    /// Subcommand echo
    pub const SUBCOMMAND: usize = 4;

    /// First payload byte
    pub const PAYLOAD: usize = 5;

    /// Outlet name text (after the echoed slot number)
    pub const OUTLET_NAME: usize = 6;

    /// Actual outlet state in a write acknowledgement
    pub const WRITE_STATE: usize = 6;

    /// Single outlet status, counted back from the end of the reply
    pub const OUTLET_STATUS_FROM_END: usize = 7;

    /// Checksum and tail
    pub const TRAILER: usize = 2;
}
