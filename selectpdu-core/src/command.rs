//! Select protocol command and subcommand codes

use std::fmt;

use crate::error::{Error, Result};

/// Protocol command codes
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    /// Keep-alive check (sent by either side)
    Ping = 0x01,

    /// Username/password login
    Login = 0x02,

    /// Error reply from the unit
    Nack = 0x10,

    /// Single power outlet state (read with `Get`, write with `Set`)
    PowerOutlet = 0x20,

    /// Outlet name
    OutletName = 0x21,

    /// Status codes of every outlet slot
    BulkOutletStatus = 0x22,

    /// Mass on/off sequencing
    PowerSequence = 0x36,
}

impl Command {
    /// Wire code
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Get command name
    pub fn name(self) -> &'static str {
        match self {
            Self::Ping => "PING",
            Self::Login => "LOGIN",
            Self::Nack => "NACK",
            Self::PowerOutlet => "POWER_OUTLET",
            Self::OutletName => "OUTLET_NAME",
            Self::BulkOutletStatus => "BULK_OUTLET_STATUS",
            Self::PowerSequence => "POWER_SEQUENCE",
        }
    }
}

impl From<Command> for u8 {
    fn from(cmd: Command) -> u8 {
        cmd as u8
    }
}

impl TryFrom<u8> for Command {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x01 => Ok(Self::Ping),
            0x02 => Ok(Self::Login),
            0x10 => Ok(Self::Nack),
            0x20 => Ok(Self::PowerOutlet),
            0x21 => Ok(Self::OutletName),
            0x22 => Ok(Self::BulkOutletStatus),
            0x36 => Ok(Self::PowerSequence),
            _ => Err(Error::UnknownCommand(value)),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02X})", self.name(), *self as u8)
    }
}

/// Subcommand codes
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Subcommand {
    Set = 0x01,
    Get = 0x02,
    /// Reply to a request from the other side
    Response = 0x10,
}

impl Subcommand {
    /// Wire code
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl From<Subcommand> for u8 {
    fn from(sub: Subcommand) -> u8 {
        sub as u8
    }
}
