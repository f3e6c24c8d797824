//! Command catalog
//!
//! Builders turn a logical operation into a [`Frame`]; parsers interpret the
//! unit's [`Reply`] at the offsets the protocol defines. Builders and parsers
//! are pure: no I/O happens here.

use tracing::debug;

use crate::{
    MAX_OUTLETS,
    command::{Command, Subcommand},
    constants::{ZERO_DELAY_FIELD, offsets, slot_codes},
    error::{Error, Result},
    frame::{Frame, Reply},
};

/// Login reply byte for accepted credentials
const LOGIN_ACCEPTED: u8 = 0x01;

/// Outlet state as carried in write requests and replies
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OutletState {
    Off = 0x00,
    On = 0x01,
    /// Power cycle (uses the delay field)
    Cycle = 0x02,
    /// Reported by the unit only
    NotControllable = 0x03,
}

impl OutletState {
    /// Wire code
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for OutletState {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x00 => Ok(Self::Off),
            0x01 => Ok(Self::On),
            0x02 => Ok(Self::Cycle),
            0x03 => Ok(Self::NotControllable),
            _ => Err(Error::InvalidOutletState(value)),
        }
    }
}

/// Direction of a power sequence
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SequenceDirection {
    Up = 0x01,
    Down = 0x03,
}

impl SequenceDirection {
    /// Wire code
    pub fn code(self) -> u8 {
        self as u8
    }

    /// State every controllable outlet ends up in
    pub fn target_state(self) -> OutletState {
        match self {
            Self::Up => OutletState::On,
            Self::Down => OutletState::Off,
        }
    }
}

/// Classification of one slot in the bulk status reply
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SlotStatus {
    Absent,
    Controllable,
    Fixed,
    Unclassified(u8),
}

impl From<u8> for SlotStatus {
    fn from(code: u8) -> Self {
        match code {
            slot_codes::ABSENT => Self::Absent,
            slot_codes::CONTROLLABLE => Self::Controllable,
            slot_codes::FIXED => Self::Fixed,
            other => Self::Unclassified(other),
        }
    }
}

/// Result of a login attempt
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Accepted,
    /// Rejected with the code the unit returned
    Rejected(u8),
}

fn check_slot(slot: u8) -> Result<u8> {
    if slot == 0 || slot > MAX_OUTLETS {
        return Err(Error::InvalidSlot(slot));
    }
    Ok(slot)
}

// Builders

/// Login with `username|password`
pub fn login(username: &str, password: &str) -> Result<Frame> {
    let credentials = format!("{}|{}", username, password);
    Frame::with_payload(Command::Login, Subcommand::Set, credentials.into_bytes())
}

/// Keep-alive check
pub fn ping() -> Frame {
    Frame::new(Command::Ping, Subcommand::Response)
}

/// Status codes of every outlet slot
pub fn bulk_outlet_status() -> Frame {
    Frame::new(Command::BulkOutletStatus, Subcommand::Get)
}

/// Name of one outlet
pub fn outlet_name(slot: u8) -> Result<Frame> {
    Frame::with_payload(Command::OutletName, Subcommand::Get, vec![check_slot(slot)?])
}

/// On/off state of one outlet
pub fn outlet_status(slot: u8) -> Result<Frame> {
    Frame::with_payload(Command::PowerOutlet, Subcommand::Get, vec![check_slot(slot)?])
}

/// Switch one outlet
///
/// [`OutletState::NotControllable`] only appears in replies and is rejected.
pub fn write_outlet(slot: u8, state: OutletState) -> Result<Frame> {
    if state == OutletState::NotControllable {
        return Err(Error::InvalidOutletState(state.code()));
    }

    let mut payload = vec![check_slot(slot)?, state.code()];
    payload.extend_from_slice(&ZERO_DELAY_FIELD);
    Frame::with_payload(Command::PowerOutlet, Subcommand::Set, payload)
}

/// Start an on/off sequence across all controllable outlets
pub fn start_sequence(direction: SequenceDirection) -> Frame {
    let mut payload = vec![direction.code()];
    payload.extend_from_slice(&ZERO_DELAY_FIELD);
    Frame {
        command: Command::PowerSequence,
        subcommand: Subcommand::Set,
        payload: payload.into(),
    }
}

// Parsers

/// Interpret a login reply
pub fn parse_login(reply: &Reply) -> Result<LoginOutcome> {
    match reply.byte(offsets::PAYLOAD)? {
        LOGIN_ACCEPTED => Ok(LoginOutcome::Accepted),
        code => Ok(LoginOutcome::Rejected(code)),
    }
}

/// Interpret a ping reply: the unit answers with its own ping (`01 01`)
pub fn parse_ping(reply: &Reply) -> Result<bool> {
    Ok(reply.command_code()? == Command::Ping.code()
        && reply.subcommand_code()? == Subcommand::Set.code())
}

/// Interpret a bulk status reply, one entry per slot starting at slot 1
pub fn parse_bulk_status(reply: &Reply) -> Result<Vec<SlotStatus>> {
    let codes = reply.slice(offsets::PAYLOAD, offsets::TRAILER)?;
    Ok(codes.iter().copied().map(SlotStatus::from).collect())
}

/// Interpret an outlet name reply
///
/// A reply that does not echo the name command yields an empty name.
pub fn parse_outlet_name(reply: &Reply) -> Result<String> {
    let command = reply.command_code()?;
    if command != Command::OutletName.code() {
        debug!(
            "Invalid outlet name reply: expected command 0x{:02X}, got 0x{:02X}",
            Command::OutletName.code(),
            command
        );
        return Ok(String::new());
    }

    let raw = reply.slice(offsets::OUTLET_NAME, offsets::TRAILER)?;
    Ok(sanitize_outlet_name(&String::from_utf8_lossy(raw)))
}

/// Interpret a single outlet status reply, `true` when the outlet is on
pub fn parse_outlet_status(reply: &Reply) -> Result<bool> {
    let status = reply.byte_from_end(offsets::OUTLET_STATUS_FROM_END)?;
    Ok(status == OutletState::On.code())
}

/// Interpret a write acknowledgement, returning the state the outlet is now in
///
/// Without an acknowledgement the requested state is assumed.
pub fn parse_write_outlet(reply: &Reply, requested: OutletState) -> Result<u8> {
    if reply.subcommand_code()? == Subcommand::Response.code() {
        reply.byte(offsets::WRITE_STATE)
    } else {
        Ok(requested.code())
    }
}

/// Interpret a sequence reply
pub fn parse_sequence(reply: &Reply) -> Result<bool> {
    Ok(reply.byte(offsets::PAYLOAD)? != 0x00)
}

/// Keep only `[A-Za-z0-9()[]]` from an outlet name
pub fn sanitize_outlet_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '(' | ')' | '[' | ']'))
        .collect()
}
