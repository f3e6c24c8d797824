//! # selectpdu-core
//!
//! Core protocol implementation for Middle Atlantic Select power distribution units.
//!
//! This crate provides the low-level protocol primitives:
//! - Frame structure and encoding, bounds-checked reply decoding
//! - Checksum calculation
//! - Command codes and the command catalog
//! - Device error replies
//! - Session state

pub mod catalog;
pub mod checksum;
pub mod command;
pub mod constants;
pub mod error;
pub mod error_reply;
pub mod frame;
pub mod session;

pub use catalog::{LoginOutcome, OutletState, SequenceDirection, SlotStatus};
pub use command::{Command, Subcommand};
pub use error::{Error, Result};
pub use error_reply::ErrorReply;
pub use frame::{Frame, Reply};
pub use session::{Session, SessionState};

/// Default device control port
pub const DEFAULT_PORT: u16 = 60000;

/// Number of power outlet slots addressable by the protocol
pub const MAX_OUTLETS: u8 = 16;
