//! Type definitions for selectpdu

pub mod control;
pub mod error;
pub mod naming;
pub mod outlet;
pub mod snapshot;

pub use control::{Control, ControlKind};
pub use error::{Error, Result};
pub use outlet::{Inventory, Outlet};
pub use snapshot::{ProtocolStatus, Snapshot};
