//! # selectpdu
//!
//! Driver for Middle Atlantic Select series power distribution units.
//!
//! ## Features
//!
//! - Checksum-framed binary protocol over TCP
//! - Lazy login with ping-based session refresh
//! - Outlet inventory scan with a cached snapshot
//! - Outlet switching and power sequencing with a post-control cooldown
//!
//! ## Quick Start
//!
//! ```no_run
//! use selectpdu::{DeviceConfig, PowerUnit};
//!
//! #[tokio::main]
//! async fn main() -> selectpdu::Result<()> {
//!     let config = DeviceConfig::load()?;
//!     let unit = PowerUnit::from_config(&config);
//!
//!     // Starts a scan; the result shows up on the next poll
//!     unit.statistics().await?;
//!
//!     unit.control_property("Controllable outlets#Router - 1", "1").await?;
//!     unit.shutdown().await;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod control;
pub mod coordinator;
pub mod device;
pub mod error;
pub mod reconcile;
pub mod scanner;
pub mod worker;

#[cfg(test)]
mod testing;

// Re-exports
pub use config::DeviceConfig;
pub use control::{ControlAction, ControlOutcome, ControlRequest};
pub use coordinator::PowerUnit;
pub use device::Device;
pub use error::{Error, Result};

// Re-export types
pub use selectpdu_core::{OutletState, SequenceDirection, Session, SessionState};
pub use selectpdu_types::{Control, ControlKind, Inventory, Outlet, ProtocolStatus, Snapshot};
