//! Last-known state of a unit
//!
//! A [`Snapshot`] is what a caller sees when it polls: statistics keyed by
//! display name plus the list of controls. It is only ever patched field by
//! field, so values set by a control action survive until the next scan
//! overwrites them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::control::Control;
use crate::error::{Error, Result};
use crate::naming::PROTOCOL_STATUS;

/// Availability of the control protocol
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProtocolStatus {
    Available,
    /// The unit refused the connection (its control channel is busy)
    Unavailable,
}

impl ProtocolStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::Unavailable => "UNAVAILABLE",
        }
    }
}

impl fmt::Display for ProtocolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProtocolStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "AVAILABLE" => Ok(Self::Available),
            "UNAVAILABLE" => Ok(Self::Unavailable),
            other => Err(Error::Parse(format!("unknown protocol status '{}'", other))),
        }
    }
}

/// Statistics and controls
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    statistics: BTreeMap<String, String>,
    controls: Vec<Control>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statistics(&self) -> &BTreeMap<String, String> {
        &self.statistics
    }

    pub fn statistic(&self, name: &str) -> Option<&str> {
        self.statistics.get(name).map(String::as_str)
    }

    pub fn set_statistic(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.statistics.insert(name.into(), value.into());
    }

    pub fn remove_statistic(&mut self, name: &str) -> Option<String> {
        self.statistics.remove(name)
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    pub fn control(&self, name: &str) -> Option<&Control> {
        self.controls.iter().find(|control| control.name == name)
    }

    pub fn control_mut(&mut self, name: &str) -> Option<&mut Control> {
        self.controls.iter_mut().find(|control| control.name == name)
    }

    /// Insert a control or update the existing one with the same name
    ///
    /// An existing control keeps its timestamp unless its value changes.
    pub fn upsert_control(&mut self, control: Control) {
        match self.control_mut(&control.name) {
            Some(existing) => {
                existing.kind = control.kind;
                existing.set_value(control.value);
            }
            None => self.controls.push(control),
        }
    }

    pub fn remove_control(&mut self, name: &str) -> Option<Control> {
        let index = self.controls.iter().position(|control| control.name == name)?;
        Some(self.controls.remove(index))
    }

    pub fn clear_controls(&mut self) {
        self.controls.clear();
    }

    pub fn protocol_status(&self) -> Option<ProtocolStatus> {
        self.statistic(PROTOCOL_STATUS)?.parse().ok()
    }

    pub fn set_protocol_status(&mut self, status: ProtocolStatus) {
        self.set_statistic(PROTOCOL_STATUS, status.as_str());
    }
}
