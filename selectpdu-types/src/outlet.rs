//! Outlet inventory

use std::fmt;

use crate::naming;

/// One named outlet found by a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outlet {
    /// 1-based slot number
    pub slot: u8,

    /// Sanitized name
    pub name: String,

    /// Whether the unit lets this outlet be switched individually
    pub controllable: bool,

    /// Power state
    pub on: bool,
}

impl Outlet {
    pub fn new(slot: u8, name: impl Into<String>, controllable: bool, on: bool) -> Self {
        Self {
            slot,
            name: name.into(),
            controllable,
            on,
        }
    }

    /// Property name on the monitoring surface
    pub fn property(&self) -> String {
        if self.controllable {
            naming::controllable_property(&self.name, self.slot)
        } else {
            naming::outlet_label(&self.name, self.slot)
        }
    }

    /// Statistic value: `"0"`/`"1"` when controllable, `"On"`/`"Off"` otherwise
    pub fn statistic_value(&self) -> &'static str {
        match (self.controllable, self.on) {
            (true, true) => "1",
            (true, false) => "0",
            (false, true) => "On",
            (false, false) => "Off",
        }
    }
}

impl fmt::Display for Outlet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Outlet[{}: {}, {}, {}]",
            self.slot,
            self.name,
            if self.controllable { "controllable" } else { "fixed" },
            if self.on { "on" } else { "off" }
        )
    }
}

/// Result of one scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    pub outlets: Vec<Outlet>,
}

impl Inventory {
    pub fn new(outlets: Vec<Outlet>) -> Self {
        Self { outlets }
    }

    pub fn is_empty(&self) -> bool {
        self.outlets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.outlets.len()
    }

    /// Outlets that can be switched
    pub fn controllable(&self) -> impl Iterator<Item = &Outlet> {
        self.outlets.iter().filter(|outlet| outlet.controllable)
    }

    /// Outlet at `slot`
    pub fn get(&self, slot: u8) -> Option<&Outlet> {
        self.outlets.iter().find(|outlet| outlet.slot == slot)
    }
}
