//! Controllable properties

use chrono::{DateTime, Utc};

/// Switch label for the on position
pub const LABEL_ON: &str = "On";

/// Switch label for the off position
pub const LABEL_OFF: &str = "Off";

/// Button label
pub const LABEL_LAUNCH: &str = "Launch";

/// Button label while the action runs
pub const LABEL_PROCESSING: &str = "Processing...";

/// Presentation of a control
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlKind {
    /// Two-position switch, value `"0"` or `"1"`
    Switch { label_on: String, label_off: String },

    /// Momentary button, value `""`
    Button {
        label: String,
        label_pressed: String,
        grace_period_ms: u64,
    },
}

impl ControlKind {
    /// On/Off switch
    pub fn switch() -> Self {
        Self::Switch {
            label_on: LABEL_ON.into(),
            label_off: LABEL_OFF.into(),
        }
    }

    /// Launch button without grace period
    pub fn button() -> Self {
        Self::Button {
            label: LABEL_LAUNCH.into(),
            label_pressed: LABEL_PROCESSING.into(),
            grace_period_ms: 0,
        }
    }
}

/// A control with its current value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub name: String,
    pub kind: ControlKind,
    pub value: String,

    /// Last time the value changed
    pub timestamp: DateTime<Utc>,
}

impl Control {
    pub fn new(name: impl Into<String>, kind: ControlKind, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            value: value.into(),
            timestamp: Utc::now(),
        }
    }

    /// Switch reflecting an outlet state
    pub fn switch(name: impl Into<String>, on: bool) -> Self {
        Self::new(name, ControlKind::switch(), if on { "1" } else { "0" })
    }

    /// Sequence button
    pub fn button(name: impl Into<String>) -> Self {
        Self::new(name, ControlKind::button(), "")
    }

    pub fn is_switch(&self) -> bool {
        matches!(self.kind, ControlKind::Switch { .. })
    }

    pub fn is_button(&self) -> bool {
        matches!(self.kind, ControlKind::Button { .. })
    }

    /// Update the value, refreshing the timestamp only when it changes
    ///
    /// Returns `true` if the value changed.
    pub fn set_value(&mut self, value: impl Into<String>) -> bool {
        let value = value.into();
        if self.value == value {
            return false;
        }

        self.value = value;
        self.touch();
        true
    }

    /// Refresh the timestamp
    pub fn touch(&mut self) {
        self.timestamp = Utc::now();
    }
}
