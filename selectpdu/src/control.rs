//! Control requests

use std::fmt;

use tracing::debug;

use selectpdu_core::{OutletState, SequenceDirection};
use selectpdu_types::naming::{SEQUENCE_DOWN, SEQUENCE_UP, parse_slot};

use crate::error::{Error, Result};

/// A property change requested by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlRequest {
    pub property: String,
    pub value: String,
}

impl ControlRequest {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
        }
    }
}

/// What a control request asks the unit to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlAction {
    /// Switch every controllable outlet
    Sequence(SequenceDirection),

    /// Switch one outlet
    SetOutlet {
        property: String,
        slot: u8,
        state: OutletState,
    },
}

impl ControlAction {
    /// Interpret a property/value pair
    ///
    /// Sequence buttons ignore the value. Outlets accept `"0"` and `"1"`.
    /// Anything else is not a control this driver handles.
    pub fn parse(property: &str, value: &str) -> Option<Self> {
        match Self::try_parse(property, value) {
            Ok(action) => Some(action),
            Err(e) => {
                debug!("Ignoring control '{}': {}", property, e);
                None
            }
        }
    }

    /// Like [`ControlAction::parse`], but says why a pair was refused
    pub fn try_parse(property: &str, value: &str) -> Result<Self> {
        match property {
            SEQUENCE_UP => return Ok(Self::Sequence(SequenceDirection::Up)),
            SEQUENCE_DOWN => return Ok(Self::Sequence(SequenceDirection::Down)),
            _ => {}
        }

        let state = match value {
            "0" => OutletState::Off,
            "1" => OutletState::On,
            other => {
                return Err(Error::InvalidArgument(format!(
                    "outlet value must be 0 or 1, got '{}'",
                    other
                )));
            }
        };

        Ok(Self::SetOutlet {
            property: property.to_string(),
            slot: parse_slot(property)?,
            state,
        })
    }
}

/// Result of a control request
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ControlOutcome {
    /// The unit confirmed and the snapshot was patched
    Applied,

    /// The unit answered without confirming; the snapshot is unchanged
    Rejected,

    /// Not a recognized control; nothing was sent
    Ignored,
}

impl fmt::Display for ControlOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Applied => "applied",
            Self::Rejected => "rejected",
            Self::Ignored => "ignored",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_sequence() {
        assert_eq!(
            ControlAction::parse("Sequence up", ""),
            Some(ControlAction::Sequence(SequenceDirection::Up))
        );
        assert_eq!(
            ControlAction::parse("Sequence down", "anything"),
            Some(ControlAction::Sequence(SequenceDirection::Down))
        );
    }

    #[test]
    fn test_parse_outlet() {
        assert_eq!(
            ControlAction::parse("Controllable outlets#A - 1", "1"),
            Some(ControlAction::SetOutlet {
                property: "Controllable outlets#A - 1".into(),
                slot: 1,
                state: OutletState::On,
            })
        );
        assert_eq!(
            ControlAction::parse("Rack - 12", "0"),
            Some(ControlAction::SetOutlet {
                property: "Rack - 12".into(),
                slot: 12,
                state: OutletState::Off,
            })
        );
    }

    #[test]
    fn test_parse_ignored() {
        assert_eq!(ControlAction::parse("A - 1", "2"), None);
        assert_eq!(ControlAction::parse("A - 1", "On"), None);
        assert_eq!(ControlAction::parse("Reboot", "1"), None);
        assert_eq!(ControlAction::parse("A - zero", "1"), None);
    }

    #[test]
    fn test_try_parse_reports_reason() {
        assert!(matches!(
            ControlAction::try_parse("A - 1", "on"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            ControlAction::try_parse("Reboot", "1"),
            Err(Error::Types(selectpdu_types::Error::Parse(_)))
        ));
        assert!(matches!(
            ControlAction::try_parse("A - 0", "1"),
            Err(Error::Types(selectpdu_types::Error::Validation(_)))
        ));
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(ControlOutcome::Applied.to_string(), "applied");
        assert_eq!(ControlOutcome::Ignored.to_string(), "ignored");
    }
}
