//! Property names of the monitoring surface
//!
//! Outlets are addressed as `"<name> - <slot>"`. Controllable outlets live in
//! the `"Controllable outlets"` group, which prefixes their name with
//! [`CONTROLLABLE_GROUP`].

use crate::error::{Error, Result};

/// Group prefix of controllable outlet properties
pub const CONTROLLABLE_GROUP: &str = "Controllable outlets#";

/// Button that switches every controllable outlet on
pub const SEQUENCE_UP: &str = "Sequence up";

/// Button that switches every controllable outlet off
pub const SEQUENCE_DOWN: &str = "Sequence down";

/// Statistic carrying the protocol availability
pub const PROTOCOL_STATUS: &str = "ControlProtocolStatus";

const SLOT_SEPARATOR: &str = " - ";

/// `"<name> - <slot>"`
pub fn outlet_label(name: &str, slot: u8) -> String {
    format!("{}{}{}", name, SLOT_SEPARATOR, slot)
}

/// `"Controllable outlets#<name> - <slot>"`
pub fn controllable_property(name: &str, slot: u8) -> String {
    format!("{}{}", CONTROLLABLE_GROUP, outlet_label(name, slot))
}

/// Add the controllable group prefix when it is missing
pub fn normalize_outlet_property(property: &str) -> String {
    if property.starts_with(CONTROLLABLE_GROUP) {
        property.to_string()
    } else {
        format!("{}{}", CONTROLLABLE_GROUP, property)
    }
}

/// Check if a property names one of the sequence buttons
pub fn is_sequence_button(property: &str) -> bool {
    property == SEQUENCE_UP || property == SEQUENCE_DOWN
}

/// Extract the slot number following the last `" - "`
pub fn parse_slot(property: &str) -> Result<u8> {
    let (_, slot) = property
        .rsplit_once(SLOT_SEPARATOR)
        .ok_or_else(|| Error::Parse(format!("no slot in property '{}'", property)))?;

    let slot: u8 = slot
        .trim()
        .parse()
        .map_err(|e| Error::Parse(format!("invalid slot '{}': {}", slot, e)))?;

    if slot == 0 {
        return Err(Error::Validation("slots are numbered from 1".into()));
    }

    Ok(slot)
}
