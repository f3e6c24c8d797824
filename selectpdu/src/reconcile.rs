//! Snapshot reconciliation
//!
//! Scans merge into the snapshot; control actions patch it in place so the
//! caller sees the result before the next scan confirms it.

use tracing::debug;

use selectpdu_core::{OutletState, SequenceDirection};
use selectpdu_types::{
    Control, Inventory, Snapshot,
    naming::{CONTROLLABLE_GROUP, SEQUENCE_DOWN, SEQUENCE_UP, normalize_outlet_property},
};

fn switch_value(on: bool) -> &'static str {
    if on { "1" } else { "0" }
}

/// Merge a scan into the snapshot
///
/// Statistics are inserted or overwritten, switches are upserted (a changed
/// value refreshes the timestamp) and the sequence buttons are recomputed.
pub fn apply_inventory(snapshot: &mut Snapshot, inventory: &Inventory) {
    for outlet in &inventory.outlets {
        let property = outlet.property();
        snapshot.set_statistic(property.clone(), outlet.statistic_value());

        if outlet.controllable {
            snapshot.upsert_control(Control::switch(property, outlet.on));
        }
    }

    refresh_sequence_buttons(snapshot);
}

/// Record an acknowledged outlet write
///
/// Nothing changes unless the unit reports the requested state and the
/// outlet is already known from a scan. Returns whether the snapshot was
/// patched.
pub fn apply_outlet_write(
    snapshot: &mut Snapshot,
    property: &str,
    requested: OutletState,
    actual: u8,
) -> bool {
    if actual != requested.code() {
        debug!(
            "Outlet '{}' requested {:?} but unit reports 0x{:02X}, keeping snapshot",
            property, requested, actual
        );
        return false;
    }

    let property = normalize_outlet_property(property);
    let value = switch_value(requested == OutletState::On);

    let Some(control) = snapshot.control_mut(&property) else {
        debug!("Outlet '{}' is not in the snapshot, waiting for the next scan", property);
        return false;
    };
    control.set_value(value);
    snapshot.set_statistic(property, value);

    refresh_sequence_buttons(snapshot);
    true
}

/// Record a completed power sequence
///
/// Every controllable outlet takes the direction's target state and every
/// switch gets a fresh timestamp.
pub fn apply_sequence(snapshot: &mut Snapshot, direction: SequenceDirection) {
    let value = switch_value(direction.target_state() == OutletState::On);

    let outlets: Vec<String> = snapshot
        .statistics()
        .keys()
        .filter(|name| name.starts_with(CONTROLLABLE_GROUP))
        .cloned()
        .collect();
    for name in outlets {
        snapshot.set_statistic(name, value);
    }

    let switches: Vec<String> = snapshot
        .controls()
        .iter()
        .filter(|control| control.is_switch())
        .map(|control| control.name.clone())
        .collect();
    for name in switches {
        if let Some(control) = snapshot.control_mut(&name) {
            control.value = value.to_string();
            control.touch();
        }
    }

    refresh_sequence_buttons(snapshot);
}

/// Show the sequence buttons that make sense for the current outlet states
///
/// With no controllable outlet on only "Sequence up" is offered, with none
/// off only "Sequence down", otherwise both. Without controllable outlets
/// neither is.
pub fn refresh_sequence_buttons(snapshot: &mut Snapshot) {
    let (mut on, mut off) = (0usize, 0usize);
    for (name, value) in snapshot.statistics() {
        if !name.starts_with(CONTROLLABLE_GROUP) {
            continue;
        }
        match value.as_str() {
            "1" => on += 1,
            "0" => off += 1,
            _ => {}
        }
    }

    let (up, down) = match (on, off) {
        (0, 0) => (false, false),
        (0, _) => (true, false),
        (_, 0) => (false, true),
        _ => (true, true),
    };

    set_button(snapshot, SEQUENCE_UP, up);
    set_button(snapshot, SEQUENCE_DOWN, down);
}

fn set_button(snapshot: &mut Snapshot, name: &str, visible: bool) {
    if visible {
        snapshot.set_statistic(name, "");
        snapshot.upsert_control(Control::button(name));
    } else {
        snapshot.remove_statistic(name);
        snapshot.remove_control(name);
    }
}
