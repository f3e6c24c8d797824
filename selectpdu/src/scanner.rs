//! Outlet inventory scan

use tracing::debug;

use selectpdu_core::{MAX_OUTLETS, SlotStatus};
use selectpdu_types::{Inventory, Outlet};

use crate::device::Device;
use crate::error::Result;

/// Discover every named outlet
///
/// Reads the bulk slot status, then the name and power state of each
/// controllable or fixed slot. Absent and unclassified slots are skipped, and
/// so is a slot whose name comes back empty. Slot numbers always follow the
/// position in the bulk reply. The session must already be refreshed.
pub async fn scan(device: &mut Device) -> Result<Inventory> {
    let statuses = device.read_slot_statuses().await?;
    let mut outlets = Vec::new();

    for (slot, status) in (1..=MAX_OUTLETS).zip(statuses) {
        let controllable = match status {
            SlotStatus::Controllable => true,
            SlotStatus::Fixed => false,
            SlotStatus::Absent => continue,
            SlotStatus::Unclassified(code) => {
                debug!("Slot {} has unknown status 0x{:02X}, skipping", slot, code);
                continue;
            }
        };

        let name = device.read_outlet_name(slot).await?;
        if name.is_empty() {
            debug!("Slot {} has no name, skipping", slot);
            continue;
        }

        let on = device.read_outlet_state(slot).await?;
        outlets.push(Outlet::new(slot, name, controllable, on));
    }

    debug!("Scan found {} outlets", outlets.len());
    Ok(Inventory::new(outlets))
}
