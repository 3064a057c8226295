//! Channel linker: writes a circuit's GUID into a module channel slot.

use panelforge_domain::catalog::SlotKind;
use panelforge_domain::circuit::{Circuit, CircuitKind};
use panelforge_domain::error::LinkError;
use panelforge_domain::id::Guid;

use super::hierarchy::{Hierarchy, ModuleIdx};

/// Where a circuit ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkPlacement {
    pub module: ModuleIdx,
    pub slot: SlotKind,
    pub channel: u16,
}

/// Slot kinds a circuit may occupy, preferred first.
#[must_use]
pub fn slot_preference(kind: CircuitKind) -> [SlotKind; 2] {
    match kind {
        CircuitKind::Light { dimmable: true, .. } => [SlotKind::Dim, SlotKind::OnOff],
        CircuitKind::Light { dimmable: false, .. } => [SlotKind::OnOff, SlotKind::Dim],
        CircuitKind::Shade => [SlotKind::Shade, SlotKind::OnOff],
        CircuitKind::Hvac => [SlotKind::Ir, SlotKind::OnOff],
    }
}

/// Bind `circuit` (already placed as `circuit_guid`) to `channel` of the
/// module named `module_name`, searching every board.
///
/// Linking a circuit to the channel it already occupies is a no-op.
///
/// # Errors
///
/// - [`LinkError::ModuleNotFound`] when no module has that name
/// - [`LinkError::ChannelOutOfRange`] when `channel` is outside `1..=channel_count`
/// - [`LinkError::ChannelOccupied`] when another circuit holds the channel
/// - [`LinkError::ChannelIncompatible`] when no slot of the module fits the circuit
pub fn link(
    hierarchy: &mut Hierarchy,
    circuit: &Circuit,
    circuit_guid: Guid,
    module_name: &str,
    channel: u16,
) -> Result<LinkPlacement, LinkError> {
    let idx = hierarchy
        .module_by_name(module_name)
        .ok_or_else(|| LinkError::ModuleNotFound {
            module: module_name.to_string(),
        })?;
    let entry = hierarchy.module_mut(idx);
    let capacity = entry.module_type.channel_count();
    if channel == 0 || channel > capacity {
        return Err(LinkError::ChannelOutOfRange {
            module: module_name.to_string(),
            channel,
            capacity,
        });
    }

    for kind in slot_preference(circuit.kind) {
        let Some(slot) = entry.node.slot_mut(kind.name()) else {
            continue;
        };
        if channel > slot.capacity {
            continue;
        }
        if slot.sub_items.len() < usize::from(slot.capacity) {
            slot.sub_items.resize(usize::from(slot.capacity), Guid::ZERO);
        }
        let position = usize::from(channel - 1);
        let current = slot.sub_items[position];
        if current != circuit_guid && !current.is_zero() {
            return Err(LinkError::ChannelOccupied {
                module: module_name.to_string(),
                channel,
            });
        }
        slot.sub_items[position] = circuit_guid;
        return Ok(LinkPlacement {
            module: idx,
            slot: kind,
            channel,
        });
    }

    Err(LinkError::ChannelIncompatible {
        module: module_name.to_string(),
        circuit_kind: circuit.class().as_str(),
    })
}
