//! Module nodes: device entries of an automation board.

use serde::Serialize;

use crate::id::Guid;

/// Addressable value of the automation bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "$type", rename = "Unit", rename_all = "PascalCase")]
pub struct Unit {
    pub id: u32,
    pub event: u32,
    pub scene: u32,
    pub disabled: bool,
    pub logged: bool,
    pub memo: bool,
    pub increment: bool,
}

impl Unit {
    #[must_use]
    pub fn new(id: u32) -> Self {
        Self {
            id,
            event: 0,
            scene: 0,
            disabled: false,
            logged: false,
            memo: false,
            increment: false,
        }
    }
}

/// A named port exposing one [`Unit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "$type", rename = "UnitComposer", rename_all = "PascalCase")]
pub struct UnitComposer {
    pub name: String,
    pub unit: Unit,
    pub port_number: u16,
    pub port_type: u16,
    pub not_programmable: bool,
    pub kind: u8,
    #[serde(rename = "IO")]
    pub io: u8,
    pub value: i64,
}

impl UnitComposer {
    #[must_use]
    pub fn new(name: impl Into<String>, unit: Unit, port_number: u16, port_type: u16, kind: u8, io: u8) -> Self {
        Self {
            name: name.into(),
            unit,
            port_number,
            port_type,
            not_programmable: false,
            kind,
            io,
            value: 0,
        }
    }

    #[must_use]
    pub fn not_programmable(mut self, flag: bool) -> Self {
        self.not_programmable = flag;
        self
    }
}

/// One typed slot array of a module.
///
/// `sub_items` always holds `capacity` entries; free positions carry
/// [`Guid::ZERO`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "$type", rename = "Slot", rename_all = "PascalCase")]
pub struct SlotNode {
    #[serde(rename = "SlotCapacity")]
    pub capacity: u16,
    pub slot_type: u8,
    pub initial_port: u16,
    #[serde(rename = "IO")]
    pub io: u8,
    pub unit_composers: Option<Vec<UnitComposer>>,
    #[serde(rename = "SubItemsGuid")]
    pub sub_items: Vec<Guid>,
    pub name: String,
}

impl SlotNode {
    /// Occupied positions, 1-based.
    pub fn occupied(&self) -> impl Iterator<Item = (u16, Guid)> + '_ {
        (1u16..)
            .zip(self.sub_items.iter().copied())
            .filter(|(_, guid)| !guid.is_zero())
    }
}

/// Document flavour of a module entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ModuleNodeKind {
    Module,
    #[serde(rename = "ModuleHVAC")]
    Hvac,
}

/// A module placed on a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModuleNode {
    #[serde(rename = "$type")]
    pub kind: ModuleNodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_item_composers: Option<Vec<Vec<UnitComposer>>>,
    #[serde(rename = "GTWItemComposers", skip_serializing_if = "Option::is_none")]
    pub gateway_item_composers: Option<Vec<UnitComposer>>,
    pub name: String,
    pub driver_guid: Guid,
    pub guid: Guid,
    pub ip_address: String,
    pub hsnet_address: u16,
    pub poll_timing: u32,
    pub disabled: bool,
    pub remote_port: u16,
    pub remote_ip_address: String,
    pub notes: Option<String>,
    #[serde(rename = "Logicserver")]
    pub logic_server: bool,
    #[serde(rename = "DevID")]
    pub dev_id: u16,
    #[serde(rename = "DevIDSlave")]
    pub dev_id_slave: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_composers: Option<Vec<UnitComposer>>,
    pub slots: Vec<SlotNode>,
    pub smart_group: u8,
    pub user_interface_guid: Guid,
    #[serde(rename = "PIRSensorReportEnable")]
    pub pir_sensor_report_enable: bool,
    #[serde(rename = "PIRSensorReportID")]
    pub pir_sensor_report_id: u32,
}

impl ModuleNode {
    /// The slot named `name`, if the module has one.
    #[must_use]
    pub fn slot(&self, name: &str) -> Option<&SlotNode> {
        self.slots.iter().find(|s| s.name == name)
    }

    pub fn slot_mut(&mut self, name: &str) -> Option<&mut SlotNode> {
        self.slots.iter_mut().find(|s| s.name == name)
    }

    /// Every unit exposed by the module's composers.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.unit_composers
            .iter()
            .flatten()
            .chain(self.sub_item_composers.iter().flatten().flatten())
            .map(|c| &c.unit)
    }
}
