//! Load outputs: the room's controllable circuits.

use serde::Serialize;

use super::module::Unit;
use crate::id::Guid;

/// Profile of an on/off light.
pub const ON_OFF_PROFILE: Guid = Guid::from_u128(0x1000_0000_0000_0000_0000_0000_0000_0001);
/// Profile of a dimmable light.
pub const DIMMER_PROFILE: Guid = Guid::from_u128(0x1000_0000_0000_0000_0000_0000_0000_0002);
pub const SHADE_PROFILE: Guid = Guid::from_u128(0x2000_0000_0000_0000_0000_0000_0000_0001);
pub const HVAC_PROFILE: Guid = Guid::from_u128(0x1400_0000_0000_0000_0000_0000_0000_0001);
pub const HVAC_CONTROL_MODEL: Guid = Guid::from_u128(0x1700_0000_0000_0000_0000_0000_0000_0001);

/// A load output of a room.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "$type")]
pub enum LoadOutput {
    Circuit(LightNode),
    Shade(ShadeNode),
    #[serde(rename = "HVAC")]
    Hvac(HvacNode),
}

impl LoadOutput {
    #[must_use]
    pub fn guid(&self) -> Guid {
        match self {
            Self::Circuit(n) => n.guid,
            Self::Shade(n) => n.guid,
            Self::Hvac(n) => n.guid,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Circuit(n) => &n.name,
            Self::Shade(n) => &n.name,
            Self::Hvac(n) => &n.name,
        }
    }

    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        let units: Vec<&Unit> = match self {
            Self::Circuit(n) => vec![&n.unit],
            Self::Shade(n) => vec![
                &n.unit_movement,
                &n.unit_opened_percentage,
                &n.unit_current_position,
            ],
            Self::Hvac(n) => n.unit.iter().collect(),
        };
        units.into_iter()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LightNode {
    pub load_type: u8,
    pub icon_path: u8,
    pub power: f64,
    pub profile_guid: Guid,
    pub unit: Unit,
    pub name: String,
    pub guid: Guid,
    pub description: String,
}

impl LightNode {
    /// Light with the canonical load type and profile for its dimmability.
    #[must_use]
    pub fn new(name: String, guid: Guid, unit: Unit, dimmable: bool, power: f64) -> Self {
        let (load_type, profile_guid, description) = if dimmable {
            (2, DIMMER_PROFILE, "Dimmer")
        } else {
            (0, ON_OFF_PROFILE, "ON/OFF")
        };
        Self {
            load_type,
            icon_path: 0,
            power,
            profile_guid,
            unit,
            name,
            guid,
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ShadeNode {
    pub shade_type: u8,
    pub shade_icon: u8,
    pub profile_guid: Guid,
    pub unit_movement: Unit,
    pub unit_opened_percentage: Unit,
    pub unit_current_position: Unit,
    pub name: String,
    pub guid: Guid,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct HvacNode {
    pub profile_guid: Guid,
    pub control_model_guid: Guid,
    pub unit: Option<Unit>,
    pub name: String,
    pub guid: Guid,
    pub description: String,
}
