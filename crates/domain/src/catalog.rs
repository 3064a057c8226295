//! Module catalog: what each module type physically offers.
//!
//! Channel layouts are fixed by type. Electrical ratings default to the
//! manufacturer tables below and can be overridden per type by the project
//! snapshot.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::circuit::CircuitClass;
use crate::electrical;
use crate::error::{LinkError, UnknownModuleType};
use crate::id::Guid;

/// Every module type the document format knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum ModuleType {
    /// 12-channel on/off relay.
    Rl12,
    /// 4-channel on/off relay.
    Rl4,
    /// 4-channel shade driver.
    Lx4,
    /// Single IR emitter for HVAC units.
    Sa1,
    /// 8-channel dimmer.
    Dim8,
    AqlGvM4,
    AdpM8,
    AdpM16,
}

impl ModuleType {
    /// All catalog entries, controllers last.
    pub const ALL: [Self; 8] = [
        Self::Rl12,
        Self::Rl4,
        Self::Lx4,
        Self::Sa1,
        Self::Dim8,
        Self::AqlGvM4,
        Self::AdpM8,
        Self::AdpM16,
    ];

    /// Short type code used throughout the project data.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Rl12 => "RL12",
            Self::Rl4 => "RL4",
            Self::Lx4 => "LX4",
            Self::Sa1 => "SA1",
            Self::Dim8 => "DIM8",
            Self::AqlGvM4 => "AQL-GV-M4",
            Self::AdpM8 => "ADP-M8",
            Self::AdpM16 => "ADP-M16",
        }
    }

    /// Commercial model name.
    #[must_use]
    pub fn model_name(self) -> &'static str {
        match self {
            Self::Rl12 => "ADP-RL12",
            Self::Rl4 => "AQL-GV-RL4",
            Self::Lx4 => "ADP-LX4",
            Self::Sa1 => "AQL-GV-SA1",
            Self::Dim8 => "ADP-DIM8",
            Self::AqlGvM4 => "AQL-GV-M4",
            Self::AdpM8 => "ADP-M8",
            Self::AdpM16 => "ADP-M16",
        }
    }

    /// Whether the module is an HSNET controller hosting a registry.
    #[must_use]
    pub fn is_controller(self) -> bool {
        matches!(self, Self::AqlGvM4 | Self::AdpM8 | Self::AdpM16)
    }

    /// Fixed driver GUID the programming software uses for this type.
    #[must_use]
    pub fn driver_guid(self) -> Guid {
        let suffix: u128 = match self {
            Self::Dim8 => 0x01,
            Self::Lx4 => 0x03,
            Self::AdpM16 => 0x04,
            Self::Rl12 => 0x06,
            Self::Rl4 => 0x10,
            Self::Sa1 => 0x13,
            Self::AqlGvM4 => 0x16,
            Self::AdpM8 => 0x18,
        };
        Guid::from_u128(0x8000_0000_0000_0000_0000_0000_0000_0000 | suffix)
    }

    /// Which circuit classes may be bound to this type's channels.
    #[must_use]
    pub fn accepts(self, class: CircuitClass) -> bool {
        match self {
            Self::Rl12 | Self::Rl4 | Self::Dim8 => class == CircuitClass::Light,
            Self::Lx4 => class == CircuitClass::Shade,
            Self::Sa1 => class == CircuitClass::Hvac,
            Self::AqlGvM4 | Self::AdpM8 | Self::AdpM16 => false,
        }
    }

    /// Number of addressable load channels.
    #[must_use]
    pub fn channel_count(self) -> u16 {
        match self {
            Self::Rl12 => 12,
            Self::Rl4 | Self::Lx4 => 4,
            Self::Sa1 => 1,
            Self::Dim8 => 8,
            Self::AqlGvM4 | Self::AdpM8 | Self::AdpM16 => 0,
        }
    }

    /// Slot layout, in document order.
    #[must_use]
    pub fn slots(self) -> &'static [SlotLayout] {
        const RL12: &[SlotLayout] = &[
            SlotLayout::new(SlotKind::OnOff, 12, 1),
            SlotLayout::new(SlotKind::Pnet, 6, 1),
        ];
        const RL4: &[SlotLayout] = &[SlotLayout::new(SlotKind::OnOff, 4, 1)];
        const LX4: &[SlotLayout] = &[
            SlotLayout::new(SlotKind::Shade, 4, 1),
            SlotLayout::new(SlotKind::Pnet, 6, 0),
        ];
        const SA1: &[SlotLayout] = &[SlotLayout::new(SlotKind::Ir, 1, 1)];
        const DIM8: &[SlotLayout] = &[
            SlotLayout::new(SlotKind::Dim, 8, 1),
            SlotLayout::new(SlotKind::Pnet, 6, 1),
        ];
        const M4: &[SlotLayout] = &[
            SlotLayout::new(SlotKind::Acnet, 24, 0),
            SlotLayout::new(SlotKind::Scene, 96, 1),
        ];
        const M8: &[SlotLayout] = &[
            SlotLayout::new(SlotKind::Acnet, 250, 0),
            SlotLayout::new(SlotKind::Scene, 256, 1),
        ];

        match self {
            Self::Rl12 => RL12,
            Self::Rl4 => RL4,
            Self::Lx4 => LX4,
            Self::Sa1 => SA1,
            Self::Dim8 => DIM8,
            Self::AqlGvM4 => M4,
            Self::AdpM8 | Self::AdpM16 => M8,
        }
    }

    /// Controller-only defaults: device id and the fixed unit-id block of
    /// its 19 built-in status composers.
    #[must_use]
    pub fn controller_profile(self) -> Option<ControllerProfile> {
        match self {
            Self::AqlGvM4 => Some(ControllerProfile {
                default_dev_id: 1,
                unit_ids: 39..=57,
            }),
            Self::AdpM8 => Some(ControllerProfile {
                default_dev_id: 3,
                unit_ids: 59..=77,
            }),
            Self::AdpM16 => Some(ControllerProfile {
                default_dev_id: 5,
                unit_ids: 104..=122,
            }),
            _ => None,
        }
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ModuleType {
    type Err = UnknownModuleType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RL12" | "ADP-RL12" => Ok(Self::Rl12),
            "RL4" | "AQL-GV-RL4" => Ok(Self::Rl4),
            "LX4" | "ADP-LX4" => Ok(Self::Lx4),
            "SA1" | "AQL-GV-SA1" => Ok(Self::Sa1),
            "DIM8" | "ADP-DIM8" => Ok(Self::Dim8),
            "AQL-GV-M4" | "M4" => Ok(Self::AqlGvM4),
            "ADP-M8" | "M8" => Ok(Self::AdpM8),
            "ADP-M16" | "M16" => Ok(Self::AdpM16),
            _ => Err(UnknownModuleType {
                code: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for ModuleType {
    type Error = UnknownModuleType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ModuleType> for &'static str {
    fn from(value: ModuleType) -> Self {
        value.code()
    }
}

/// Fixed properties of controller modules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerProfile {
    pub default_dev_id: u16,
    pub unit_ids: RangeInclusive<u32>,
}

/// Kind of a module slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    OnOff,
    Dim,
    Shade,
    Ir,
    Pnet,
    Acnet,
    Scene,
}

impl SlotKind {
    /// Slot name written into the document.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::OnOff => "Load ON/OFF",
            Self::Dim => "Load Dim",
            Self::Shade => "Shade",
            Self::Ir => "IR",
            Self::Pnet => "PNET",
            Self::Acnet => "ACNET/RNET",
            Self::Scene => "Scene",
        }
    }

    /// Numeric slot type code.
    #[must_use]
    pub fn type_code(self) -> u8 {
        match self {
            Self::Acnet => 0,
            Self::OnOff => 1,
            Self::Dim => 2,
            Self::Ir => 4,
            Self::Pnet => 6,
            Self::Shade => 7,
            Self::Scene => 8,
        }
    }

    /// Whether circuits can be bound to this slot.
    #[must_use]
    pub fn is_load_channel(self) -> bool {
        matches!(self, Self::OnOff | Self::Dim | Self::Shade | Self::Ir)
    }
}

/// One slot of a module's fixed layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotLayout {
    pub kind: SlotKind,
    pub capacity: u16,
    pub io: u8,
}

impl SlotLayout {
    const fn new(kind: SlotKind, capacity: u16, io: u8) -> Self {
        Self { kind, capacity, io }
    }
}

/// Channels sharing one supply and its maximum current.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentGroup {
    pub max_current: f64,
    pub channels: Vec<u16>,
}

/// Current ratings of one module type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectricalSpec {
    /// Maximum current a single channel may carry, in amperes.
    pub channel_current: f64,
    #[serde(default)]
    pub groups: Vec<CurrentGroup>,
}

impl ElectricalSpec {
    /// The current group containing `channel`, if any.
    #[must_use]
    pub fn group_of(&self, channel: u16) -> Option<&CurrentGroup> {
        self.groups.iter().find(|g| g.channels.contains(&channel))
    }

    /// Check that `channel` can take a load drawing `draw` amperes.
    ///
    /// `committed` returns the current already placed on a channel, whether
    /// it comes from an existing link or one decided earlier in the same run.
    ///
    /// # Errors
    ///
    /// - [`LinkError::ChannelCurrentExceeded`] when `draw` is above the channel rating
    /// - [`LinkError::GroupCurrentExceeded`] when the channel's group would go over its limit
    pub fn check(
        &self,
        channel: u16,
        draw: f64,
        committed: impl Fn(u16) -> f64,
    ) -> Result<(), LinkError> {
        if electrical::exceeds(draw, self.channel_current) {
            return Err(LinkError::ChannelCurrentExceeded {
                required: draw,
                rating: self.channel_current,
            });
        }
        if let Some(group) = self.group_of(channel) {
            let total = draw
                + group
                    .channels
                    .iter()
                    .filter(|c| **c != channel)
                    .map(|c| committed(*c))
                    .sum::<f64>();
            if electrical::exceeds(total, group.max_current) {
                return Err(LinkError::GroupCurrentExceeded {
                    total,
                    max: group.max_current,
                });
            }
        }
        Ok(())
    }

    fn uniform(channels: u16, per_group: u16, max_current: f64) -> Self {
        let groups = (1..=channels)
            .collect::<Vec<_>>()
            .chunks(usize::from(per_group))
            .map(|chunk| CurrentGroup {
                max_current,
                channels: chunk.to_vec(),
            })
            .collect();
        Self {
            channel_current: 2.5,
            groups,
        }
    }
}

/// Electrical ratings per module type.
///
/// Types without an entry have no current constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleCatalog {
    electrical: BTreeMap<ModuleType, ElectricalSpec>,
}

impl Default for ModuleCatalog {
    fn default() -> Self {
        let mut electrical = BTreeMap::new();
        electrical.insert(ModuleType::Rl12, ElectricalSpec::uniform(12, 4, 8.0));
        electrical.insert(ModuleType::Dim8, ElectricalSpec::uniform(8, 4, 8.0));
        electrical.insert(ModuleType::Lx4, ElectricalSpec::uniform(4, 4, 5.0));
        Self { electrical }
    }
}

impl ModuleCatalog {
    /// A catalog without any electrical constraint.
    #[must_use]
    pub fn unconstrained() -> Self {
        Self {
            electrical: BTreeMap::new(),
        }
    }

    /// Built-in ratings with the given per-type overrides applied.
    #[must_use]
    pub fn with_overrides(overrides: &BTreeMap<ModuleType, ElectricalSpec>) -> Self {
        let mut catalog = Self::default();
        for (module_type, spec) in overrides {
            catalog.electrical.insert(*module_type, spec.clone());
        }
        catalog
    }

    /// Electrical ratings for `module_type`, if constrained.
    #[must_use]
    pub fn electrical(&self, module_type: ModuleType) -> Option<&ElectricalSpec> {
        self.electrical.get(&module_type)
    }
}
