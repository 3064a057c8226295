//! Keypad: a wall interface with 1, 2 or 4 programmable buttons.

use serde::{Deserialize, Serialize};

use crate::error::{PanelError, ValidationError};
use crate::id::{ButtonId, CircuitId, Guid, KeypadId, ModuleId, SceneId};

/// Command mode a button falls back to when it targets nothing.
pub const NEUTRAL_MODE: u8 = 3;

/// A wall keypad owned by a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keypad {
    pub id: KeypadId,
    pub name: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub button_color: Option<String>,
    pub button_count: u8,
    #[serde(default)]
    pub hsnet: Option<u16>,
    #[serde(default)]
    pub dev_id: Option<u16>,
    /// Controller this keypad reports to; the logic server when absent.
    #[serde(default)]
    pub controller: Option<ModuleId>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub buttons: Vec<Button>,
}

impl Keypad {
    /// Check the keypad's own invariants. Button positions are checked
    /// one at a time with [`Keypad::check_button`].
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Validation`] when:
    /// - `name` is empty ([`ValidationError::EmptyName`])
    /// - `button_count` is not 1, 2 or 4 ([`ValidationError::InvalidButtonCount`])
    pub fn validate(&self) -> Result<(), PanelError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName { entity: "keypad" }.into());
        }
        if !matches!(self.button_count, 1 | 2 | 4) {
            return Err(ValidationError::InvalidButtonCount(self.button_count).into());
        }
        Ok(())
    }

    /// Check that `button` sits inside `1..=button_count`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ButtonOutOfRange`] otherwise.
    pub fn check_button(&self, button: &Button) -> Result<(), ValidationError> {
        if button.position == 0 || button.position > self.button_count {
            return Err(ValidationError::ButtonOutOfRange {
                position: button.position,
                count: self.button_count,
            });
        }
        Ok(())
    }

    /// Layout code of the physical button arrangement.
    #[must_use]
    pub fn layout_code(&self) -> u8 {
        match self.button_count {
            2 => 6,
            4 => 7,
            other => other,
        }
    }
}

/// What a button controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonTarget {
    Circuit(CircuitId),
    Scene(SceneId),
}

/// Icon pair drawn on a rocker button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RockerStyle {
    #[default]
    UpDown,
    LeftRight,
    PreviousNext,
}

impl RockerStyle {
    #[must_use]
    pub fn icon_guid(self) -> Guid {
        match self {
            Self::UpDown => Guid::from_u128(ICON_BASE | 0x01),
            Self::LeftRight => Guid::from_u128(ICON_BASE | 0x02),
            Self::PreviousNext => Guid::from_u128(ICON_BASE | 0x03),
        }
    }
}

/// One keypad button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub id: ButtonId,
    /// 1-based position on the keypad.
    pub position: u8,
    /// GUID persisted by a previous compile, reused when still free.
    #[serde(default)]
    pub guid: Option<Guid>,
    #[serde(default)]
    pub target: Option<ButtonTarget>,
    #[serde(default = "neutral_mode")]
    pub mode: u8,
    #[serde(default)]
    pub command_on: u8,
    #[serde(default)]
    pub command_off: u8,
    #[serde(default)]
    pub can_hold: bool,
    /// Drawn as a rocker when set.
    #[serde(default)]
    pub rocker: Option<RockerStyle>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub engraver_text: Option<String>,
    #[serde(default)]
    pub double_press_mode: Option<u8>,
    #[serde(default)]
    pub double_press_command: Option<u8>,
}

fn neutral_mode() -> u8 {
    NEUTRAL_MODE
}

impl Button {
    /// An unprogrammed button at `position`.
    #[must_use]
    pub fn new(id: ButtonId, position: u8) -> Self {
        Self {
            id,
            position,
            guid: None,
            target: None,
            mode: NEUTRAL_MODE,
            command_on: 0,
            command_off: 0,
            can_hold: false,
            rocker: None,
            icon: None,
            engraver_text: None,
            double_press_mode: None,
            double_press_command: None,
        }
    }

    /// Icon GUID when the button names a known icon.
    #[must_use]
    pub fn icon_guid(&self) -> Option<Guid> {
        self.icon.as_deref().and_then(icon_guid)
    }

    /// Visual style of the button, derived from its rocker flag and icon.
    #[must_use]
    pub fn style(&self) -> ButtonStyle {
        match (self.rocker, self.icon_guid()) {
            (Some(rocker), Some(icon)) => ButtonStyle::RockerWithIcon { rocker, icon },
            (Some(rocker), None) => ButtonStyle::Rocker(rocker),
            (None, Some(icon)) => ButtonStyle::Icon(icon),
            (None, None) => ButtonStyle::Plain,
        }
    }
}

/// Resolved button style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonStyle {
    Plain,
    Icon(Guid),
    Rocker(RockerStyle),
    RockerWithIcon { rocker: RockerStyle, icon: Guid },
}

impl ButtonStyle {
    /// Style GUID understood by the programming software.
    #[must_use]
    pub fn guid(self) -> Guid {
        const STYLE_BASE: u128 = 0x1300_0000_0000_0000_0000_0000_0000_0000;
        match self {
            Self::Plain => Guid::ZERO,
            Self::Icon(_) => Guid::from_u128(STYLE_BASE | 0x02),
            Self::RockerWithIcon { .. } => Guid::from_u128(STYLE_BASE | 0x03),
            Self::Rocker(_) => Guid::from_u128(STYLE_BASE | 0x04),
        }
    }
}

const ICON_BASE: u128 = 0x1100_0000_0000_0000_0000_0000_0000_0000;

const ICONS: &[(&str, u128)] = &[
    ("abajour", 0x26),
    ("arandela", 0x28),
    ("bright", 0x19),
    ("cascata", 0x54),
    ("churrasco", 0x57),
    ("clean room", 0x45),
    ("concierge", 0x46),
    ("curtains", 0x36),
    ("curtains preset 1", 0x38),
    ("curtains preset 2", 0x37),
    ("day", 0x13),
    ("dim penumbra", 0x21),
    ("dinner", 0x10),
    ("do not disturb", 0x44),
    ("door", 0x49),
    ("doorbell", 0x43),
    ("fan", 0x05),
    ("fireplace", 0x50),
    ("garage", 0x59),
    ("gate", 0x55),
    ("good night", 0x15),
    ("gym1", 0x63),
    ("gym2", 0x64),
    ("gym3", 0x65),
    ("hvac", 0x04),
    ("irrigação", 0x62),
    ("jardim1", 0x52),
    ("jardim2", 0x53),
    ("lampada", 0x30),
    ("laundry", 0x47),
    ("leaving", 0x16),
    ("light preset 1", 0x23),
    ("light preset 2", 0x24),
    ("lower shades", 0x32),
    ("luminaria de piso", 0x27),
    ("medium", 0x20),
    ("meeting", 0x66),
    ("movie", 0x08),
    ("music", 0x18),
    ("night", 0x14),
    ("onoff", 0x17),
    ("padlock", 0x48),
    ("party", 0x11),
    ("pendant", 0x25),
    ("piscina 1", 0x58),
    ("piscina 2", 0x61),
    ("pizza", 0x56),
    ("raise shades", 0x33),
    ("reading", 0x07),
    ("shades", 0x31),
    ("shades preset 1", 0x34),
    ("shades preset 2", 0x35),
    ("spot", 0x29),
    ("steam room", 0x67),
    ("turned off", 0x22),
    ("tv", 0x40),
    ("volume", 0x41),
    ("welcome", 0x06),
    ("wine", 0x12),
];

/// Look up the GUID of a named button icon.
#[must_use]
pub fn icon_guid(name: &str) -> Option<Guid> {
    let name = name.trim().to_lowercase();
    ICONS
        .iter()
        .find(|(icon, _)| *icon == name)
        .map(|(_, suffix)| Guid::from_u128(ICON_BASE | suffix))
}
