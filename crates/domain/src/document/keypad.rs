//! User interface nodes: keypads and their buttons.

use serde::Serialize;

use super::module::UnitComposer;
use crate::id::Guid;

pub const KEYPAD_DRIVER: Guid = Guid::from_u128(0x9000_0000_0000_0000_0000_0000_0000_0004);
pub const KEYPAD_PROFILE: Guid = Guid::from_u128(0x4000_0000_0000_0000_0000_0000_0000_0001);

/// An RQR-K wall keypad.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "$type", rename = "Keypad", rename_all = "PascalCase")]
pub struct KeypadNode {
    pub driver_guid: Guid,
    pub module_interface: bool,
    #[serde(rename = "Keypad4x4")]
    pub keypad_4x4: bool,
    pub hsnet_address: u16,
    #[serde(rename = "TipoEntrada1ChaveLD")]
    pub input1_switch_type: u8,
    #[serde(rename = "TipoEntrada2ChaveLD")]
    pub input2_switch_type: u8,
    #[serde(rename = "UnitEntradaDigital1")]
    pub unit_digital_input1: UnitComposer,
    #[serde(rename = "UnitEntradaDigital2")]
    pub unit_digital_input2: UnitComposer,
    pub unit_any_key: UnitComposer,
    pub bright_unit: u32,
    pub unit_brightness_color1: UnitComposer,
    pub unit_brightness_color2: UnitComposer,
    pub unit_beep_profile: UnitComposer,
    pub unit_volume_profile: UnitComposer,
    pub unit_volume_key: UnitComposer,
    pub unit_blocked_keypad: UnitComposer,
    #[serde(rename = "UnitPIN32")]
    pub unit_pin32: UnitComposer,
    pub night_mode_group: u8,
    pub light_sensor_mode: u8,
    #[serde(rename = "LightSensorMasterID")]
    pub light_sensor_master_id: u32,
    #[serde(rename = "DevID")]
    pub dev_id: u16,
    pub list_keypad_buttons: Vec<RockerButtonNode>,
    pub list_keypad_buttons_layout2: Vec<RockerButtonNode>,
    pub profile_guid: Guid,
    pub button_count_layout2: u8,
    pub button_layout2: u8,
    pub slots: Vec<super::module::SlotNode>,
    #[serde(rename = "hold")]
    pub hold: u8,
    pub button_layout1: u8,
    pub model_name: String,
    pub color: String,
    pub button_color: String,
    pub name: String,
    pub notes: Option<String>,
    pub guid: Guid,
    pub button_count: u8,
}

impl KeypadNode {
    /// Every composer of the keypad, buttons included.
    pub fn composers(&self) -> impl Iterator<Item = &UnitComposer> {
        [
            &self.unit_digital_input1,
            &self.unit_digital_input2,
            &self.unit_any_key,
            &self.unit_brightness_color1,
            &self.unit_brightness_color2,
            &self.unit_beep_profile,
            &self.unit_volume_profile,
            &self.unit_volume_key,
            &self.unit_blocked_keypad,
            &self.unit_pin32,
        ]
        .into_iter()
        .chain(self.list_keypad_buttons.iter().flat_map(RockerButtonNode::composers))
    }
}

/// Icon dictionary of a styled button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "$type", rename = "Dictionary`2")]
pub struct StyleProperties {
    #[serde(rename = "STYLE_PROP_ICON")]
    pub icon: Option<Guid>,
    #[serde(rename = "STYLE_PROP_ROCKER_ICON")]
    pub rocker_icon: Option<Guid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "$type", rename = "RockerKeypadButton", rename_all = "PascalCase")]
pub struct RockerButtonNode {
    pub style_properties_serializable: Option<StyleProperties>,
    pub double_press_delay: bool,
    pub target_double_object_guid: Guid,
    #[serde(rename = "ModoDoublePress")]
    pub double_press_mode: u8,
    pub command_double_press: u8,
    pub port_number_double_press: u16,
    pub can_hold: bool,
    pub guid: Guid,
    pub target_object_guid: Guid,
    #[serde(rename = "Modo")]
    pub mode: u8,
    pub command_on: u8,
    pub command_off: u8,
    pub port_number: u16,
    pub unit_controle_led: u32,
    pub led_color: u32,
    pub vincled: bool,
    pub time_feed_back: u32,
    pub unit_key: UnitComposer,
    pub unit_led: UnitComposer,
    pub unit_secondary_key: UnitComposer,
    pub unit_secondary_led: UnitComposer,
    pub button_style_guid: Guid,
    pub engraver_text: Option<String>,
    pub automode: bool,
}

impl RockerButtonNode {
    pub fn composers(&self) -> impl Iterator<Item = &UnitComposer> {
        [
            &self.unit_key,
            &self.unit_led,
            &self.unit_secondary_key,
            &self.unit_secondary_led,
        ]
        .into_iter()
    }
}
