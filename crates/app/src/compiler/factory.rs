//! Node factory: builds module and keypad nodes with their slots and
//! unit composers, drawing unit ids from the identifier pools.

use panelforge_domain::catalog::{ModuleType, SlotKind};
use panelforge_domain::document::{
    KEYPAD_DRIVER, KEYPAD_PROFILE, KeypadNode, ModuleNode, ModuleNodeKind, RockerButtonNode,
    SlotNode, StyleProperties, Unit, UnitComposer,
};
use panelforge_domain::error::AllocationError;
use panelforge_domain::id::Guid;
use panelforge_domain::keypad::{Button, ButtonStyle, Keypad, NEUTRAL_MODE};

use super::allocator::{IdentifierPools, Pool};

/// Name, port number, port type, IO, kind and not-programmable flag of
/// the status composers every controller exposes.
const CONTROLLER_COMPOSERS: [(&str, u16, u16, u8, u8, bool); 19] = [
    ("Ativo", 1, 0, 0, 0, false),
    ("Modulos HSNET ativos", 1, 600, 0, 1, false),
    ("Modulos HSNET registrados", 2, 600, 0, 1, false),
    ("Data", 3, 600, 1, 1, true),
    ("Hora", 4, 600, 1, 1, true),
    ("DST", 2, 0, 0, 0, false),
    ("Nascer do Sol", 5, 600, 1, 1, true),
    ("Por do sol", 6, 600, 1, 1, true),
    ("Posição Solar", 7, 600, 0, 1, false),
    ("Flag RTC", 8, 600, 0, 1, false),
    ("Flag SNTP", 9, 600, 0, 1, false),
    ("Flag MYIP", 10, 600, 0, 1, false),
    ("Flag DDNS", 11, 600, 0, 1, false),
    ("Web IP", 1, 1100, 0, 1, false),
    ("Ultima inicializacao", 2, 1100, 0, 1, false),
    ("Tensao", 12, 600, 0, 1, false),
    ("Corrente", 13, 600, 0, 1, false),
    ("Power", 14, 600, 0, 1, false),
    ("Temperatura", 15, 600, 0, 1, false),
];

/// Name, port number, port type and kind of the IR composers of an HVAC
/// emitter. All are outputs.
const IR_COMPOSERS: [(&str, u16, u16, u8); 7] = [
    ("Power", 1, 600, 1),
    ("Mode", 2, 600, 1),
    ("Fan Speed", 4, 600, 1),
    ("Swing", 5, 600, 1),
    ("Temp Up", 11, 600, 1),
    ("Temp Down", 12, 600, 1),
    ("Display/Light", 3, 100, 0),
];

/// Everything needed to materialize one module.
#[derive(Debug, Clone)]
pub struct ModuleParams {
    pub name: String,
    pub module_type: ModuleType,
    pub guid: Guid,
    pub hsnet: u16,
    pub dev_id: u16,
    pub ip_address: Option<String>,
    pub logic_server: bool,
    pub notes: Option<String>,
}

fn unit(pools: &mut IdentifierPools, preferred: Option<u32>) -> Result<Unit, AllocationError> {
    pools.allocate(Pool::UnitId, preferred).map(Unit::new)
}

/// Build a module node.
///
/// Controllers ask for their fixed per-model unit-id block; the allocator
/// falls back to free ids when a value is already taken.
///
/// # Errors
///
/// Returns [`AllocationError::PoolExhausted`] when unit ids run out.
pub fn module_node(
    params: ModuleParams,
    pools: &mut IdentifierPools,
) -> Result<ModuleNode, AllocationError> {
    let module_type = params.module_type;
    let mut kind = ModuleNodeKind::Module;
    let mut unit_composers = None;
    let mut sub_item_composers = None;
    let mut gateway_item_composers = None;

    if let Some(profile) = module_type.controller_profile() {
        let mut composers = Vec::with_capacity(CONTROLLER_COMPOSERS.len());
        for ((name, port, port_type, io, composer_kind, locked), preferred) in
            CONTROLLER_COMPOSERS.into_iter().zip(profile.unit_ids)
        {
            composers.push(
                UnitComposer::new(name, unit(pools, Some(preferred))?, port, port_type, composer_kind, io)
                    .not_programmable(locked),
            );
        }
        unit_composers = Some(composers);
    } else {
        match module_type {
            ModuleType::Lx4 => {
                let mut composers = Vec::with_capacity(16);
                for shade in 1..=4 {
                    for position in 1..=4u16 {
                        let primary = position % 2 == 1;
                        composers.push(UnitComposer::new(
                            format!("Opening Percentage {shade} {position}"),
                            unit(pools, None)?,
                            if primary { 1 } else { 5 },
                            6,
                            1,
                            u8::from(primary),
                        ));
                    }
                }
                unit_composers = Some(composers);
            }
            ModuleType::Sa1 => {
                let mut composers = Vec::with_capacity(IR_COMPOSERS.len());
                for (name, port, port_type, composer_kind) in IR_COMPOSERS {
                    composers.push(UnitComposer::new(
                        name,
                        unit(pools, None)?,
                        port,
                        port_type,
                        composer_kind,
                        1,
                    ));
                }
                kind = ModuleNodeKind::Hvac;
                sub_item_composers = Some(vec![composers]);
                gateway_item_composers = Some(Vec::new());
            }
            _ => {}
        }
    }

    let slots = module_type
        .slots()
        .iter()
        .map(|layout| SlotNode {
            capacity: layout.capacity,
            slot_type: layout.kind.type_code(),
            initial_port: 1,
            io: layout.io,
            unit_composers: None,
            sub_items: if layout.kind == SlotKind::Acnet {
                vec![Guid::ZERO]
            } else {
                vec![Guid::ZERO; usize::from(layout.capacity)]
            },
            name: layout.kind.name().to_string(),
        })
        .collect();

    let ip = params.ip_address.unwrap_or_default();
    Ok(ModuleNode {
        kind,
        sub_item_composers,
        gateway_item_composers,
        name: params.name,
        driver_guid: module_type.driver_guid(),
        guid: params.guid,
        ip_address: ip.clone(),
        hsnet_address: params.hsnet,
        poll_timing: 0,
        disabled: false,
        remote_port: 0,
        remote_ip_address: ip,
        notes: params.notes,
        logic_server: params.logic_server,
        dev_id: params.dev_id,
        dev_id_slave: 0,
        unit_composers,
        slots,
        smart_group: 1,
        user_interface_guid: Guid::ZERO,
        pir_sensor_report_enable: false,
        pir_sensor_report_id: 0,
    })
}

/// A button with its minted GUID and resolved target.
#[derive(Debug, Clone, Copy)]
pub struct ButtonPlan<'a> {
    pub button: &'a Button,
    pub guid: Guid,
    /// `None` leaves the button unlinked in neutral mode.
    pub target: Option<Guid>,
}

fn style_properties(style: ButtonStyle) -> Option<StyleProperties> {
    match style {
        ButtonStyle::Plain => None,
        ButtonStyle::Icon(icon) => Some(StyleProperties {
            icon: Some(icon),
            rocker_icon: None,
        }),
        ButtonStyle::Rocker(rocker) => Some(StyleProperties {
            icon: None,
            rocker_icon: Some(rocker.icon_guid()),
        }),
        ButtonStyle::RockerWithIcon { rocker, icon } => Some(StyleProperties {
            icon: Some(icon),
            rocker_icon: Some(rocker.icon_guid()),
        }),
    }
}

fn button_node(
    plan: ButtonPlan<'_>,
    pools: &mut IdentifierPools,
) -> Result<RockerButtonNode, AllocationError> {
    let button = plan.button;
    let primary = u16::from(button.position);
    let secondary = primary + 4;
    let style = button.style();
    let (target, mode) = match plan.target {
        Some(guid) => (guid, button.mode),
        None => (Guid::ZERO, NEUTRAL_MODE),
    };

    Ok(RockerButtonNode {
        style_properties_serializable: style_properties(style),
        double_press_delay: false,
        target_double_object_guid: Guid::ZERO,
        double_press_mode: button.double_press_mode.unwrap_or(NEUTRAL_MODE),
        command_double_press: button.double_press_command.unwrap_or(0),
        port_number_double_press: 0,
        can_hold: button.can_hold,
        guid: plan.guid,
        target_object_guid: target,
        mode,
        command_on: button.command_on,
        command_off: button.command_off,
        port_number: 0,
        unit_controle_led: 0,
        led_color: 0,
        vincled: false,
        time_feed_back: 0,
        unit_key: UnitComposer::new("UnitKey", unit(pools, None)?, primary, 300, 0, 0),
        unit_led: UnitComposer::new("UnitLed", unit(pools, None)?, primary, 200, 1, 1),
        unit_secondary_key: UnitComposer::new(
            "UnitSecondaryKey",
            unit(pools, None)?,
            secondary,
            300,
            0,
            0,
        ),
        unit_secondary_led: UnitComposer::new(
            "UnitSecondaryLed",
            unit(pools, None)?,
            secondary,
            200,
            1,
            1,
        ),
        button_style_guid: style.guid(),
        engraver_text: button.engraver_text.clone(),
        automode: true,
    })
}

fn upper_or_white(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("WHITE")
        .to_uppercase()
}

/// Build an RQR-K keypad node. Buttons are emitted in position order.
///
/// # Errors
///
/// Returns [`AllocationError::PoolExhausted`] when unit ids run out.
pub fn keypad_node(
    keypad: &Keypad,
    guid: Guid,
    hsnet: u16,
    dev_id: u16,
    mut buttons: Vec<ButtonPlan<'_>>,
    pools: &mut IdentifierPools,
) -> Result<KeypadNode, AllocationError> {
    let mut composer = |name: &str, port: u16, port_type: u16, kind: u8, io: u8| {
        unit(pools, None).map(|u| UnitComposer::new(name, u, port, port_type, kind, io))
    };

    let unit_digital_input1 = composer("UnitEntradaDigital1", 1, 0, 0, 0)?;
    let unit_digital_input2 = composer("UnitEntradaDigital2", 2, 0, 0, 0)?;
    let unit_any_key = composer("UnitAnyKey", 3, 0, 0, 0)?;
    let unit_brightness_color1 = composer("UnitBrightnessColor1", 1, 600, 1, 1)?;
    let unit_brightness_color2 = composer("UnitBrightnessColor2", 2, 600, 1, 1)?;
    let unit_beep_profile = composer("UnitBeepProfile", 3, 600, 1, 1)?;
    let unit_volume_profile = composer("UnitVolumeProfile", 4, 600, 1, 1)?;
    let unit_volume_key = composer("UnitVolumeKey", 5, 0, 0, 0)?;
    let unit_blocked_keypad = composer("UnitBlockedKeypad", 1, 100, 0, 1)?;
    let unit_pin32 = composer("UnitPIN32", 1, 1100, 1, 0)?;

    buttons.sort_by_key(|plan| plan.button.position);
    let mut list_keypad_buttons = Vec::with_capacity(buttons.len());
    for plan in buttons {
        list_keypad_buttons.push(button_node(plan, pools)?);
    }

    Ok(KeypadNode {
        driver_guid: KEYPAD_DRIVER,
        module_interface: false,
        keypad_4x4: false,
        hsnet_address: hsnet,
        input1_switch_type: 0,
        input2_switch_type: 0,
        unit_digital_input1,
        unit_digital_input2,
        unit_any_key,
        bright_unit: 0,
        unit_brightness_color1,
        unit_brightness_color2,
        unit_beep_profile,
        unit_volume_profile,
        unit_volume_key,
        unit_blocked_keypad,
        unit_pin32,
        night_mode_group: 0,
        light_sensor_mode: 0,
        light_sensor_master_id: 0,
        dev_id,
        list_keypad_buttons,
        list_keypad_buttons_layout2: Vec::new(),
        profile_guid: KEYPAD_PROFILE,
        button_count_layout2: 0,
        button_layout2: 0,
        slots: Vec::new(),
        hold: 0,
        button_layout1: keypad.layout_code(),
        model_name: keypad
            .model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| "RQR-K".to_string()),
        color: upper_or_white(keypad.color.as_deref()),
        button_color: upper_or_white(keypad.button_color.as_deref()),
        name: keypad.name.clone(),
        notes: keypad.notes.clone(),
        guid,
        button_count: keypad.button_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use panelforge_domain::id::{ButtonId, KeypadId};
    use panelforge_domain::keypad::RockerStyle;

    fn params(module_type: ModuleType) -> ModuleParams {
        ModuleParams {
            name: module_type.code().to_string(),
            module_type,
            guid: Guid::from_u128(1),
            hsnet: 101,
            dev_id: 2,
            ip_address: None,
            logic_server: false,
            notes: None,
        }
    }

    #[test]
    fn should_give_controller_its_fixed_unit_block() {
        let mut pools = IdentifierPools::new();
        let node = module_node(params(ModuleType::AqlGvM4), &mut pools).unwrap();
        let ids: Vec<u32> = node.units().map(|u| u.id).collect();
        assert_eq!(ids, (39..=57).collect::<Vec<_>>());
        assert_eq!(node.slot("ACNET/RNET").unwrap().capacity, 24);
        assert_eq!(node.slot("Scene").unwrap().sub_items.len(), 96);
    }

    #[test]
    fn should_fall_back_when_second_controller_block_is_taken() {
        let mut pools = IdentifierPools::new();
        module_node(params(ModuleType::AqlGvM4), &mut pools).unwrap();
        let second = module_node(params(ModuleType::AqlGvM4), &mut pools).unwrap();
        let ids: Vec<u32> = second.units().map(|u| u.id).collect();
        assert_eq!(ids.len(), 19);
        assert!(ids.iter().all(|id| !(39..=57).contains(id)));
    }

    #[test]
    fn should_pad_channel_slots_with_zero_guids() {
        let mut pools = IdentifierPools::new();
        let node = module_node(params(ModuleType::Rl12), &mut pools).unwrap();
        let slot = node.slot("Load ON/OFF").unwrap();
        assert_eq!(slot.sub_items, vec![Guid::ZERO; 12]);
        assert_eq!(node.slot("PNET").unwrap().sub_items.len(), 6);
        assert!(node.unit_composers.is_none());
    }

    #[test]
    fn should_build_hvac_module_with_ir_composers() {
        let mut pools = IdentifierPools::new();
        let node = module_node(params(ModuleType::Sa1), &mut pools).unwrap();
        assert_eq!(node.kind, ModuleNodeKind::Hvac);
        assert_eq!(node.units().count(), 7);
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["$type"], "ModuleHVAC");
        assert!(json.get("UnitComposers").is_none());
    }

    #[test]
    fn should_build_sixteen_opening_composers_for_shade_module() {
        let mut pools = IdentifierPools::new();
        let node = module_node(params(ModuleType::Lx4), &mut pools).unwrap();
        let composers = node.unit_composers.as_ref().unwrap();
        assert_eq!(composers.len(), 16);
        assert_eq!(composers[1].name, "Opening Percentage 1 2");
        assert_eq!(composers[1].port_number, 5);
    }

    #[test]
    fn should_emit_unlinked_button_in_neutral_mode() {
        let mut pools = IdentifierPools::new();
        let keypad = Keypad {
            id: KeypadId::new(1),
            name: "Entrada".to_string(),
            model: None,
            color: Some("black".to_string()),
            button_color: None,
            button_count: 2,
            hsnet: None,
            dev_id: None,
            controller: None,
            notes: None,
            buttons: Vec::new(),
        };
        let mut button = Button::new(ButtonId::new(1), 2);
        button.mode = 1;
        button.rocker = Some(RockerStyle::UpDown);
        let plan = ButtonPlan {
            button: &button,
            guid: Guid::from_u128(9),
            target: None,
        };
        let node = keypad_node(&keypad, Guid::from_u128(8), 110, 110, vec![plan], &mut pools).unwrap();
        assert_eq!(node.button_layout1, 6);
        assert_eq!(node.color, "BLACK");
        assert_eq!(node.button_color, "WHITE");
        let button = &node.list_keypad_buttons[0];
        assert!(button.target_object_guid.is_zero());
        assert_eq!(button.mode, NEUTRAL_MODE);
        assert_eq!(button.unit_secondary_key.port_number, 6);
        assert_eq!(
            button.button_style_guid.to_string(),
            "13000000-0000-0000-0000-000000000004"
        );
        assert_eq!(node.composers().count(), 14);
    }
}
