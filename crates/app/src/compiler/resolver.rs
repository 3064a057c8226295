//! Cross-reference resolver: turns scene actions and button targets into
//! GUID references.
//!
//! Dangling user references never fail the compile: the action is dropped
//! or the button is left unlinked, and an [`Issue`] records why.

use std::collections::HashSet;

use panelforge_domain::circuit::CircuitClass;
use panelforge_domain::document::{
    ACTION_CIRCUIT, ACTION_GROUP, ActionNode, CustomActionValue, CustomActionValues, SceneNode,
    Unit,
};
use panelforge_domain::error::ValidationError;
use panelforge_domain::id::Guid;
use panelforge_domain::keypad::{Button, ButtonTarget};
use panelforge_domain::project::ProjectSnapshot;
use panelforge_domain::scene::{Action, ActionTarget, Scene};

use super::Issue;
use super::guid_index::{GuidIndex, SourceKey};

const MAX_LEVEL: u8 = 100;

/// Build the node of `scene`, already registered as `guid`.
///
/// # Errors
///
/// Returns the movers validation failure of the scene; the caller skips
/// the scene.
pub fn resolve_scene(
    scene: &Scene,
    guid: Guid,
    unit: Unit,
    project: &ProjectSnapshot,
    index: &GuidIndex,
    issues: &mut Vec<Issue>,
) -> Result<SceneNode, ValidationError> {
    scene.check_movers(project)?;

    let subject = format!("scene {:?}", scene.name);
    let mut node = SceneNode::new(guid, scene.name.clone(), unit, scene.movers);
    let mut seen = HashSet::new();

    for action in &scene.actions {
        let resolved = match action.target {
            ActionTarget::Circuit(id) => {
                let Some(circuit) = project.circuit(id) else {
                    issues.push(Issue::new(&subject, format!("dropped action on unknown circuit {id}")));
                    continue;
                };
                if !scene.movers && circuit.class() == CircuitClass::Hvac {
                    issues.push(Issue::new(
                        &subject,
                        format!("dropped HVAC circuit {} from lighting scene", circuit.identifier),
                    ));
                    continue;
                }
                if !seen.insert(id) {
                    issues.push(Issue::new(
                        &subject,
                        format!("dropped repeated action on circuit {}", circuit.identifier),
                    ));
                    continue;
                }
                index
                    .get(SourceKey::Circuit(id))
                    .map(|target| circuit_action(action, target, project, index))
            }
            ActionTarget::Room(id) => index
                .get(SourceKey::Room(id))
                .map(|target| group_action(action, target, scene.member_class(), project, index)),
        };

        match resolved {
            Some(action_node) => node.actions.push(action_node),
            None => issues.push(Issue::new(
                &subject,
                format!("dropped action with unresolved target {:?}", action.target),
            )),
        }
    }
    Ok(node)
}

fn circuit_action(
    action: &Action,
    target: Guid,
    project: &ProjectSnapshot,
    index: &GuidIndex,
) -> ActionNode {
    let mut values = CustomActionValues::default();
    for custom in &action.overrides {
        if project.circuit(custom.circuit).is_none() {
            continue;
        }
        if let Some(guid) = index.get(SourceKey::Circuit(custom.circuit)) {
            values.insert(
                guid,
                CustomActionValue {
                    enable: custom.enable,
                    level: custom.level.min(MAX_LEVEL),
                },
            );
        }
    }
    ActionNode {
        level: action.level.min(MAX_LEVEL),
        action_type: ACTION_CIRCUIT,
        custom_action_values_serialized: (!values.is_empty()).then_some(values),
        target_guid: target,
    }
}

/// Expand a whole-room action.
///
/// Members of `member_class` follow the action level unless overridden;
/// every other circuit of the room gets an explicit disabled entry so the
/// group never drives it implicitly.
fn group_action(
    action: &Action,
    target: Guid,
    member_class: CircuitClass,
    project: &ProjectSnapshot,
    index: &GuidIndex,
) -> ActionNode {
    let mut values = CustomActionValues::default();
    let ActionTarget::Room(room_id) = action.target else {
        return circuit_action(action, target, project, index);
    };
    if let Some(room) = project.room(room_id) {
        for circuit in &room.circuits {
            let Some(guid) = index.get(SourceKey::Circuit(circuit.id)) else {
                continue;
            };
            if circuit.class() == member_class {
                if let Some(custom) = action.override_for(circuit.id) {
                    values.insert(
                        guid,
                        CustomActionValue {
                            enable: custom.enable,
                            level: custom.level.min(MAX_LEVEL),
                        },
                    );
                }
            } else {
                values.insert(guid, CustomActionValue::DISABLED);
            }
        }
    }
    ActionNode {
        level: action.level.min(MAX_LEVEL),
        action_type: ACTION_GROUP,
        custom_action_values_serialized: (!values.is_empty()).then_some(values),
        target_guid: target,
    }
}

/// Resolve what a button points at.
///
/// `Ok(None)` is an unprogrammed button.
///
/// # Errors
///
/// Returns a description of the dangling target; the caller emits the
/// button unlinked.
pub fn resolve_button(button: &Button, index: &GuidIndex) -> Result<Option<Guid>, String> {
    match button.target {
        None => Ok(None),
        Some(ButtonTarget::Circuit(id)) => index
            .get(SourceKey::Circuit(id))
            .map(Some)
            .ok_or_else(|| format!("button {} targets unknown circuit {id}", button.position)),
        Some(ButtonTarget::Scene(id)) => index
            .get(SourceKey::Scene(id))
            .map(Some)
            .ok_or_else(|| {
                format!(
                    "button {} targets scene {id}, which is unknown or failed validation",
                    button.position
                )
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panelforge_domain::circuit::Circuit;
    use panelforge_domain::id::{AreaId, ButtonId, CircuitId, RoomId, SceneId};
    use panelforge_domain::project::{Area, Room};
    use panelforge_domain::scene::CustomAction;

    const LIGHT_A: CircuitId = CircuitId::new(1);
    const LIGHT_B: CircuitId = CircuitId::new(2);
    const SHADE: CircuitId = CircuitId::new(3);
    const HVAC: CircuitId = CircuitId::new(4);
    const ROOM: RoomId = RoomId::new(10);

    fn project() -> ProjectSnapshot {
        let circuits = vec![
            Circuit::builder().id(LIGHT_A).identifier("L1").light(true, 40.0).build().unwrap(),
            Circuit::builder().id(LIGHT_B).identifier("L2").light(false, 40.0).build().unwrap(),
            Circuit::builder().id(SHADE).identifier("P1").shade().build().unwrap(),
            Circuit::builder().id(HVAC).identifier("AC1").hvac().build().unwrap(),
        ];
        let mut project = ProjectSnapshot::new("Casa");
        project.areas.push(Area {
            id: AreaId::new(1),
            name: "Térreo".to_string(),
            rooms: vec![Room {
                id: ROOM,
                name: "Suíte".to_string(),
                boards: vec![],
                circuits,
                keypads: vec![],
                scenes: vec![],
            }],
        });
        project
    }

    fn index(project: &ProjectSnapshot) -> GuidIndex {
        let mut index = GuidIndex::new(project.namespace());
        index.mint(SourceKey::Room(ROOM), None);
        for circuit in project.circuits() {
            index.mint(SourceKey::Circuit(circuit.id), None);
        }
        index
    }

    fn scene(movers: bool, actions: Vec<Action>) -> Scene {
        Scene {
            id: SceneId::new(1),
            name: "Cena".to_string(),
            guid: None,
            movers,
            actions,
        }
    }

    fn resolve(scene: &Scene, issues: &mut Vec<Issue>) -> Result<SceneNode, ValidationError> {
        let project = project();
        let index = index(&project);
        resolve_scene(scene, Guid::from_u128(9), Unit::new(1), &project, &index, issues)
    }

    #[test]
    fn should_disable_every_non_light_when_expanding_lighting_group() {
        let project = project();
        let index = index(&project);
        let mut issues = Vec::new();
        let node = resolve_scene(
            &scene(false, vec![Action::room(ROOM, 80)]),
            Guid::from_u128(9),
            Unit::new(1),
            &project,
            &index,
            &mut issues,
        )
        .unwrap();
        let action = &node.actions[0];
        assert_eq!(action.action_type, ACTION_GROUP);
        let values = action.custom_action_values_serialized.as_ref().unwrap();
        for id in [SHADE, HVAC] {
            let guid = index.get(SourceKey::Circuit(id)).unwrap();
            assert_eq!(values.get(guid), Some(&CustomActionValue::DISABLED));
        }
        let light = index.get(SourceKey::Circuit(LIGHT_A)).unwrap();
        assert!(values.get(light).is_none());
        assert!(issues.is_empty());
    }

    #[test]
    fn should_keep_member_override_when_expanding_group() {
        let project = project();
        let index = index(&project);
        let mut action = Action::room(ROOM, 80);
        action.overrides.push(CustomAction {
            circuit: LIGHT_B,
            enable: true,
            level: 20,
        });
        let node = resolve_scene(
            &scene(false, vec![action]),
            Guid::from_u128(9),
            Unit::new(1),
            &project,
            &index,
            &mut Vec::new(),
        )
        .unwrap();
        let values = node.actions[0].custom_action_values_serialized.as_ref().unwrap();
        let guid = index.get(SourceKey::Circuit(LIGHT_B)).unwrap();
        assert_eq!(values.get(guid), Some(&CustomActionValue { enable: true, level: 20 }));
    }

    #[test]
    fn should_drop_hvac_action_from_lighting_scene() {
        let mut issues = Vec::new();
        let node = resolve(
            &scene(false, vec![Action::circuit(HVAC, 100), Action::circuit(LIGHT_A, 50)]),
            &mut issues,
        )
        .unwrap();
        assert_eq!(node.actions.len(), 1);
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn should_drop_action_on_unknown_circuit() {
        let mut issues = Vec::new();
        let node = resolve(&scene(false, vec![Action::circuit(CircuitId::new(99), 100)]), &mut issues)
            .unwrap();
        assert!(node.actions.is_empty());
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn should_drop_repeated_circuit_action() {
        let mut issues = Vec::new();
        let node = resolve(
            &scene(false, vec![Action::circuit(LIGHT_A, 100), Action::circuit(LIGHT_A, 10)]),
            &mut issues,
        )
        .unwrap();
        assert_eq!(node.actions.len(), 1);
        assert_eq!(node.actions[0].level, 100);
    }

    #[test]
    fn should_fail_when_movers_scene_mixes_shade_and_light() {
        let result = resolve(
            &scene(true, vec![Action::circuit(SHADE, 100), Action::circuit(LIGHT_A, 100)]),
            &mut Vec::new(),
        );
        assert_eq!(
            result.unwrap_err(),
            ValidationError::MoversRequireShades { circuit: LIGHT_A }
        );
    }

    #[test]
    fn should_use_movers_operator_when_scene_only_moves_shades() {
        let node = resolve(&scene(true, vec![Action::circuit(SHADE, 0)]), &mut Vec::new()).unwrap();
        assert_eq!(node.operator, 6);
        assert_eq!(node.actions[0].level, 0);
    }

    #[test]
    fn should_clamp_level_to_one_hundred() {
        let node = resolve(&scene(false, vec![Action::circuit(LIGHT_A, 250)]), &mut Vec::new()).unwrap();
        assert_eq!(node.actions[0].level, 100);
    }

    #[test]
    fn should_report_dangling_button_target() {
        let project = project();
        let index = index(&project);
        let mut button = Button::new(ButtonId::new(1), 1);
        button.target = Some(ButtonTarget::Circuit(CircuitId::new(404)));
        assert!(resolve_button(&button, &index).is_err());
        button.target = Some(ButtonTarget::Circuit(LIGHT_A));
        assert_eq!(
            resolve_button(&button, &index).unwrap(),
            index.get(SourceKey::Circuit(LIGHT_A))
        );
        button.target = None;
        assert_eq!(resolve_button(&button, &index).unwrap(), None);
    }
}
