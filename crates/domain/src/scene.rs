//! Scene: an ordered list of actions recalled together.
//!
//! A scene is either a lighting scene or, with `movers` set, a shade scene.
//! Actions target a single circuit or a whole room ("group" action); group
//! actions expand to the room's circuits of the scene's member class, and
//! may carry per-circuit [`CustomAction`] overrides.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::circuit::CircuitClass;
use crate::error::{PanelError, ValidationError};
use crate::id::{CircuitId, Guid, RoomId, SceneId};
use crate::project::ProjectSnapshot;

/// A recallable set of actions owned by a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub id: SceneId,
    pub name: String,
    /// GUID persisted by a previous compile, reused when still free.
    #[serde(default)]
    pub guid: Option<Guid>,
    /// Shade scene: every member must be a shade.
    #[serde(default)]
    pub movers: bool,
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// One step of a scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub target: ActionTarget,
    /// Target level, 0 to 100.
    #[serde(default)]
    pub level: u8,
    /// Per-circuit overrides of a group action.
    #[serde(default)]
    pub overrides: Vec<CustomAction>,
}

/// What an action drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionTarget {
    Circuit(CircuitId),
    Room(RoomId),
}

/// Override of one group member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomAction {
    pub circuit: CircuitId,
    pub enable: bool,
    #[serde(default)]
    pub level: u8,
}

impl Scene {
    /// Circuit class a group action of this scene drives.
    #[must_use]
    pub fn member_class(&self) -> CircuitClass {
        if self.movers {
            CircuitClass::Shade
        } else {
            CircuitClass::Light
        }
    }

    /// Check the shade-only rule of movers scenes.
    ///
    /// Group members are the target room's non-HVAC circuits. Circuits the
    /// project does not know are ignored; they are dropped at compile time.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::MoversSceneEmpty`] when a movers scene has no action
    /// - [`ValidationError::MoversRequireShades`] for the first non-shade member
    pub fn check_movers(&self, project: &ProjectSnapshot) -> Result<(), ValidationError> {
        if !self.movers {
            return Ok(());
        }
        if self.actions.is_empty() {
            return Err(ValidationError::MoversSceneEmpty);
        }
        for action in &self.actions {
            match action.target {
                ActionTarget::Circuit(id) => {
                    if let Some(circuit) = project.circuit(id)
                        && circuit.class() != CircuitClass::Shade
                    {
                        return Err(ValidationError::MoversRequireShades { circuit: id });
                    }
                }
                ActionTarget::Room(room_id) => {
                    let Some(room) = project.room(room_id) else {
                        continue;
                    };
                    if let Some(circuit) = room
                        .circuits
                        .iter()
                        .filter(|c| c.class() != CircuitClass::Hvac)
                        .find(|c| c.class() != CircuitClass::Shade)
                    {
                        return Err(ValidationError::MoversRequireShades {
                            circuit: circuit.id,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Check domain invariants against the project the scene belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Validation`] when:
    /// - `name` is empty ([`ValidationError::EmptyName`])
    /// - the movers rule fails (see [`Scene::check_movers`])
    /// - a lighting scene targets an HVAC circuit ([`ValidationError::HvacInLightingScene`])
    /// - a circuit is targeted twice ([`ValidationError::DuplicateSceneMember`])
    pub fn validate(&self, project: &ProjectSnapshot) -> Result<(), PanelError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName { entity: "scene" }.into());
        }
        self.check_movers(project)?;

        let mut seen = HashSet::new();
        for id in self.circuit_targets() {
            if !self.movers
                && project
                    .circuit(id)
                    .is_some_and(|c| c.class() == CircuitClass::Hvac)
            {
                return Err(ValidationError::HvacInLightingScene { circuit: id }.into());
            }
            if !seen.insert(id) {
                return Err(ValidationError::DuplicateSceneMember { circuit: id }.into());
            }
        }
        Ok(())
    }

    /// Circuits targeted by single-circuit actions, in action order.
    pub fn circuit_targets(&self) -> impl Iterator<Item = CircuitId> + '_ {
        self.actions.iter().filter_map(|a| match a.target {
            ActionTarget::Circuit(id) => Some(id),
            ActionTarget::Room(_) => None,
        })
    }
}

impl Action {
    #[must_use]
    pub fn circuit(id: CircuitId, level: u8) -> Self {
        Self {
            target: ActionTarget::Circuit(id),
            level,
            overrides: Vec::new(),
        }
    }

    #[must_use]
    pub fn room(id: RoomId, level: u8) -> Self {
        Self {
            target: ActionTarget::Room(id),
            level,
            overrides: Vec::new(),
        }
    }

    /// Override for `circuit`, if one was given.
    #[must_use]
    pub fn override_for(&self, circuit: CircuitId) -> Option<&CustomAction> {
        self.overrides.iter().find(|o| o.circuit == circuit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::tests::{living_room_project, LIGHT, SHADE};

    fn scene(movers: bool, actions: Vec<Action>) -> Scene {
        Scene {
            id: SceneId::new(1),
            name: "Cinema".to_string(),
            guid: None,
            movers,
            actions,
        }
    }

    #[test]
    fn should_accept_movers_scene_when_every_member_is_a_shade() {
        let project = living_room_project();
        let scene = scene(true, vec![Action::circuit(SHADE, 100)]);
        assert!(scene.validate(&project).is_ok());
    }

    #[test]
    fn should_fail_when_movers_scene_mixes_shade_and_light() {
        let project = living_room_project();
        let scene = scene(
            true,
            vec![Action::circuit(SHADE, 100), Action::circuit(LIGHT, 50)],
        );
        assert_eq!(
            scene.check_movers(&project),
            Err(ValidationError::MoversRequireShades { circuit: LIGHT })
        );
    }

    #[test]
    fn should_fail_when_movers_scene_is_empty() {
        let project = living_room_project();
        assert_eq!(
            scene(true, vec![]).check_movers(&project),
            Err(ValidationError::MoversSceneEmpty)
        );
    }

    #[test]
    fn should_fail_when_movers_group_room_contains_a_light() {
        let project = living_room_project();
        let room = project.areas[0].rooms[0].id;
        let scene = scene(true, vec![Action::room(room, 0)]);
        assert!(matches!(
            scene.check_movers(&project),
            Err(ValidationError::MoversRequireShades { .. })
        ));
    }

    #[test]
    fn should_fail_when_lighting_scene_targets_hvac() {
        let project = living_room_project();
        let hvac = crate::project::tests::HVAC;
        let result = scene(false, vec![Action::circuit(hvac, 100)]).validate(&project);
        assert!(matches!(
            result,
            Err(PanelError::Validation(ValidationError::HvacInLightingScene { .. }))
        ));
    }

    #[test]
    fn should_fail_when_circuit_is_targeted_twice() {
        let project = living_room_project();
        let result = scene(
            false,
            vec![Action::circuit(LIGHT, 100), Action::circuit(LIGHT, 20)],
        )
        .validate(&project);
        assert!(matches!(
            result,
            Err(PanelError::Validation(ValidationError::DuplicateSceneMember { .. }))
        ));
    }

    #[test]
    fn should_ignore_unknown_circuits_when_checking_movers() {
        let project = living_room_project();
        let scene = scene(true, vec![Action::circuit(CircuitId::new(999), 100)]);
        assert!(scene.check_movers(&project).is_ok());
    }

    #[test]
    fn should_deserialize_group_action_with_overrides() {
        let json = r#"{"target":{"room":2},"level":80,"overrides":[{"circuit":5,"enable":false}]}"#;
        let action: Action = serde_json::from_str(json).unwrap();
        assert_eq!(action.target, ActionTarget::Room(RoomId::new(2)));
        assert_eq!(action.override_for(CircuitId::new(5)).map(|o| o.enable), Some(false));
    }
}
