//! Registry consistency: rewrites every controller's subscriber list from
//! the structure actually built.

use panelforge_domain::catalog::SlotKind;
use panelforge_domain::id::Guid;
use serde::Serialize;

use super::Issue;
use super::hierarchy::{Hierarchy, ModuleIdx};

/// Registry size of one controller after the pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrySummary {
    pub controller: String,
    pub guid: Guid,
    pub subscribers: usize,
}

/// Replace the ACNET registry of every controller with exactly the GUIDs of
/// its child modules followed by its keypads, then a [`Guid::ZERO`]
/// terminator.
///
/// A registry longer than the slot capacity is still written in full; the
/// overflow is reported as an [`Issue`].
pub fn synchronize(hierarchy: &mut Hierarchy, issues: &mut Vec<Issue>) -> Vec<RegistrySummary> {
    let controllers: Vec<ModuleIdx> = hierarchy
        .modules()
        .filter(|(_, m)| m.module_type.is_controller())
        .map(|(idx, _)| idx)
        .collect();

    let mut summaries = Vec::with_capacity(controllers.len());
    for controller in controllers {
        let mut subscribers: Vec<Guid> = hierarchy
            .modules()
            .filter(|(idx, m)| m.parent == Some(controller) && *idx != controller)
            .map(|(_, m)| m.node.guid)
            .collect();
        subscribers.extend(
            hierarchy
                .interfaces()
                .filter(|i| i.controller == Some(controller))
                .map(|i| i.guid),
        );

        let node = &mut hierarchy.module_mut(controller).node;
        let (name, guid) = (node.name.clone(), node.guid);
        let Some(slot) = node.slot_mut(SlotKind::Acnet.name()) else {
            continue;
        };
        if subscribers.len() > usize::from(slot.capacity) {
            issues.push(Issue::new(
                format!("controller {name:?}"),
                format!(
                    "{} subscribers exceed the registry capacity of {}",
                    subscribers.len(),
                    slot.capacity
                ),
            ));
        }
        let count = subscribers.len();
        slot.sub_items = subscribers;
        slot.sub_items.push(Guid::ZERO);

        tracing::debug!(controller = %name, subscribers = count, "registry synchronized");
        summaries.push(RegistrySummary {
            controller: name,
            guid,
            subscribers: count,
        });
    }
    summaries
}
