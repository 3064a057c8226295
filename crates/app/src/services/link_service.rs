//! Link service: manual binding of one circuit to a module channel.

use panelforge_domain::circuit::Link;
use panelforge_domain::error::{LinkError, PanelError, UnresolvedReference};
use panelforge_domain::id::CircuitId;

use crate::ports::SnapshotRepository;

/// Application service for manual channel links.
pub struct LinkService<R> {
    repo: R,
    voltage: f64,
}

impl<R: SnapshotRepository> LinkService<R> {
    /// Create a new service computing currents at `voltage` volts.
    pub fn new(repo: R, voltage: f64) -> Self {
        Self { repo, voltage }
    }

    /// Bind `circuit` to `channel` of the module named `module_name` and save.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Unresolved`] when the circuit does not exist, and
    /// [`PanelError::Link`] when:
    /// - no module has that name ([`LinkError::ModuleNotFound`])
    /// - the module type does not take the circuit's class ([`LinkError::ChannelIncompatible`])
    /// - `channel` is outside `1..=channel_count` ([`LinkError::ChannelOutOfRange`])
    /// - another circuit holds the channel ([`LinkError::ChannelOccupied`])
    /// - the circuit is already linked ([`LinkError::CircuitAlreadyLinked`])
    /// - the channel or its current group would be overloaded
    #[tracing::instrument(skip(self))]
    pub async fn link(
        &self,
        circuit: CircuitId,
        module_name: &str,
        channel: u16,
    ) -> Result<Link, PanelError> {
        let mut project = self.repo.load().await?;
        let link = {
            let target = project.circuit(circuit).ok_or_else(|| UnresolvedReference {
                kind: "circuit",
                id: circuit.to_string(),
            })?;
            let module = project
                .module_by_name(module_name)
                .ok_or_else(|| LinkError::ModuleNotFound {
                    module: module_name.to_string(),
                })?;
            let module_type = module.module_type;
            if !module_type.accepts(target.class()) {
                return Err(LinkError::ChannelIncompatible {
                    module: module.name.clone(),
                    circuit_kind: target.class().as_str(),
                }
                .into());
            }
            let capacity = module_type.channel_count();
            if channel == 0 || channel > capacity {
                return Err(LinkError::ChannelOutOfRange {
                    module: module.name.clone(),
                    channel,
                    capacity,
                }
                .into());
            }

            let links = project.links_by_module();
            let occupied = links.get(&module.id);
            if occupied.is_some_and(|channels| channels.contains_key(&channel)) {
                return Err(LinkError::ChannelOccupied {
                    module: module.name.clone(),
                    channel,
                }
                .into());
            }
            if target.link.is_some() {
                return Err(LinkError::CircuitAlreadyLinked { circuit }.into());
            }
            if let Some(spec) = project.module_catalog().electrical(module_type) {
                let committed = |ch: u16| {
                    occupied
                        .and_then(|channels| channels.get(&ch))
                        .map_or(0.0, |c| c.current_draw(self.voltage))
                };
                spec.check(channel, target.current_draw(self.voltage), committed)?;
            }

            Link {
                module_id: module.id,
                channel,
            }
        };
        project.apply_link(circuit, link)?;
        self.repo.save(&project).await?;
        tracing::info!(%circuit, module = module_name, channel, "circuit linked");
        Ok(link)
    }

    /// Remove the link of `circuit`, returning the one it had.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Unresolved`] when the circuit does not exist,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn unlink(&self, circuit: CircuitId) -> Result<Option<Link>, PanelError> {
        let mut project = self.repo.load().await?;
        let target = project
            .circuit_mut(circuit)
            .ok_or_else(|| UnresolvedReference {
                kind: "circuit",
                id: circuit.to_string(),
            })?;
        let previous = target.link.take();
        if previous.is_some() {
            self.repo.save(&project).await?;
        }
        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fakes::{InMemorySnapshots, RELAY, SHADES, light, project};
    use panelforge_domain::circuit::Circuit;

    const VOLTAGE: f64 = 120.0;

    fn shade(id: i64) -> Circuit {
        Circuit::builder()
            .id(CircuitId::new(id))
            .identifier(format!("P{id}"))
            .shade()
            .build()
            .unwrap()
    }

    fn make_service(circuits: Vec<Circuit>) -> LinkService<InMemorySnapshots> {
        LinkService::new(InMemorySnapshots::new(project(circuits)), VOLTAGE)
    }

    fn linked(mut circuit: Circuit, channel: u16) -> Circuit {
        circuit.link = Some(Link {
            module_id: RELAY,
            channel,
        });
        circuit
    }

    #[tokio::test]
    async fn should_save_link_when_channel_is_free() {
        let svc = make_service(vec![light(1, false, 60.0)]);

        let link = svc.link(CircuitId::new(1), "RL12-1", 3).await.unwrap();

        assert_eq!(link, Link { module_id: RELAY, channel: 3 });
        let stored = svc.repo.current();
        assert_eq!(stored.circuit(CircuitId::new(1)).unwrap().link, Some(link));
    }

    #[tokio::test]
    async fn should_link_shade_to_shade_driver() {
        let svc = make_service(vec![shade(2)]);
        let link = svc.link(CircuitId::new(2), "LX4-1", 4).await.unwrap();
        assert_eq!(link.module_id, SHADES);
    }

    #[tokio::test]
    async fn should_fail_when_module_is_unknown() {
        let svc = make_service(vec![light(1, false, 60.0)]);
        let result = svc.link(CircuitId::new(1), "RL12-9", 1).await;
        assert!(matches!(
            result,
            Err(PanelError::Link(LinkError::ModuleNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn should_fail_when_module_type_does_not_take_circuit_class() {
        let svc = make_service(vec![shade(2)]);
        let result = svc.link(CircuitId::new(2), "RL12-1", 1).await;
        assert!(matches!(
            result,
            Err(PanelError::Link(LinkError::ChannelIncompatible { .. }))
        ));
    }

    #[tokio::test]
    async fn should_fail_when_channel_is_out_of_range() {
        let svc = make_service(vec![light(1, false, 60.0)]);
        for channel in [0, 13] {
            let result = svc.link(CircuitId::new(1), "RL12-1", channel).await;
            assert!(matches!(
                result,
                Err(PanelError::Link(LinkError::ChannelOutOfRange { capacity: 12, .. }))
            ));
        }
    }

    #[tokio::test]
    async fn should_fail_when_channel_is_taken() {
        let svc = make_service(vec![linked(light(1, false, 60.0), 5), light(2, false, 60.0)]);
        let result = svc.link(CircuitId::new(2), "RL12-1", 5).await;
        assert!(matches!(
            result,
            Err(PanelError::Link(LinkError::ChannelOccupied { channel: 5, .. }))
        ));
        assert_eq!(svc.repo.save_count(), 0);
    }

    #[tokio::test]
    async fn should_fail_when_circuit_is_already_linked() {
        let svc = make_service(vec![linked(light(1, false, 60.0), 5)]);
        let result = svc.link(CircuitId::new(1), "RL12-1", 6).await;
        assert!(matches!(
            result,
            Err(PanelError::Link(LinkError::CircuitAlreadyLinked { .. }))
        ));
    }

    #[tokio::test]
    async fn should_fail_when_group_current_would_be_exceeded() {
        let circuits = vec![
            linked(light(1, false, 290.0), 1),
            linked(light(2, false, 290.0), 2),
            linked(light(3, false, 290.0), 3),
            light(4, false, 120.0),
        ];
        let svc = make_service(circuits);
        let result = svc.link(CircuitId::new(4), "RL12-1", 4).await;
        assert!(matches!(
            result,
            Err(PanelError::Link(LinkError::GroupCurrentExceeded { .. }))
        ));
    }

    #[tokio::test]
    async fn should_fail_when_circuit_is_unknown() {
        let svc = make_service(Vec::new());
        let result = svc.link(CircuitId::new(99), "RL12-1", 1).await;
        assert!(matches!(result, Err(PanelError::Unresolved(_))));
    }

    #[tokio::test]
    async fn should_return_previous_link_when_unlinking() {
        let svc = make_service(vec![linked(light(1, false, 60.0), 7)]);

        let previous = svc.unlink(CircuitId::new(1)).await.unwrap();

        assert_eq!(previous.map(|l| l.channel), Some(7));
        assert!(svc.repo.current().circuit(CircuitId::new(1)).unwrap().link.is_none());
    }
}
