//! Address plan: HSNET addresses and device ids of every module and keypad.
//!
//! Values recorded in the snapshot are reserved first, in project order, so
//! an entity that already owns an address keeps it no matter where a
//! conflicting entity appears. Everything else is allocated afterwards.

use std::collections::HashMap;

use panelforge_domain::error::AllocationError;
use panelforge_domain::id::{KeypadId, ModuleId};

use super::Issue;
use super::allocator::{IdentifierPools, Pool};

/// Entity that needs bus addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Addressee {
    Module(ModuleId),
    Keypad(KeypadId),
    /// The controller synthesized when the project has none.
    DefaultController,
}

/// Device id used when the snapshot records none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevIdFallback {
    Preferred(u16),
    /// Same value as the entity's HSNET address.
    FollowHsnet,
    Scan,
}

#[derive(Debug, Clone)]
pub struct AddressRequest {
    pub owner: Addressee,
    pub subject: String,
    pub hsnet: Option<u16>,
    pub dev_id: Option<u16>,
    pub fallback_hsnet: Option<u16>,
    pub fallback_dev_id: DevIdFallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Address {
    pub hsnet: u16,
    pub dev_id: u16,
}

fn narrow(pool: Pool, value: u32) -> Result<u16, AllocationError> {
    u16::try_from(value).map_err(|_| AllocationError::PoolExhausted { pool: pool.name() })
}

fn reserve_recorded(
    pools: &mut IdentifierPools,
    pool: Pool,
    value: Option<u16>,
    subject: &str,
    issues: &mut Vec<Issue>,
) -> Option<u16> {
    let value = value?;
    match pools.reserve(pool, u32::from(value)) {
        Ok(()) => Some(value),
        Err(AllocationError::DuplicateIdentifier { .. }) => {
            issues.push(Issue::new(
                subject,
                format!("{} {value} is already taken, reassigned", pool.name()),
            ));
            None
        }
        Err(AllocationError::PoolExhausted { .. }) => {
            issues.push(Issue::new(
                subject,
                format!("{} {value} is out of range, reassigned", pool.name()),
            ));
            None
        }
    }
}

/// Assign an address pair to every request.
///
/// # Errors
///
/// Returns [`AllocationError::PoolExhausted`] when a pool runs out.
pub fn plan(
    requests: &[AddressRequest],
    pools: &mut IdentifierPools,
    issues: &mut Vec<Issue>,
) -> Result<HashMap<Addressee, Address>, AllocationError> {
    let recorded: Vec<(Option<u16>, Option<u16>)> = requests
        .iter()
        .map(|req| {
            (
                reserve_recorded(pools, Pool::Hsnet, req.hsnet, &req.subject, issues),
                reserve_recorded(pools, Pool::DeviceId, req.dev_id, &req.subject, issues),
            )
        })
        .collect();

    let mut out = HashMap::with_capacity(requests.len());
    for (req, (hsnet, dev_id)) in requests.iter().zip(recorded) {
        let hsnet = match hsnet {
            Some(value) => value,
            None => narrow(
                Pool::Hsnet,
                pools.allocate(Pool::Hsnet, req.fallback_hsnet.map(u32::from))?,
            )?,
        };
        let dev_id = match dev_id {
            Some(value) => value,
            None => {
                let preferred = match req.fallback_dev_id {
                    DevIdFallback::Preferred(value) => Some(u32::from(value)),
                    DevIdFallback::FollowHsnet => Some(u32::from(hsnet)),
                    DevIdFallback::Scan => None,
                };
                narrow(Pool::DeviceId, pools.allocate(Pool::DeviceId, preferred)?)?
            }
        };
        out.insert(req.owner, Address { hsnet, dev_id });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(id: i64, hsnet: Option<u16>, fallback: DevIdFallback) -> AddressRequest {
        AddressRequest {
            owner: Addressee::Module(ModuleId::new(id)),
            subject: format!("module {id}"),
            hsnet,
            dev_id: None,
            fallback_hsnet: None,
            fallback_dev_id: fallback,
        }
    }

    #[test]
    fn should_keep_recorded_address_when_a_later_entity_wants_it_too() {
        let mut server = request(1, None, DevIdFallback::Preferred(1));
        server.fallback_hsnet = Some(101);
        let requests = vec![server, request(2, Some(101), DevIdFallback::Scan)];
        let mut pools = IdentifierPools::new();
        let mut issues = Vec::new();

        let plan = plan(&requests, &mut pools, &mut issues).unwrap();

        assert_eq!(plan[&Addressee::Module(ModuleId::new(2))].hsnet, 101);
        assert_eq!(plan[&Addressee::Module(ModuleId::new(1))].hsnet, 102);
        assert!(issues.is_empty());
    }

    #[test]
    fn should_report_and_reassign_duplicate_recorded_address() {
        let requests = vec![
            request(1, Some(110), DevIdFallback::Scan),
            request(2, Some(110), DevIdFallback::Scan),
        ];
        let mut pools = IdentifierPools::new();
        let mut issues = Vec::new();

        let plan = plan(&requests, &mut pools, &mut issues).unwrap();

        assert_eq!(plan[&Addressee::Module(ModuleId::new(1))].hsnet, 110);
        assert_eq!(plan[&Addressee::Module(ModuleId::new(2))].hsnet, 101);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].subject, "module 2");
    }

    #[test]
    fn should_reuse_hsnet_as_device_id_when_following() {
        let requests = vec![request(1, Some(120), DevIdFallback::FollowHsnet)];
        let plan = plan(&requests, &mut IdentifierPools::new(), &mut Vec::new()).unwrap();
        assert_eq!(
            plan[&Addressee::Module(ModuleId::new(1))],
            Address { hsnet: 120, dev_id: 120 }
        );
    }

    #[test]
    fn should_report_out_of_range_recorded_address() {
        let requests = vec![request(1, Some(300), DevIdFallback::Scan)];
        let mut issues = Vec::new();
        let plan = plan(&requests, &mut IdentifierPools::new(), &mut issues).unwrap();
        assert_eq!(plan[&Addressee::Module(ModuleId::new(1))].hsnet, 101);
        assert_eq!(issues.len(), 1);
    }
}
