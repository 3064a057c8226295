//! GUID index: source entity key to minted document GUID.
//!
//! Every reference emitted into the document is resolved here, so a lookup
//! failure means the entity was never placed (a pass-ordering bug, or a
//! dangling user reference the caller decides to skip).

use std::collections::HashMap;
use std::fmt;

use panelforge_domain::error::UnresolvedReference;
use panelforge_domain::id::{
    AreaId, BoardId, ButtonId, CircuitId, Guid, KeypadId, ModuleId, RoomId, SceneId,
};

/// Typed key of a source entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKey {
    Area(AreaId),
    Room(RoomId),
    Board(BoardId),
    Module(ModuleId),
    Circuit(CircuitId),
    Keypad(KeypadId),
    Button(ButtonId),
    Scene(SceneId),
}

impl SourceKey {
    #[must_use]
    pub fn kind(self) -> &'static str {
        match self {
            Self::Area(_) => "area",
            Self::Room(_) => "room",
            Self::Board(_) => "board",
            Self::Module(_) => "module",
            Self::Circuit(_) => "circuit",
            Self::Keypad(_) => "keypad",
            Self::Button(_) => "button",
            Self::Scene(_) => "scene",
        }
    }

    fn raw(self) -> i64 {
        match self {
            Self::Area(id) => id.get(),
            Self::Room(id) => id.get(),
            Self::Board(id) => id.get(),
            Self::Module(id) => id.get(),
            Self::Circuit(id) => id.get(),
            Self::Keypad(id) => id.get(),
            Self::Button(id) => id.get(),
            Self::Scene(id) => id.get(),
        }
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.raw())
    }
}

/// Who a minted GUID belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Owner {
    Source(SourceKey),
    Anonymous(String),
}

/// Mapping of source keys to GUIDs, plus the set of every GUID minted so
/// far in this compilation.
#[derive(Debug)]
pub struct GuidIndex {
    namespace: Guid,
    by_key: HashMap<SourceKey, Guid>,
    owners: HashMap<Guid, Owner>,
}

impl GuidIndex {
    #[must_use]
    pub fn new(namespace: Guid) -> Self {
        let mut owners = HashMap::new();
        owners.insert(namespace, Owner::Anonymous("project".to_string()));
        Self {
            namespace,
            by_key: HashMap::new(),
            owners,
        }
    }

    /// Project GUID, also the namespace of every derived GUID.
    #[must_use]
    pub fn namespace(&self) -> Guid {
        self.namespace
    }

    /// GUID of `key`, minting one on first use.
    ///
    /// A `persisted` GUID from a previous compile is kept when no other node
    /// owns it yet; otherwise the GUID is derived from the key.
    pub fn mint(&mut self, key: SourceKey, persisted: Option<Guid>) -> Guid {
        if let Some(guid) = self.by_key.get(&key) {
            return *guid;
        }
        let guid = match persisted {
            Some(guid) if !guid.is_zero() && !self.owners.contains_key(&guid) => guid,
            _ => self.fresh(self.namespace, &key.to_string()),
        };
        self.owners.insert(guid, Owner::Source(key));
        self.by_key.insert(key, guid);
        guid
    }

    /// GUID for a node without source identity, derived from its parent
    /// and a label unique within that parent.
    pub fn mint_anonymous(&mut self, parent: Guid, label: &str) -> Guid {
        let guid = self.fresh(parent, label);
        self.owners
            .insert(guid, Owner::Anonymous(format!("{parent}/{label}")));
        guid
    }

    /// Attach `key` to the already-minted `guid` of an anonymous node.
    ///
    /// Returns `false` when `key` is already mapped or `guid` belongs to
    /// another source entity.
    pub fn adopt(&mut self, key: SourceKey, guid: Guid) -> bool {
        if self.by_key.contains_key(&key) {
            return false;
        }
        match self.owners.get(&guid) {
            Some(Owner::Anonymous(_)) => {
                self.owners.insert(guid, Owner::Source(key));
                self.by_key.insert(key, guid);
                true
            }
            _ => false,
        }
    }

    /// GUID of an entity that must already be placed.
    ///
    /// # Errors
    ///
    /// Returns [`UnresolvedReference`] when `key` was never minted.
    pub fn resolve(&self, key: SourceKey) -> Result<Guid, UnresolvedReference> {
        self.get(key).ok_or_else(|| UnresolvedReference {
            kind: key.kind(),
            id: key.raw().to_string(),
        })
    }

    #[must_use]
    pub fn get(&self, key: SourceKey) -> Option<Guid> {
        self.by_key.get(&key).copied()
    }

    /// Number of source entities mapped.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    fn fresh(&self, namespace: Guid, name: &str) -> Guid {
        let mut guid = Guid::derive(namespace, name);
        let mut attempt = 1u32;
        while guid.is_zero() || self.owners.contains_key(&guid) {
            guid = Guid::derive(namespace, &format!("{name}#{attempt}"));
            attempt += 1;
        }
        guid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> GuidIndex {
        GuidIndex::new(Guid::from_u128(0xABCD))
    }

    #[test]
    fn should_return_same_guid_when_minting_twice() {
        let mut index = index();
        let key = SourceKey::Circuit(CircuitId::new(1));
        assert_eq!(index.mint(key, None), index.mint(key, None));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn should_keep_persisted_guid_when_free() {
        let mut index = index();
        let persisted = Guid::from_u128(42);
        let guid = index.mint(SourceKey::Scene(SceneId::new(1)), Some(persisted));
        assert_eq!(guid, persisted);
    }

    #[test]
    fn should_derive_new_guid_when_persisted_guid_is_taken() {
        let mut index = index();
        let persisted = Guid::from_u128(42);
        index.mint(SourceKey::Scene(SceneId::new(1)), Some(persisted));
        let second = index.mint(SourceKey::Scene(SceneId::new(2)), Some(persisted));
        assert_ne!(second, persisted);
    }

    #[test]
    fn should_fail_when_resolving_unplaced_entity() {
        let index = index();
        let err = index
            .resolve(SourceKey::Keypad(KeypadId::new(9)))
            .unwrap_err();
        assert_eq!(err.kind, "keypad");
        assert_eq!(err.id, "9");
    }

    #[test]
    fn should_derive_distinct_anonymous_guids_per_label() {
        let mut index = index();
        let parent = index.namespace();
        let a = index.mint_anonymous(parent, "special:All Lights");
        let b = index.mint_anonymous(parent, "special:OFF");
        assert_ne!(a, b);
        assert_ne!(index.mint_anonymous(parent, "special:OFF"), b);
    }

    #[test]
    fn should_adopt_anonymous_guid_only_once() {
        let mut index = index();
        let parent = index.namespace();
        let guid = index.mint_anonymous(parent, "room:Sala Técnica");
        assert!(index.adopt(SourceKey::Room(RoomId::new(3)), guid));
        assert!(!index.adopt(SourceKey::Room(RoomId::new(4)), guid));
        assert_eq!(index.get(SourceKey::Room(RoomId::new(3))), Some(guid));
    }

    #[test]
    fn should_not_reuse_namespace_as_node_guid() {
        let mut index = index();
        let ns = index.namespace();
        let guid = index.mint(SourceKey::Area(AreaId::new(1)), Some(ns));
        assert_ne!(guid, ns);
    }
}
