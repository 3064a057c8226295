//! Hierarchy builder: owns the document tree while it is being built.
//!
//! Containers live in flat arenas and refer to each other by index. Areas,
//! rooms and boards are found-or-created by name within their parent;
//! modules are indexed by source id and by name so the linker can search
//! the whole project.

use std::collections::HashMap;

use panelforge_domain::catalog::ModuleType;
use panelforge_domain::document::{KeypadNode, LoadOutput, ModuleNode, SceneNode};
use panelforge_domain::id::{Guid, ModuleId};

use super::guid_index::{GuidIndex, SourceKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AreaIdx(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoomIdx(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoardIdx(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleIdx(usize);

#[derive(Debug)]
pub struct AreaEntry {
    pub guid: Guid,
    pub name: String,
    source: Option<SourceKey>,
    pub rooms: Vec<RoomIdx>,
}

#[derive(Debug)]
pub struct RoomEntry {
    pub guid: Guid,
    pub name: String,
    source: Option<SourceKey>,
    pub boards: Vec<BoardIdx>,
    pub loads: Vec<LoadOutput>,
    pub keypads: Vec<KeypadNode>,
    pub scenes: Vec<SceneNode>,
}

#[derive(Debug)]
pub struct BoardEntry {
    pub guid: Guid,
    pub name: String,
    pub notes: Option<String>,
    source: Option<SourceKey>,
    pub modules: Vec<ModuleIdx>,
}

#[derive(Debug)]
pub struct ModuleEntry {
    pub node: ModuleNode,
    pub module_type: ModuleType,
    pub board: BoardIdx,
    /// Controller this module reports to.
    pub parent: Option<ModuleIdx>,
}

/// A keypad placed in a room, remembered for registry consistency.
#[derive(Debug, Clone, Copy)]
pub struct InterfaceEntry {
    pub guid: Guid,
    pub controller: Option<ModuleIdx>,
}

#[derive(Debug, Default)]
pub struct Hierarchy {
    areas: Vec<AreaEntry>,
    rooms: Vec<RoomEntry>,
    boards: Vec<BoardEntry>,
    modules: Vec<ModuleEntry>,
    interfaces: Vec<InterfaceEntry>,
    area_names: HashMap<String, AreaIdx>,
    room_names: HashMap<(AreaIdx, String), RoomIdx>,
    board_names: HashMap<(RoomIdx, String), BoardIdx>,
    module_sources: HashMap<ModuleId, ModuleIdx>,
    module_names: HashMap<String, ModuleIdx>,
}

/// Whether an existing container may stand for `source`.
fn claims(existing: Option<SourceKey>, source: Option<SourceKey>) -> bool {
    match (existing, source) {
        (_, None) | (None, Some(_)) => true,
        (Some(a), Some(b)) => a == b,
    }
}

/// GUID of a container: minted from its source key, or derived from the
/// parent GUID and the name for anonymous containers.
fn container_guid(
    index: &mut GuidIndex,
    parent: Guid,
    label: &str,
    source: Option<SourceKey>,
) -> Guid {
    match source {
        Some(key) => index.mint(key, None),
        None => index.mint_anonymous(parent, label),
    }
}

impl Hierarchy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Find or create the area named `name`.
    ///
    /// A same-named area created for a different source entity is not
    /// reused; the new entity gets its own node.
    pub fn ensure_area(
        &mut self,
        index: &mut GuidIndex,
        name: &str,
        source: Option<SourceKey>,
    ) -> AreaIdx {
        if let Some(idx) = self.area_names.get(name).copied() {
            let entry = &mut self.areas[idx.0];
            if claims(entry.source, source) {
                adopt(index, &mut entry.source, entry.guid, source);
                return idx;
            }
        }
        let parent = index.namespace();
        let guid = container_guid(index, parent, &format!("area:{name}"), source);
        let idx = AreaIdx(self.areas.len());
        self.areas.push(AreaEntry {
            guid,
            name: name.to_string(),
            source,
            rooms: Vec::new(),
        });
        self.area_names.entry(name.to_string()).or_insert(idx);
        idx
    }

    /// Find or create the room named `name` inside `area`.
    pub fn ensure_room(
        &mut self,
        index: &mut GuidIndex,
        area: AreaIdx,
        name: &str,
        source: Option<SourceKey>,
    ) -> RoomIdx {
        let key = (area, name.to_string());
        if let Some(idx) = self.room_names.get(&key).copied() {
            let entry = &mut self.rooms[idx.0];
            if claims(entry.source, source) {
                adopt(index, &mut entry.source, entry.guid, source);
                return idx;
            }
        }
        let parent = self.areas[area.0].guid;
        let guid = container_guid(index, parent, &format!("room:{name}"), source);
        let idx = RoomIdx(self.rooms.len());
        self.rooms.push(RoomEntry {
            guid,
            name: name.to_string(),
            source,
            boards: Vec::new(),
            loads: Vec::new(),
            keypads: Vec::new(),
            scenes: Vec::new(),
        });
        self.areas[area.0].rooms.push(idx);
        self.room_names.entry(key).or_insert(idx);
        idx
    }

    /// Find or create the board named `name` inside `room`.
    pub fn ensure_board(
        &mut self,
        index: &mut GuidIndex,
        room: RoomIdx,
        name: &str,
        source: Option<SourceKey>,
    ) -> BoardIdx {
        let key = (room, name.to_string());
        if let Some(idx) = self.board_names.get(&key).copied() {
            let entry = &mut self.boards[idx.0];
            if claims(entry.source, source) {
                adopt(index, &mut entry.source, entry.guid, source);
                return idx;
            }
        }
        let parent = self.rooms[room.0].guid;
        let guid = container_guid(index, parent, &format!("board:{name}"), source);
        let idx = BoardIdx(self.boards.len());
        self.boards.push(BoardEntry {
            guid,
            name: name.to_string(),
            notes: None,
            source,
            modules: Vec::new(),
        });
        self.rooms[room.0].boards.push(idx);
        self.board_names.entry(key).or_insert(idx);
        idx
    }

    /// Place a module node on `board`.
    pub fn add_module(
        &mut self,
        board: BoardIdx,
        node: ModuleNode,
        module_type: ModuleType,
        source: Option<ModuleId>,
    ) -> ModuleIdx {
        let idx = ModuleIdx(self.modules.len());
        self.module_names.entry(node.name.clone()).or_insert(idx);
        if let Some(id) = source {
            self.module_sources.insert(id, idx);
        }
        self.modules.push(ModuleEntry {
            node,
            module_type,
            board,
            parent: None,
        });
        self.boards[board.0].modules.push(idx);
        idx
    }

    /// Record a keypad placed in `room`.
    pub fn add_keypad(&mut self, room: RoomIdx, node: KeypadNode, controller: Option<ModuleIdx>) {
        self.interfaces.push(InterfaceEntry {
            guid: node.guid,
            controller,
        });
        self.rooms[room.0].keypads.push(node);
    }

    #[must_use]
    pub fn module_by_source(&self, id: ModuleId) -> Option<ModuleIdx> {
        self.module_sources.get(&id).copied()
    }

    /// Find a module by name anywhere in the tree.
    #[must_use]
    pub fn module_by_name(&self, name: &str) -> Option<ModuleIdx> {
        self.module_names.get(name).copied()
    }

    #[must_use]
    pub fn module(&self, idx: ModuleIdx) -> &ModuleEntry {
        &self.modules[idx.0]
    }

    pub fn module_mut(&mut self, idx: ModuleIdx) -> &mut ModuleEntry {
        &mut self.modules[idx.0]
    }

    pub fn modules(&self) -> impl Iterator<Item = (ModuleIdx, &ModuleEntry)> {
        self.modules.iter().enumerate().map(|(i, m)| (ModuleIdx(i), m))
    }

    pub fn interfaces(&self) -> impl Iterator<Item = &InterfaceEntry> {
        self.interfaces.iter()
    }

    #[must_use]
    pub fn area(&self, idx: AreaIdx) -> &AreaEntry {
        &self.areas[idx.0]
    }

    pub fn areas(&self) -> impl Iterator<Item = &AreaEntry> {
        self.areas.iter()
    }

    #[must_use]
    pub fn room(&self, idx: RoomIdx) -> &RoomEntry {
        &self.rooms[idx.0]
    }

    pub fn room_mut(&mut self, idx: RoomIdx) -> &mut RoomEntry {
        &mut self.rooms[idx.0]
    }

    #[must_use]
    pub fn board(&self, idx: BoardIdx) -> &BoardEntry {
        &self.boards[idx.0]
    }

    pub fn board_mut(&mut self, idx: BoardIdx) -> &mut BoardEntry {
        &mut self.boards[idx.0]
    }

    /// Move the built tree out as owned parts, in creation order.
    #[must_use]
    pub fn into_parts(self) -> HierarchyParts {
        HierarchyParts {
            areas: self.areas,
            rooms: self.rooms.into_iter().map(Some).collect(),
            boards: self.boards.into_iter().map(Some).collect(),
            modules: self.modules.into_iter().map(|m| Some(m.node)).collect(),
        }
    }
}

fn adopt(
    index: &mut GuidIndex,
    existing: &mut Option<SourceKey>,
    guid: Guid,
    source: Option<SourceKey>,
) {
    if existing.is_none()
        && let Some(key) = source
        && index.adopt(key, guid)
    {
        *existing = Some(key);
    }
}

/// Owned arenas handed to the serializer; each slot is taken exactly once.
#[derive(Debug)]
pub struct HierarchyParts {
    pub areas: Vec<AreaEntry>,
    pub rooms: Vec<Option<RoomEntry>>,
    pub boards: Vec<Option<BoardEntry>>,
    pub modules: Vec<Option<ModuleNode>>,
}

impl HierarchyParts {
    pub fn take_room(&mut self, idx: RoomIdx) -> Option<RoomEntry> {
        self.rooms.get_mut(idx.0).and_then(Option::take)
    }

    pub fn take_board(&mut self, idx: BoardIdx) -> Option<BoardEntry> {
        self.boards.get_mut(idx.0).and_then(Option::take)
    }

    pub fn take_module(&mut self, idx: ModuleIdx) -> Option<ModuleNode> {
        self.modules.get_mut(idx.0).and_then(Option::take)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panelforge_domain::id::{AreaId, RoomId};

    fn index() -> GuidIndex {
        GuidIndex::new(Guid::from_u128(0x77))
    }

    #[test]
    fn should_return_same_area_when_ensured_twice_by_name() {
        let mut index = index();
        let mut tree = Hierarchy::new();
        let a = tree.ensure_area(&mut index, "Térreo", None);
        let b = tree.ensure_area(&mut index, "Térreo", None);
        assert_eq!(a, b);
        assert_eq!(tree.areas().count(), 1);
    }

    #[test]
    fn should_record_source_guid_when_area_has_stable_id() {
        let mut index = index();
        let mut tree = Hierarchy::new();
        let key = SourceKey::Area(AreaId::new(4));
        let idx = tree.ensure_area(&mut index, "Térreo", Some(key));
        assert_eq!(index.resolve(key).unwrap(), tree.area(idx).guid);
    }

    #[test]
    fn should_adopt_anonymous_room_when_source_room_has_same_name() {
        let mut index = index();
        let mut tree = Hierarchy::new();
        let area = tree.ensure_area(&mut index, "Área Técnica", None);
        let anonymous = tree.ensure_room(&mut index, area, "Sala Técnica", None);
        let key = SourceKey::Room(RoomId::new(2));
        let sourced = tree.ensure_room(&mut index, area, "Sala Técnica", Some(key));
        assert_eq!(anonymous, sourced);
        assert_eq!(index.get(key), Some(tree.room(sourced).guid));
    }

    #[test]
    fn should_create_separate_rooms_for_distinct_sources_with_same_name() {
        let mut index = index();
        let mut tree = Hierarchy::new();
        let area = tree.ensure_area(&mut index, "Térreo", None);
        let a = tree.ensure_room(&mut index, area, "Suíte", Some(SourceKey::Room(RoomId::new(1))));
        let b = tree.ensure_room(&mut index, area, "Suíte", Some(SourceKey::Room(RoomId::new(2))));
        assert_ne!(a, b);
        assert_ne!(tree.room(a).guid, tree.room(b).guid);
    }

    #[test]
    fn should_scope_room_names_by_area() {
        let mut index = index();
        let mut tree = Hierarchy::new();
        let first = tree.ensure_area(&mut index, "Térreo", None);
        let second = tree.ensure_area(&mut index, "Superior", None);
        let a = tree.ensure_room(&mut index, first, "Banho", None);
        let b = tree.ensure_room(&mut index, second, "Banho", None);
        assert_ne!(a, b);
    }
}
