//! Serializer: moves the finished hierarchy into a [`Document`].

use panelforge_domain::document::{
    AreaNode, BoardNode, ClientInfoNode, CloudConfigNode, Document, ProgrammerInfoNode, RoomNode,
    SCHEMA_VERSION, SpecialAction, SpecialActionKind, Variable,
};
use panelforge_domain::id::Guid;
use panelforge_domain::project::ProjectSnapshot;
use panelforge_domain::time::{self, Timestamp};

use super::CompileOptions;
use super::guid_index::GuidIndex;
use super::hierarchy::{HierarchyParts, RoomEntry};

fn special_actions(index: &mut GuidIndex, parent: Guid) -> Vec<SpecialAction> {
    SpecialActionKind::DEFAULTS
        .into_iter()
        .map(|kind| {
            let guid = index.mint_anonymous(parent, &format!("special:{}", kind.label()));
            SpecialAction::new(kind, guid)
        })
        .collect()
}

fn room_node(parts: &mut HierarchyParts, index: &mut GuidIndex, room: RoomEntry) -> RoomNode {
    let taken: Vec<_> = room
        .boards
        .iter()
        .filter_map(|idx| parts.take_board(*idx))
        .collect();

    let mut boards = Vec::with_capacity(taken.len());
    for board in taken {
        let modules = board
            .modules
            .iter()
            .filter_map(|idx| parts.take_module(*idx))
            .collect();
        boards.push(BoardNode {
            name: board.name,
            notes: board.notes,
            modules,
            guid: board.guid,
        });
    }

    RoomNode {
        hidden_in_app: false,
        name: room.name,
        notes: None,
        scenes: room.scenes,
        scripts: Vec::new(),
        variables: Vec::new(),
        load_outputs: room.loads,
        user_interfaces: room.keypads,
        boards,
        special_actions: special_actions(index, room.guid),
        guid: room.guid,
    }
}

/// Assemble the document. `now` stamps whatever the project metadata
/// leaves unset.
pub fn serialize(
    mut parts: HierarchyParts,
    project: &ProjectSnapshot,
    index: &mut GuidIndex,
    options: &CompileOptions,
    now: Timestamp,
) -> Document {
    let namespace = index.namespace();
    let areas_entries = std::mem::take(&mut parts.areas);

    let mut areas = Vec::with_capacity(areas_entries.len());
    for area in areas_entries {
        let mut rooms = Vec::with_capacity(area.rooms.len());
        for idx in &area.rooms {
            if let Some(room) = parts.take_room(*idx) {
                rooms.push(room_node(&mut parts, index, room));
            }
        }
        areas.push(AreaNode {
            scenes: Vec::new(),
            scripts: Vec::new(),
            variables: Vec::new(),
            special_actions: special_actions(index, area.guid),
            guid: area.guid,
            name: area.name,
            notes: String::new(),
            hidden_in_app: false,
            rooms,
        });
    }

    let meta = &project.metadata;
    let startup = index.mint_anonymous(namespace, "variable:startup");
    let programmer_guid = meta
        .programmer
        .guid
        .unwrap_or_else(|| index.mint_anonymous(namespace, "programmer"));

    Document {
        areas,
        scenes: Vec::new(),
        scripts: Vec::new(),
        variables: vec![Variable::startup(startup)],
        special_actions: special_actions(index, namespace),
        saved_profiles: None,
        saved_control_models: None,
        client_info: ClientInfoNode {
            name: meta.client.name.clone(),
            email: meta.client.email.clone(),
            phone: meta.client.phone.clone(),
        },
        name: project.name.clone(),
        path: None,
        guid: namespace,
        created: time::document_format(meta.created.unwrap_or(now)),
        last_modified: time::document_format(meta.modified.unwrap_or(now)),
        last_upload: None,
        last_time_saved: time::document_format(now),
        programmer_info: ProgrammerInfoNode {
            name: meta.programmer.name.clone(),
            email: meta.programmer.email.clone(),
            guid: programmer_guid,
        },
        cloud_config: CloudConfigNode::default(),
        project_schema_version: SCHEMA_VERSION,
        software_version: meta
            .software_version
            .clone()
            .unwrap_or_else(|| options.software_version.clone()),
        selected_time_zone_id: meta
            .timezone_id
            .clone()
            .unwrap_or_else(|| options.timezone_id.clone()),
        latitude: meta.latitude,
        longitude: meta.longitude,
        notes: meta.notes.clone(),
        app_export: false,
    }
}
