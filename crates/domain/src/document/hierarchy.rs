//! Container nodes: areas, rooms and automation boards.

use serde::Serialize;

use super::keypad::KeypadNode;
use super::load::LoadOutput;
use super::module::ModuleNode;
use super::scene::SceneNode;
use super::{Script, SpecialAction, Variable};
use crate::id::Guid;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "$type", rename = "Area", rename_all = "PascalCase")]
pub struct AreaNode {
    pub scenes: Vec<SceneNode>,
    pub scripts: Vec<Script>,
    pub variables: Vec<Variable>,
    pub special_actions: Vec<SpecialAction>,
    pub guid: Guid,
    pub name: String,
    pub notes: String,
    #[serde(rename = "NotDisplayOnROEHNApp")]
    pub hidden_in_app: bool,
    #[serde(rename = "SubItems")]
    pub rooms: Vec<RoomNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "$type", rename = "Room", rename_all = "PascalCase")]
pub struct RoomNode {
    #[serde(rename = "NotDisplayOnROEHNApp")]
    pub hidden_in_app: bool,
    pub name: String,
    pub notes: Option<String>,
    pub scenes: Vec<SceneNode>,
    pub scripts: Vec<Script>,
    pub variables: Vec<Variable>,
    pub load_outputs: Vec<LoadOutput>,
    pub user_interfaces: Vec<KeypadNode>,
    #[serde(rename = "AutomationBoards")]
    pub boards: Vec<BoardNode>,
    pub special_actions: Vec<SpecialAction>,
    pub guid: Guid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "$type", rename = "AutomationBoard", rename_all = "PascalCase")]
pub struct BoardNode {
    pub name: String,
    pub notes: Option<String>,
    #[serde(rename = "ModulesList")]
    pub modules: Vec<ModuleNode>,
    pub guid: Guid,
}
