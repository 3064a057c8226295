//! Module: a physical device mounted on an electrical board.

use serde::{Deserialize, Serialize};

use crate::catalog::ModuleType;
use crate::error::{PanelError, ValidationError};
use crate::id::ModuleId;

/// A controller or a peripheral module.
///
/// Controllers are HSNET-addressed and host a subscriber registry.
/// Peripherals expose the fixed channel layout of their [`ModuleType`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    /// Project-unique name, used by manual links.
    pub name: String,
    #[serde(rename = "type")]
    pub module_type: ModuleType,
    #[serde(default)]
    pub hsnet: Option<u16>,
    #[serde(default)]
    pub dev_id: Option<u16>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub is_logic_server: bool,
    /// Controller this module reports to; the logic server when absent.
    #[serde(default)]
    pub parent_controller: Option<ModuleId>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Module {
    /// Create a builder for constructing a [`Module`].
    #[must_use]
    pub fn builder() -> ModuleBuilder {
        ModuleBuilder::default()
    }

    #[must_use]
    pub fn is_controller(&self) -> bool {
        self.module_type.is_controller()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Validation`] when `name` is empty.
    pub fn validate(&self) -> Result<(), PanelError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName { entity: "module" }.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Module`].
#[derive(Debug, Default)]
pub struct ModuleBuilder {
    id: Option<ModuleId>,
    name: Option<String>,
    module_type: Option<ModuleType>,
    hsnet: Option<u16>,
    dev_id: Option<u16>,
    ip_address: Option<String>,
    is_logic_server: bool,
    parent_controller: Option<ModuleId>,
    notes: Option<String>,
}

impl ModuleBuilder {
    #[must_use]
    pub fn id(mut self, id: ModuleId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn module_type(mut self, module_type: ModuleType) -> Self {
        self.module_type = Some(module_type);
        self
    }

    #[must_use]
    pub fn hsnet(mut self, hsnet: u16) -> Self {
        self.hsnet = Some(hsnet);
        self
    }

    #[must_use]
    pub fn dev_id(mut self, dev_id: u16) -> Self {
        self.dev_id = Some(dev_id);
        self
    }

    #[must_use]
    pub fn ip_address(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    #[must_use]
    pub fn logic_server(mut self, flag: bool) -> Self {
        self.is_logic_server = flag;
        self
    }

    #[must_use]
    pub fn parent_controller(mut self, parent: ModuleId) -> Self {
        self.parent_controller = Some(parent);
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Consume the builder, validate, and return a [`Module`].
    ///
    /// The type defaults to [`ModuleType::Rl12`] when not set.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Validation`] if the name is missing or empty.
    pub fn build(self) -> Result<Module, PanelError> {
        let module = Module {
            id: self.id.unwrap_or(ModuleId::new(0)),
            name: self.name.unwrap_or_default(),
            module_type: self.module_type.unwrap_or(ModuleType::Rl12),
            hsnet: self.hsnet,
            dev_id: self.dev_id,
            ip_address: self.ip_address,
            is_logic_server: self.is_logic_server,
            parent_controller: self.parent_controller,
            notes: self.notes,
        };
        module.validate()?;
        Ok(module)
    }
}
