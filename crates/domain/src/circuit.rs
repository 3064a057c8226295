//! Circuit: a logical controllable load before it is wired to a channel.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::electrical;
use crate::error::{PanelError, ValidationError};
use crate::id::{CircuitId, ModuleId};

/// What a circuit drives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CircuitKind {
    Light {
        #[serde(default)]
        dimmable: bool,
        /// Declared power in watts.
        #[serde(default)]
        power: f64,
    },
    Shade,
    Hvac,
}

impl CircuitKind {
    #[must_use]
    pub fn class(self) -> CircuitClass {
        match self {
            Self::Light { .. } => CircuitClass::Light,
            Self::Shade => CircuitClass::Shade,
            Self::Hvac => CircuitClass::Hvac,
        }
    }
}

/// Circuit kind without its payload, used for compatibility checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CircuitClass {
    Light,
    Shade,
    Hvac,
}

impl CircuitClass {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Shade => "shade",
            Self::Hvac => "hvac",
        }
    }
}

impl fmt::Display for CircuitClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Committed binding of a circuit to one module channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub module_id: ModuleId,
    /// 1-based channel number.
    pub channel: u16,
}

/// A logical load owned by a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    pub id: CircuitId,
    /// Installer-facing short code, such as `L12`.
    pub identifier: String,
    #[serde(default)]
    pub name: Option<String>,
    pub kind: CircuitKind,
    #[serde(default)]
    pub link: Option<Link>,
}

impl Circuit {
    /// Create a builder for constructing a [`Circuit`].
    #[must_use]
    pub fn builder() -> CircuitBuilder {
        CircuitBuilder::default()
    }

    #[must_use]
    pub fn class(&self) -> CircuitClass {
        self.kind.class()
    }

    #[must_use]
    pub fn is_dimmable(&self) -> bool {
        matches!(self.kind, CircuitKind::Light { dimmable: true, .. })
    }

    /// Declared power in watts; zero for anything but lights.
    #[must_use]
    pub fn power(&self) -> f64 {
        match self.kind {
            CircuitKind::Light { power, .. } => power,
            CircuitKind::Shade | CircuitKind::Hvac => 0.0,
        }
    }

    /// Current drawn at `voltage`, in amperes.
    #[must_use]
    pub fn current_draw(&self, voltage: f64) -> f64 {
        electrical::current_draw(self.power(), voltage)
    }

    /// Name shown in the document: the display name, else the identifier.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.identifier)
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Validation`] when:
    /// - `identifier` is empty ([`ValidationError::EmptyName`])
    /// - a light's power is negative or not finite ([`ValidationError::InvalidPower`])
    pub fn validate(&self) -> Result<(), PanelError> {
        if self.identifier.trim().is_empty() {
            return Err(ValidationError::EmptyName { entity: "circuit" }.into());
        }
        if let CircuitKind::Light { power, .. } = self.kind
            && (!power.is_finite() || power < 0.0)
        {
            return Err(ValidationError::InvalidPower.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Circuit`].
#[derive(Debug, Default)]
pub struct CircuitBuilder {
    id: Option<CircuitId>,
    identifier: Option<String>,
    name: Option<String>,
    kind: Option<CircuitKind>,
    link: Option<Link>,
}

impl CircuitBuilder {
    #[must_use]
    pub fn id(mut self, id: CircuitId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn light(mut self, dimmable: bool, power: f64) -> Self {
        self.kind = Some(CircuitKind::Light { dimmable, power });
        self
    }

    #[must_use]
    pub fn shade(mut self) -> Self {
        self.kind = Some(CircuitKind::Shade);
        self
    }

    #[must_use]
    pub fn hvac(mut self) -> Self {
        self.kind = Some(CircuitKind::Hvac);
        self
    }

    #[must_use]
    pub fn link(mut self, module_id: ModuleId, channel: u16) -> Self {
        self.link = Some(Link { module_id, channel });
        self
    }

    /// Consume the builder, validate, and return a [`Circuit`].
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Validation`] if the identifier is missing or the
    /// power is invalid.
    pub fn build(self) -> Result<Circuit, PanelError> {
        let circuit = Circuit {
            id: self.id.unwrap_or(CircuitId::new(0)),
            identifier: self.identifier.unwrap_or_default(),
            name: self.name,
            kind: self.kind.unwrap_or(CircuitKind::Light {
                dimmable: false,
                power: 0.0,
            }),
            link: self.link,
        };
        circuit.validate()?;
        Ok(circuit)
    }
}
