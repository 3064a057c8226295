//! Common error types used across the workspace.
//!
//! [`PanelError`] is the top-level error. Each concern has its own typed
//! error converted via `#[from]`; adapters convert their own errors into
//! [`PanelError::Storage`].
//!
//! Errors fall in two tiers. Fatal errors abort a whole compilation
//! (broken preconditions, pass-ordering bugs, exhausted pools). Recoverable
//! ones (validation, linking, capacity) are what batch operations collect
//! per entity and report instead of propagating.

/// Top-level error for every panelforge operation.
#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("precondition failed: {0}")]
    Precondition(#[from] PreconditionError),

    #[error(transparent)]
    Unresolved(#[from] UnresolvedReference),

    #[error("link error: {0}")]
    Link(#[from] LinkError),

    #[error("identifier allocation error: {0}")]
    Allocation(#[from] AllocationError),

    #[error(transparent)]
    UnknownModuleType(#[from] UnknownModuleType),

    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl PanelError {
    /// Whether this error must abort the whole operation.
    ///
    /// Validation and link errors concern a single entity and can be
    /// collected by batch callers; everything else cannot.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Validation(_) | Self::Link(_))
    }
}

/// A single entity violates a domain invariant.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{entity} name must not be empty")]
    EmptyName { entity: &'static str },

    #[error("keypads have 1, 2 or 4 buttons, got {0}")]
    InvalidButtonCount(u8),

    #[error("button position {position} exceeds keypad button count {count}")]
    ButtonOutOfRange { position: u8, count: u8 },

    #[error("scene movers cannot be enabled on an empty scene")]
    MoversSceneEmpty,

    #[error("scene movers require every member to be a shade, circuit {circuit} is not")]
    MoversRequireShades { circuit: crate::id::CircuitId },

    #[error("HVAC circuit {circuit} is not allowed in a lighting scene")]
    HvacInLightingScene { circuit: crate::id::CircuitId },

    #[error("circuit {circuit} appears more than once in the scene")]
    DuplicateSceneMember { circuit: crate::id::CircuitId },

    #[error("light power must be a finite, non-negative number of watts")]
    InvalidPower,
}

/// The operation cannot start on this project.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreconditionError {
    #[error("automatic assignment requires exactly 1 electrical board, found {found}")]
    BoardCount { found: usize },

    #[error("at most one logic server is allowed, found {found}")]
    MultipleLogicServers { found: usize },

    #[error("module name {name:?} is used by more than one module")]
    DuplicateModuleName { name: String },

    #[error("nominal voltage must be positive")]
    NonPositiveVoltage,
}

/// A lookup for an entity that should already exist failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unresolved reference to {kind} {id}")]
pub struct UnresolvedReference {
    pub kind: &'static str,
    pub id: String,
}

/// A circuit could not be bound to a module channel.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LinkError {
    #[error("module {module:?} not found")]
    ModuleNotFound { module: String },

    #[error("channel {channel} is out of range for module {module:?} (capacity {capacity})")]
    ChannelOutOfRange {
        module: String,
        channel: u16,
        capacity: u16,
    },

    #[error("module {module:?} has no channel compatible with a {circuit_kind} circuit")]
    ChannelIncompatible {
        module: String,
        circuit_kind: &'static str,
    },

    #[error("channel {channel} of module {module:?} is already in use")]
    ChannelOccupied { module: String, channel: u16 },

    #[error("circuit {circuit} is already linked")]
    CircuitAlreadyLinked { circuit: crate::id::CircuitId },

    #[error("circuit draws {required:.2}A, above the {rating}A channel rating")]
    ChannelCurrentExceeded { required: f64, rating: f64 },

    #[error("current group would carry {total:.2}A, above its {max}A limit")]
    GroupCurrentExceeded { total: f64, max: f64 },
}

impl LinkError {
    /// Whether the failure is an electrical capacity violation.
    #[must_use]
    pub fn is_capacity(&self) -> bool {
        matches!(
            self,
            Self::ChannelCurrentExceeded { .. } | Self::GroupCurrentExceeded { .. }
        )
    }
}

/// The identifier allocator could not issue or reserve a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocationError {
    #[error("identifier pool {pool} is exhausted")]
    PoolExhausted { pool: &'static str },

    #[error("{pool} value {value} is already reserved")]
    DuplicateIdentifier { pool: &'static str, value: u32 },
}

/// A module type code outside the catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown module type {code:?}")]
pub struct UnknownModuleType {
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_classify_link_errors_as_recoverable() {
        let err: PanelError = LinkError::ChannelOccupied {
            module: "RL12-1".to_string(),
            channel: 3,
        }
        .into();
        assert!(!err.is_fatal());
    }

    #[test]
    fn should_classify_precondition_errors_as_fatal() {
        let err: PanelError = PreconditionError::BoardCount { found: 2 }.into();
        assert!(err.is_fatal());
    }

    #[test]
    fn should_classify_pool_exhaustion_as_fatal() {
        let err: PanelError = AllocationError::PoolExhausted { pool: "hsnet" }.into();
        assert!(err.is_fatal());
    }

    #[test]
    fn should_flag_capacity_link_errors() {
        let err = LinkError::GroupCurrentExceeded { total: 8.3, max: 8.0 };
        assert!(err.is_capacity());
        assert!(!LinkError::ModuleNotFound { module: "x".to_string() }.is_capacity());
    }

    #[test]
    fn should_render_group_current_with_two_decimals() {
        let err = LinkError::GroupCurrentExceeded { total: 8.3, max: 8.0 };
        assert_eq!(
            err.to_string(),
            "current group would carry 8.30A, above its 8A limit"
        );
    }
}
