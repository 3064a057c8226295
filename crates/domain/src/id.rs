//! Typed identifier newtypes.
//!
//! Source identifiers are the integer keys handed over by the persistence
//! collaborator. [`Guid`] is the identifier minted for every node of the
//! compiled document.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw source key.
            #[must_use]
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Access the raw source key.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }
    };
}

define_id!(
    /// Source identifier of an [`Area`](crate::project::Area).
    AreaId
);

define_id!(
    /// Source identifier of a [`Room`](crate::project::Room).
    RoomId
);

define_id!(
    /// Source identifier of a [`Board`](crate::project::Board).
    BoardId
);

define_id!(
    /// Source identifier of a [`Module`](crate::module::Module).
    ModuleId
);

define_id!(
    /// Source identifier of a [`Circuit`](crate::circuit::Circuit).
    CircuitId
);

define_id!(
    /// Source identifier of a [`Keypad`](crate::keypad::Keypad).
    KeypadId
);

define_id!(
    /// Source identifier of a keypad [`Button`](crate::keypad::Button).
    ButtonId
);

define_id!(
    /// Source identifier of a [`Scene`](crate::scene::Scene).
    SceneId
);

/// Globally unique identifier of a document node.
///
/// The nil GUID ([`Guid::ZERO`]) is the document's "empty" placeholder: an
/// unused channel slot, an unlinked button, a registry terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Guid(uuid::Uuid);

impl Guid {
    /// The empty placeholder GUID.
    pub const ZERO: Self = Self(uuid::Uuid::nil());

    /// Derive a name-based GUID inside `namespace`.
    ///
    /// The same `(namespace, name)` pair always yields the same GUID, which
    /// keeps recompiling an unchanged project byte-for-byte stable.
    #[must_use]
    pub fn derive(namespace: Self, name: &str) -> Self {
        Self(uuid::Uuid::new_v5(&namespace.0, name.as_bytes()))
    }

    /// Generate a new random GUID (used for fresh project namespaces).
    #[must_use]
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Build a GUID from a literal such as the vendor's fixed driver ids.
    #[must_use]
    pub const fn from_u128(value: u128) -> Self {
        Self(uuid::Uuid::from_u128(value))
    }

    /// Access the inner UUID.
    #[must_use]
    pub const fn as_uuid(self) -> uuid::Uuid {
        self.0
    }

    /// Whether this is the empty placeholder.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.is_nil()
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl FromStr for Guid {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_roundtrip_source_id_through_display_and_from_str() {
        let id = CircuitId::new(42);
        let parsed: CircuitId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn should_serialize_source_id_as_bare_integer() {
        let json = serde_json::to_string(&RoomId::new(7)).unwrap();
        assert_eq!(json, "7");
    }

    #[test]
    fn should_derive_same_guid_for_same_name() {
        let ns = Guid::from_u128(0x1234);
        assert_eq!(Guid::derive(ns, "circuit:1"), Guid::derive(ns, "circuit:1"));
    }

    #[test]
    fn should_derive_distinct_guids_for_distinct_names() {
        let ns = Guid::from_u128(0x1234);
        assert_ne!(Guid::derive(ns, "circuit:1"), Guid::derive(ns, "circuit:2"));
    }

    #[test]
    fn should_display_zero_guid_hyphenated() {
        assert_eq!(Guid::ZERO.to_string(), "00000000-0000-0000-0000-000000000000");
        assert!(Guid::ZERO.is_zero());
    }

    #[test]
    fn should_build_vendor_guid_from_literal() {
        let guid = Guid::from_u128(0x8000_0000_0000_0000_0000_0000_0000_0006);
        assert_eq!(guid.to_string(), "80000000-0000-0000-0000-000000000006");
    }

    #[test]
    fn should_return_error_when_parsing_invalid_guid() {
        assert!(Guid::from_str("not-a-guid").is_err());
    }
}
