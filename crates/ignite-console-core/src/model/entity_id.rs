// ── Core identity types ──
//
// EntityId is the key of every store slice and every link array.
// ItemRef is what a route or a CLI argument names: an existing id, or
// the literal `new` for an item that has not been saved yet.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ── EntityId ────────────────────────────────────────────────────────

/// Canonical identifier for any configuration entity.
///
/// Transparently wraps either a UUID (ids minted client-side for new
/// items) or a backend-issued string such as a MongoDB ObjectId.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Uuid(Uuid),
    Legacy(String),
}

impl EntityId {
    /// Mint a fresh id for an item that exists only locally.
    pub fn generate() -> Self {
        Self::Uuid(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Option<&Uuid> {
        match self {
            Self::Uuid(u) => Some(u),
            Self::Legacy(_) => None,
        }
    }

    pub fn as_legacy(&self) -> Option<&str> {
        match self {
            Self::Legacy(s) => Some(s),
            Self::Uuid(_) => None,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uuid(u) => write!(f, "{u}"),
            Self::Legacy(s) => write!(f, "{s}"),
        }
    }
}

impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_owned()))
    }
}

impl From<Uuid> for EntityId {
    fn from(u: Uuid) -> Self {
        Self::Uuid(u)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        match Uuid::parse_str(&s) {
            Ok(u) => Self::Uuid(u),
            Err(_) => Self::Legacy(s),
        }
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::from(s.to_owned())
    }
}

// ── ItemRef ─────────────────────────────────────────────────────────

/// The item a screen is editing: an existing entity, or a blank one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemRef {
    New,
    Existing(EntityId),
}

impl ItemRef {
    pub const NEW: &'static str = "new";

    pub fn id(&self) -> Option<&EntityId> {
        match self {
            Self::New => None,
            Self::Existing(id) => Some(id),
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Self::New)
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => f.write_str(Self::NEW),
            Self::Existing(id) => write!(f, "{id}"),
        }
    }
}

impl FromStr for ItemRef {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Self::NEW {
            Ok(Self::New)
        } else {
            Ok(Self::Existing(EntityId::from(s)))
        }
    }
}

impl From<EntityId> for ItemRef {
    fn from(id: EntityId) -> Self {
        Self::Existing(id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_from_uuid_string() {
        let id = EntityId::from("550e8400-e29b-41d4-a716-446655440000".to_owned());
        assert!(id.as_uuid().is_some());
    }

    #[test]
    fn entity_id_from_object_id() {
        let id = EntityId::from("507f1f77bcf86cd799439011".to_owned());
        assert_eq!(id.as_legacy(), Some("507f1f77bcf86cd799439011"));
    }

    #[test]
    fn entity_id_serializes_as_plain_string() {
        let id = EntityId::from("c1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"c1\"");
        let back: EntityId = serde_json::from_str("\"c1\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(EntityId::generate(), EntityId::generate());
    }

    #[test]
    fn item_ref_parses_new() {
        let r: ItemRef = "new".parse().unwrap();
        assert!(r.is_new());
        assert_eq!(r.id(), None);

        let r: ItemRef = "ca1".parse().unwrap();
        assert_eq!(r.id(), Some(&EntityId::from("ca1")));
        assert_eq!(r.to_string(), "ca1");
    }
}
