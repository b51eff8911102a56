//! Identity newtypes for slots and owners.
//!
//! Both IDs are distinct newtype wrappers over `String`, so a `SlotId` cannot
//! be passed where an `OwnerId` is expected. Equality is by value.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a transferable slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(pub String);

/// Identifier of an owning party.
///
/// The empty string is the "unowned" sentinel; use [`OwnerId::empty`] and
/// [`OwnerId::is_empty`] rather than comparing against `""`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct OwnerId(pub String);

impl SlotId {
    pub fn new(value: impl Into<String>) -> Self {
        SlotId(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl OwnerId {
    pub fn new(value: impl Into<String>) -> Self {
        OwnerId(value.into())
    }

    /// The "unowned" sentinel.
    pub fn empty() -> Self {
        OwnerId(String::new())
    }

    /// True for the "unowned" sentinel.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SlotId {
    fn from(value: &str) -> Self {
        SlotId(value.to_string())
    }
}

impl From<&str> for OwnerId {
    fn from(value: &str) -> Self {
        OwnerId(value.to_string())
    }
}

// Display implementations

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "<unowned>")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_owner_is_default() {
        assert_eq!(OwnerId::default(), OwnerId::empty());
        assert!(OwnerId::empty().is_empty());
        assert!(!OwnerId::from("alice").is_empty());
    }

    #[test]
    fn ids_compare_by_value() {
        assert_eq!(SlotId::from("A"), SlotId::new(String::from("A")));
        assert_ne!(OwnerId::from("x"), OwnerId::from("y"));
    }

    #[test]
    fn slot_id_display() {
        assert_eq!(format!("{}", SlotId::from("SlotA")), "SlotA");
    }

    #[test]
    fn owner_id_display() {
        assert_eq!(format!("{}", OwnerId::from("Bob")), "Bob");
        assert_eq!(format!("{}", OwnerId::empty()), "<unowned>");
    }

    #[test]
    fn serde_is_transparent_string() {
        let json = serde_json::to_string(&SlotId::from("A")).unwrap();
        assert_eq!(json, "\"A\"");

        let back: OwnerId = serde_json::from_str("\"Eve\"").unwrap();
        assert_eq!(back, OwnerId::from("Eve"));
    }
}
