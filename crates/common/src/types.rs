use serde::{Deserialize, Serialize};

/// Identifier of a user record.
///
/// Assigned by the record store on creation. The zero value means "not yet
/// assigned" and is rejected wherever a reference to an existing user is
/// required.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    /// Creates a user ID from a raw value.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the unassigned (zero) ID.
    pub const fn unset() -> Self {
        Self(0)
    }

    /// Returns true if no ID has been assigned.
    pub fn is_unset(&self) -> bool {
        self.0 == 0
    }

    /// Returns the raw value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<UserId> for u64 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

/// Identifier of an order record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct OrderId(u64);

impl OrderId {
    /// Creates an order ID from a raw value.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the unassigned (zero) ID.
    pub const fn unset() -> Self {
        Self(0)
    }

    /// Returns true if no ID has been assigned.
    pub fn is_unset(&self) -> bool {
        self.0 == 0
    }

    /// Returns the raw value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for OrderId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<OrderId> for u64 {
    fn from(id: OrderId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ids_are_unset() {
        assert!(UserId::default().is_unset());
        assert!(OrderId::default().is_unset());
        assert!(!UserId::new(1).is_unset());
    }

    #[test]
    fn ids_serialize_as_plain_numbers() {
        let json = serde_json::to_string(&OrderId::new(42)).unwrap();
        assert_eq!(json, "42");
        let id: UserId = serde_json::from_str("7").unwrap();
        assert_eq!(id, UserId::new(7));
    }

    #[test]
    fn display_uses_raw_value() {
        assert_eq!(UserId::new(999).to_string(), "999");
        assert_eq!(OrderId::from(3).as_u64(), 3);
    }
}
