use chrono::{DateTime, Utc};
use common::UserId;
use serde::{Deserialize, Serialize};

use super::{UserError, is_valid_email};

/// Minimum display name length, in characters, after trimming.
pub const MIN_NAME_CHARS: usize = 2;

/// Maximum display name length, in characters, after trimming.
pub const MAX_NAME_CHARS: usize = 100;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a validated user. The name is stored trimmed.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Result<Self, UserError> {
        let now = Utc::now();
        let user = Self {
            id: UserId::unset(),
            name: name.into().trim().to_string(),
            email: email.into(),
            created_at: now,
            updated_at: now,
        };
        user.validate()?;
        Ok(user)
    }

    /// Checks, in order: name present, name length, email present, email format.
    pub fn validate(&self) -> Result<(), UserError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(UserError::NameRequired);
        }
        let len = name.chars().count();
        if !(MIN_NAME_CHARS..=MAX_NAME_CHARS).contains(&len) {
            return Err(UserError::NameLength);
        }
        if self.email.is_empty() {
            return Err(UserError::EmailRequired);
        }
        if !is_valid_email(&self.email) {
            return Err(UserError::EmailInvalid);
        }
        Ok(())
    }
}
