use chrono::{DateTime, Utc};
use serde::Serialize;

/// Application user as persisted in the `users` table
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub status: bool, // active flag
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to insert a user (id and timestamps come from the store)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub status: bool,
}

/// Fields overwritten when an existing user is re-seeded
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub name: String,
    pub password_hash: String,
    pub status: bool,
}

impl NewUser {
    /// Changes that bring an existing row in line with this user
    pub fn as_changes(&self) -> UserChanges {
        UserChanges {
            name: self.name.clone(),
            password_hash: self.password_hash.clone(),
            status: self.status,
        }
    }
}
