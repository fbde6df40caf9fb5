//! # User model
//!
//! [`User`] is one row of the `user` table as the rest of the crate sees it.
//! The role is a real enumeration ([`Role`]); the integer encoding used by the
//! `role` column is confined to [`Role::from_code`] / [`Role::code`] and only
//! the datastore calls them.
//!
//! The password hash never leaves the server: it is skipped when a `User` is
//! serialised.

use serde::{Deserialize, Serialize};

/// Access level of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Regular,
}

impl Role {
    /// Storage code marking an administrator.
    pub const ADMIN_CODE: i64 = -7;
    /// Storage code written for regular users.
    pub const REGULAR_CODE: i64 = 0;

    /// Decode the `role` column. Anything but the admin code is a regular user.
    pub fn from_code(code: i64) -> Self {
        if code == Self::ADMIN_CODE {
            Role::Admin
        } else {
            Role::Regular
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Role::Admin => Self::ADMIN_CODE,
            Role::Regular => Self::REGULAR_CODE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Regular => "regular",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full user record.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("username", &self.username)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Input for creating a user; the password is hashed before it is stored.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}
