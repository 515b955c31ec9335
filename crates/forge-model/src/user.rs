//! Users

use crate::ids::UserId;
use crate::role::Role;
use crate::Timestamp;
use serde::{Deserialize, Serialize};

/// A registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User id
    pub id: UserId,
    /// Authorization role
    pub role: Role,
    /// Contact email
    pub email: String,
    /// Given name
    pub first_name: Option<String>,
    /// Family name
    pub last_name: Option<String>,
    /// Registration time
    pub created_at: Timestamp,
}

impl User {
    /// Build a user from registration input
    #[must_use]
    pub fn from_input(input: NewUser, at: Timestamp) -> Self {
        Self {
            id: input.id.unwrap_or_default(),
            role: input.role,
            email: input.email,
            first_name: input.first_name,
            last_name: input.last_name,
            created_at: at,
        }
    }
}

/// Registration input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    /// Fixed id from the identity provider; generated when absent
    #[serde(default)]
    pub id: Option<UserId>,
    /// Role
    pub role: Role,
    /// Email
    pub email: String,
    /// Given name
    #[serde(default)]
    pub first_name: Option<String>,
    /// Family name
    #[serde(default)]
    pub last_name: Option<String>,
}

impl NewUser {
    /// Create input with role and email
    #[must_use]
    pub fn new(role: Role, email: impl Into<String>) -> Self {
        Self {
            id: None,
            role,
            email: email.into(),
            first_name: None,
            last_name: None,
        }
    }

    /// With a fixed id
    #[inline]
    #[must_use]
    pub fn with_id(mut self, id: UserId) -> Self {
        self.id = Some(id);
        self
    }

    /// With given and family name
    #[inline]
    #[must_use]
    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_optional() {
        let user = User::from_input(NewUser::new(Role::Client, "a@b.c"), crate::now());
        assert_eq!(user.first_name, None);
        assert_eq!(user.last_name, None);

        let named = User::from_input(
            NewUser::new(Role::Client, "a@b.c").with_name("Ada", "Lovelace"),
            crate::now(),
        );
        assert_eq!(named.first_name.as_deref(), Some("Ada"));
        assert_eq!(named.last_name.as_deref(), Some("Lovelace"));
    }

    #[test]
    fn fixed_id_is_kept() {
        let id = UserId::new();
        let user = User::from_input(NewUser::new(Role::Admin, "x@y.z").with_id(id), crate::now());
        assert_eq!(user.id, id);
    }
}
