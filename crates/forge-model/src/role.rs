//! User roles and their authorization rank

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Closed set of user roles
///
/// Ordering for permission checks is `Client < Developer < Admin`, with
/// `SuperAdmin` ranked equal to `Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Submits project requests and owns projects
    Client,
    /// Claims and executes approved projects
    Developer,
    /// Triages and approves requests
    Admin,
    /// Admin-equivalent for every check in this service
    SuperAdmin,
}

impl Role {
    /// Numeric rank used by permission checks
    #[inline]
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Role::Client => 0,
            Role::Developer => 1,
            Role::Admin | Role::SuperAdmin => 2,
        }
    }

    /// Whether this role meets a `required` role
    #[inline]
    #[must_use]
    pub fn satisfies(self, required: Role) -> bool {
        self.rank() >= required.rank()
    }

    /// Admin or SuperAdmin
    #[inline]
    #[must_use]
    pub fn is_admin_equivalent(self) -> bool {
        self.satisfies(Role::Admin)
    }

    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Developer => "developer",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "client" => Ok(Role::Client),
            "developer" => Ok(Role::Developer),
            "admin" => Ok(Role::Admin),
            "super_admin" | "superadmin" => Ok(Role::SuperAdmin),
            _ => Err(ModelError::UnknownRole(s.to_string())),
        }
    }
}
