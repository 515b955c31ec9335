//! Secondary project contributors

use crate::ids::{CollaboratorId, ProjectId, UserId};
use crate::Timestamp;
use serde::{Deserialize, Serialize};

/// Collaborator role within a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollaboratorRole {
    /// Read-only access
    Viewer,
    /// Contributes work
    Contributor,
    /// Manages on the client's behalf
    Manager,
}

/// Membership of a user in a project, distinct from its client and developer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCollaborator {
    /// Membership id
    pub id: CollaboratorId,
    /// Project
    pub project_id: ProjectId,
    /// Member
    pub user_id: UserId,
    /// Role within the project
    pub role: CollaboratorRole,
    /// Join time
    pub joined_at: Timestamp,
}

impl ProjectCollaborator {
    /// New membership joined at `at`
    #[must_use]
    pub fn new(
        project_id: ProjectId,
        user_id: UserId,
        role: CollaboratorRole,
        at: Timestamp,
    ) -> Self {
        Self {
            id: CollaboratorId::new(),
            project_id,
            user_id,
            role,
            joined_at: at,
        }
    }
}
