//! Append-only audit entries

use crate::ids::{ProjectId, RequestId, StatusUpdateId, UserId};
use crate::project::ProjectStatus;
use crate::request::RequestStatus;
use crate::Timestamp;
use serde::{Deserialize, Serialize};

/// Kind of audited entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    /// A project request
    #[serde(rename = "project_request")]
    ProjectRequest,
    /// A project
    #[serde(rename = "project")]
    Project,
}

impl EntityType {
    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::ProjectRequest => "project_request",
            EntityType::Project => "project",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to an audited entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "entityType", content = "entityId")]
pub enum EntityRef {
    /// A project request
    #[serde(rename = "project_request")]
    Request(RequestId),
    /// A project
    #[serde(rename = "project")]
    Project(ProjectId),
}

impl EntityRef {
    /// Entity kind
    #[inline]
    #[must_use]
    pub fn entity_type(self) -> EntityType {
        match self {
            EntityRef::Request(_) => EntityType::ProjectRequest,
            EntityRef::Project(_) => EntityType::Project,
        }
    }
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityRef::Request(id) => write!(f, "project_request:{id}"),
            EntityRef::Project(id) => write!(f, "project:{id}"),
        }
    }
}

/// Status value of either lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityStatus {
    /// Request state
    Request(RequestStatus),
    /// Project state
    Project(ProjectStatus),
}

impl std::fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityStatus::Request(s) => s.fmt(f),
            EntityStatus::Project(s) => s.fmt(f),
        }
    }
}

impl From<RequestStatus> for EntityStatus {
    fn from(value: RequestStatus) -> Self {
        EntityStatus::Request(value)
    }
}

impl From<ProjectStatus> for EntityStatus {
    fn from(value: ProjectStatus) -> Self {
        EntityStatus::Project(value)
    }
}

/// One recorded status transition
///
/// Never mutated or deleted once committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    /// Entry id
    pub id: StatusUpdateId,
    /// Store-assigned append order; breaks `created_at` ties
    pub sequence: u64,
    /// Audited entity
    #[serde(flatten)]
    pub entity: EntityRef,
    /// State before the change (`None` on creation)
    pub old_status: Option<EntityStatus>,
    /// State after the change
    pub new_status: EntityStatus,
    /// Human-readable note
    pub update_message: String,
    /// Progress at the time of the update
    pub progress_percentage: Option<u8>,
    /// Visible to non-admin actors
    pub is_client_visible: bool,
    /// Acting user
    pub updated_by: UserId,
    /// Append time
    pub created_at: Timestamp,
}

impl StatusUpdate {
    /// New client-visible entry; `sequence` is left for the store to assign
    #[must_use]
    pub fn new(
        entity: EntityRef,
        old_status: Option<EntityStatus>,
        new_status: EntityStatus,
        updated_by: UserId,
        update_message: impl Into<String>,
        at: Timestamp,
    ) -> Self {
        Self {
            id: StatusUpdateId::new(),
            sequence: 0,
            entity,
            old_status,
            new_status,
            update_message: update_message.into(),
            progress_percentage: None,
            is_client_visible: true,
            updated_by,
            created_at: at,
        }
    }

    /// Attach a progress figure
    #[inline]
    #[must_use]
    pub fn with_progress(mut self, progress: Option<u8>) -> Self {
        self.progress_percentage = progress;
        self
    }

    /// Set client visibility
    #[inline]
    #[must_use]
    pub fn client_visible(mut self, visible: bool) -> Self {
        self.is_client_visible = visible;
        self
    }

    /// Chronological sort key
    #[inline]
    #[must_use]
    pub fn chronology(&self) -> (Timestamp, u64) {
        (self.created_at, self.sequence)
    }
}
