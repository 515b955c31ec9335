//! Project requests submitted by clients

use crate::error::ModelError;
use crate::ids::{RequestId, UserId};
use crate::state_machine::Lifecycle;
use crate::Timestamp;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Request lifecycle state
///
/// `Requested -> InReview -> Approved`, with `Cancelled` reachable from
/// either open state. `Approved` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Submitted, awaiting triage
    Requested,
    /// Picked up by an administrator
    InReview,
    /// Materialized into a project
    Approved,
    /// Withdrawn or rejected
    Cancelled,
}

impl RequestStatus {
    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Requested => "requested",
            RequestStatus::InReview => "in_review",
            RequestStatus::Approved => "approved",
            RequestStatus::Cancelled => "cancelled",
        }
    }
}

impl Lifecycle for RequestStatus {
    fn allowed_transitions(self) -> &'static [Self] {
        use RequestStatus::*;
        match self {
            Requested => &[InReview, Cancelled],
            InReview => &[Approved, Cancelled],
            Approved | Cancelled => &[],
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "requested" => Ok(RequestStatus::Requested),
            "in_review" | "inreview" => Ok(RequestStatus::InReview),
            "approved" => Ok(RequestStatus::Approved),
            "cancelled" | "canceled" => Ok(RequestStatus::Cancelled),
            _ => Err(ModelError::UnknownStatus(s.to_string())),
        }
    }
}

/// A client's request for a new project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRequest {
    /// Request id
    pub id: RequestId,
    /// Owning client; never changes
    pub user_id: UserId,
    /// Current lifecycle state
    pub status: RequestStatus,
    /// Name the project will carry once approved
    pub project_name: String,
    /// Optional headline
    pub title: Option<String>,
    /// Free-form description
    pub description: String,
    /// Category (web, mobile, ...)
    pub project_type: String,
    /// Budget range as entered by the client
    pub budget: Option<String>,
    /// Desired timeline as entered by the client
    pub timeline: Option<String>,
    /// Requirements text
    pub requirements: Option<String>,
    /// Creation time
    pub created_at: Timestamp,
    /// Last mutation time
    pub updated_at: Timestamp,
    /// Set when an administrator approves or rejects
    pub reviewed_at: Option<Timestamp>,
}

impl ProjectRequest {
    /// Build a fresh `Requested` request owned by `owner`
    #[must_use]
    pub fn from_input(input: NewProjectRequest, owner: UserId, at: Timestamp) -> Self {
        Self {
            id: RequestId::new(),
            user_id: owner,
            status: RequestStatus::Requested,
            project_name: input.project_name,
            title: input.title,
            description: input.description,
            project_type: input.project_type,
            budget: input.budget,
            timeline: input.timeline,
            requirements: input.requirements,
            created_at: at,
            updated_at: at,
            reviewed_at: None,
        }
    }

    /// Whether `user` owns this request
    #[inline]
    #[must_use]
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.user_id == user
    }
}

/// Input for creating a request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProjectRequest {
    /// Project name
    pub project_name: String,
    /// Optional headline
    #[serde(default)]
    pub title: Option<String>,
    /// Description
    pub description: String,
    /// Category
    pub project_type: String,
    /// Budget range
    #[serde(default)]
    pub budget: Option<String>,
    /// Timeline
    #[serde(default)]
    pub timeline: Option<String>,
    /// Requirements
    #[serde(default)]
    pub requirements: Option<String>,
}

impl NewProjectRequest {
    /// Create input with the required fields
    #[must_use]
    pub fn new(
        project_name: impl Into<String>,
        description: impl Into<String>,
        project_type: impl Into<String>,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            description: description.into(),
            project_type: project_type.into(),
            ..Self::default()
        }
    }

    /// With budget
    #[inline]
    #[must_use]
    pub fn with_budget(mut self, budget: impl Into<String>) -> Self {
        self.budget = Some(budget.into());
        self
    }

    /// With requirements
    #[inline]
    #[must_use]
    pub fn with_requirements(mut self, requirements: impl Into<String>) -> Self {
        self.requirements = Some(requirements.into());
        self
    }

    /// With timeline
    #[inline]
    #[must_use]
    pub fn with_timeline(mut self, timeline: impl Into<String>) -> Self {
        self.timeline = Some(timeline.into());
        self
    }
}
