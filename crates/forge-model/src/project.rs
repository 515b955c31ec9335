//! Live projects

use crate::error::ModelError;
use crate::ids::{ProjectId, RequestId, UserId};
use crate::request::ProjectRequest;
use crate::state_machine::Lifecycle;
use crate::Timestamp;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Project lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Created but not yet approved for work
    Requested,
    /// Approved and open for a developer to claim
    Approved,
    /// Developer assigned and working
    InProgress,
    /// Under test
    InTesting,
    /// Accepted, waiting for launch
    ReadyForLaunch,
    /// Delivered
    Completed,
    /// Paused
    OnHold,
    /// Abandoned
    Cancelled,
}

impl ProjectStatus {
    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::Requested => "requested",
            ProjectStatus::Approved => "approved",
            ProjectStatus::InProgress => "in_progress",
            ProjectStatus::InTesting => "in_testing",
            ProjectStatus::ReadyForLaunch => "ready_for_launch",
            ProjectStatus::Completed => "completed",
            ProjectStatus::OnHold => "on_hold",
            ProjectStatus::Cancelled => "cancelled",
        }
    }

    /// Counted as active on dashboards
    #[inline]
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(
            self,
            ProjectStatus::Approved
                | ProjectStatus::InProgress
                | ProjectStatus::InTesting
                | ProjectStatus::ReadyForLaunch
        )
    }

    /// States that only make sense with a developer attached
    #[inline]
    #[must_use]
    pub fn requires_developer(self) -> bool {
        matches!(
            self,
            ProjectStatus::InProgress | ProjectStatus::InTesting | ProjectStatus::ReadyForLaunch
        )
    }
}

impl Lifecycle for ProjectStatus {
    fn allowed_transitions(self) -> &'static [Self] {
        use ProjectStatus::*;
        match self {
            Requested => &[Approved, Cancelled],
            Approved => &[InProgress, OnHold, Cancelled],
            InProgress => &[InTesting, OnHold, Cancelled],
            InTesting => &[InProgress, ReadyForLaunch, OnHold, Cancelled],
            ReadyForLaunch => &[InTesting, Completed, OnHold, Cancelled],
            OnHold => &[Approved, InProgress, Cancelled],
            Completed | Cancelled => &[],
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let status = match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "requested" => ProjectStatus::Requested,
            "approved" => ProjectStatus::Approved,
            "in_progress" => ProjectStatus::InProgress,
            "in_testing" => ProjectStatus::InTesting,
            "ready_for_launch" => ProjectStatus::ReadyForLaunch,
            "completed" => ProjectStatus::Completed,
            "on_hold" => ProjectStatus::OnHold,
            "cancelled" | "canceled" => ProjectStatus::Cancelled,
            _ => return Err(ModelError::UnknownStatus(s.to_string())),
        };
        Ok(status)
    }
}

/// A live project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Project id
    pub id: ProjectId,
    /// Originating request, if any
    pub request_id: Option<RequestId>,
    /// Owning client
    pub client_id: UserId,
    /// Primary developer; set exactly once
    pub developer_id: Option<UserId>,
    /// Current lifecycle state
    pub status: ProjectStatus,
    /// Display name
    pub project_name: String,
    /// Description
    pub description: String,
    /// Category
    pub project_type: String,
    /// Budget range
    pub budget: Option<String>,
    /// Requirements text
    pub requirements: Option<String>,
    /// Technologies in use
    pub tech_stack: Vec<String>,
    /// Completion, 0-100
    pub progress_percentage: Option<u8>,
    /// Creation time
    pub created_at: Timestamp,
    /// Last mutation time
    pub updated_at: Timestamp,
}

impl Project {
    /// Materialize the project for an approved request
    #[must_use]
    pub fn from_request(request: &ProjectRequest, at: Timestamp) -> Self {
        Self {
            id: ProjectId::new(),
            request_id: Some(request.id),
            client_id: request.user_id,
            developer_id: None,
            status: ProjectStatus::Approved,
            project_name: request.project_name.clone(),
            description: request.description.clone(),
            project_type: request.project_type.clone(),
            budget: request.budget.clone(),
            requirements: request.requirements.clone(),
            tech_stack: Vec::new(),
            progress_percentage: None,
            created_at: at,
            updated_at: at,
        }
    }

    /// Build a project created directly by an administrator
    #[must_use]
    pub fn from_input(input: NewProject, at: Timestamp) -> Self {
        Self {
            id: ProjectId::new(),
            request_id: None,
            client_id: input.client_id,
            developer_id: None,
            status: ProjectStatus::Approved,
            project_name: input.project_name,
            description: input.description,
            project_type: input.project_type,
            budget: input.budget,
            requirements: input.requirements,
            tech_stack: input.tech_stack,
            progress_percentage: None,
            created_at: at,
            updated_at: at,
        }
    }

    /// Open for a developer to claim
    #[inline]
    #[must_use]
    pub fn is_claimable(&self) -> bool {
        self.status == ProjectStatus::Approved && self.developer_id.is_none()
    }

    /// Whether `user` is the owning client
    #[inline]
    #[must_use]
    pub fn is_client(&self, user: UserId) -> bool {
        self.client_id == user
    }

    /// Whether `user` is the primary developer
    #[inline]
    #[must_use]
    pub fn is_developer(&self, user: UserId) -> bool {
        self.developer_id == Some(user)
    }
}

/// Input for an administrator-created project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    /// Owning client
    pub client_id: UserId,
    /// Display name
    pub project_name: String,
    /// Description
    pub description: String,
    /// Category
    pub project_type: String,
    /// Budget range
    #[serde(default)]
    pub budget: Option<String>,
    /// Requirements
    #[serde(default)]
    pub requirements: Option<String>,
    /// Technologies
    #[serde(default)]
    pub tech_stack: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::NewProjectRequest;
    use crate::state_machine::validate_transition;

    #[test]
    fn completed_and_cancelled_are_terminal() {
        assert!(ProjectStatus::Completed.is_terminal());
        assert!(ProjectStatus::Cancelled.is_terminal());
        assert!(!ProjectStatus::OnHold.is_terminal());
    }

    #[test]
    fn launch_path() {
        assert!(validate_transition(ProjectStatus::Approved, ProjectStatus::InProgress).is_ok());
        assert!(validate_transition(ProjectStatus::InProgress, ProjectStatus::InTesting).is_ok());
        assert!(
            validate_transition(ProjectStatus::InTesting, ProjectStatus::ReadyForLaunch).is_ok()
        );
        assert!(
            validate_transition(ProjectStatus::ReadyForLaunch, ProjectStatus::Completed).is_ok()
        );
        assert!(validate_transition(ProjectStatus::InProgress, ProjectStatus::Completed).is_err());
    }

    #[test]
    fn materialized_project_copies_request() {
        let owner = UserId::new();
        let request = ProjectRequest::from_input(
            NewProjectRequest::new("Shop", "Online store", "ecommerce")
                .with_budget("10k")
                .with_requirements("payments"),
            owner,
            crate::now(),
        );
        let project = Project::from_request(&request, crate::now());

        assert_eq!(project.request_id, Some(request.id));
        assert_eq!(project.client_id, owner);
        assert_eq!(project.project_name, "Shop");
        assert_eq!(project.budget.as_deref(), Some("10k"));
        assert_eq!(project.requirements.as_deref(), Some("payments"));
        assert!(project.is_claimable());
    }

    #[test]
    fn parse_status_variants() {
        assert_eq!(
            "ready-for-launch".parse::<ProjectStatus>().unwrap(),
            ProjectStatus::ReadyForLaunch
        );
        assert!("shipping".parse::<ProjectStatus>().is_err());
    }
}
