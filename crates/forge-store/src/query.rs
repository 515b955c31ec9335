//! Filters, update guards and patches
//!
//! Filters select rows for reads. Guards are the `WHERE` clause of a
//! conditional update: the patch is applied only to rows the guard matches,
//! and the affected-row count tells the caller whether it won.

use forge_model::{
    Project, ProjectCollaborator, ProjectId, ProjectRequest, ProjectStatus, RequestStatus, Role,
    Timestamp, User, UserId,
};

/// Selection of project requests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestFilter {
    /// Owning client
    pub owner: Option<UserId>,
}

impl RequestFilter {
    /// Every request
    #[inline]
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Requests owned by `owner`
    #[inline]
    #[must_use]
    pub fn owned_by(owner: UserId) -> Self {
        Self {
            owner: Some(owner),
            ..Self::default()
        }
    }

    /// Whether `request` is selected
    #[must_use]
    pub fn matches(&self, request: &ProjectRequest) -> bool {
        self.owner.map_or(true, |o| request.user_id == o)
    }
}

/// Developer column predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeveloperFilter {
    /// `developer_id IS NULL`
    Unassigned,
    /// `developer_id = id`
    Is(UserId),
}

/// Selection of projects
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    /// Owning client
    pub client_id: Option<UserId>,
    /// Developer predicate
    pub developer: Option<DeveloperFilter>,
    /// Exact status
    pub status: Option<ProjectStatus>,
    /// Restrict to these ids
    pub ids: Option<Vec<ProjectId>>,
}

impl ProjectFilter {
    /// Every project
    #[inline]
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Projects owned by `client`
    #[inline]
    #[must_use]
    pub fn for_client(client: UserId) -> Self {
        Self {
            client_id: Some(client),
            ..Self::default()
        }
    }

    /// Projects whose primary developer is `developer`
    #[inline]
    #[must_use]
    pub fn assigned_to(developer: UserId) -> Self {
        Self {
            developer: Some(DeveloperFilter::Is(developer)),
            ..Self::default()
        }
    }

    /// `status = Approved AND developer_id IS NULL`
    #[inline]
    #[must_use]
    pub fn claimable() -> Self {
        Self {
            developer: Some(DeveloperFilter::Unassigned),
            status: Some(ProjectStatus::Approved),
            ..Self::default()
        }
    }

    /// Projects with one of `ids`
    #[inline]
    #[must_use]
    pub fn with_ids(ids: Vec<ProjectId>) -> Self {
        Self {
            ids: Some(ids),
            ..Self::default()
        }
    }

    /// Whether `project` is selected
    #[must_use]
    pub fn matches(&self, project: &Project) -> bool {
        self.client_id.map_or(true, |c| project.client_id == c)
            && self.status.map_or(true, |s| project.status == s)
            && self.developer.map_or(true, |d| match d {
                DeveloperFilter::Unassigned => project.developer_id.is_none(),
                DeveloperFilter::Is(id) => project.developer_id == Some(id),
            })
            && self.ids.as_ref().map_or(true, |ids| ids.contains(&project.id))
    }
}

/// Selection of collaborator memberships
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollaboratorFilter {
    /// Project
    pub project_id: Option<ProjectId>,
    /// Member
    pub user_id: Option<UserId>,
}

impl CollaboratorFilter {
    /// Memberships of `user`
    #[inline]
    #[must_use]
    pub fn for_user(user: UserId) -> Self {
        Self {
            user_id: Some(user),
            ..Self::default()
        }
    }

    /// Members of `project`
    #[inline]
    #[must_use]
    pub fn for_project(project: ProjectId) -> Self {
        Self {
            project_id: Some(project),
            ..Self::default()
        }
    }

    /// Whether `collaborator` is selected
    #[must_use]
    pub fn matches(&self, collaborator: &ProjectCollaborator) -> bool {
        self.project_id.map_or(true, |p| collaborator.project_id == p)
            && self.user_id.map_or(true, |u| collaborator.user_id == u)
    }
}

/// `WHERE` clause of a conditional request update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestGuard {
    /// `status = X`
    pub status: Option<RequestStatus>,
}

impl RequestGuard {
    /// Match only while the request is still in `status`
    #[inline]
    #[must_use]
    pub fn status_is(status: RequestStatus) -> Self {
        Self {
            status: Some(status),
        }
    }

    /// Whether the guard holds for `request`
    #[must_use]
    pub fn matches(&self, request: &ProjectRequest) -> bool {
        self.status.map_or(true, |s| request.status == s)
    }
}

/// `WHERE` clause of a conditional project update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectGuard {
    /// `status = X`
    pub status: Option<ProjectStatus>,
    /// `developer_id IS NULL`
    pub unassigned: bool,
}

impl ProjectGuard {
    /// Match only while the project is still in `status`
    #[inline]
    #[must_use]
    pub fn status_is(status: ProjectStatus) -> Self {
        Self {
            status: Some(status),
            unassigned: false,
        }
    }

    /// `status = Approved AND developer_id IS NULL`
    #[inline]
    #[must_use]
    pub fn claimable() -> Self {
        Self {
            status: Some(ProjectStatus::Approved),
            unassigned: true,
        }
    }

    /// Whether the guard holds for `project`
    #[must_use]
    pub fn matches(&self, project: &Project) -> bool {
        self.status.map_or(true, |s| project.status == s)
            && (!self.unassigned || project.developer_id.is_none())
    }
}

/// Column assignments for a request update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestPatch {
    /// New status
    pub status: Option<RequestStatus>,
    /// New `updated_at`
    pub updated_at: Option<Timestamp>,
    /// New `reviewed_at`
    pub reviewed_at: Option<Timestamp>,
}

impl RequestPatch {
    /// Set status and stamp `updated_at`
    #[inline]
    #[must_use]
    pub fn status(status: RequestStatus, at: Timestamp) -> Self {
        Self {
            status: Some(status),
            updated_at: Some(at),
            reviewed_at: None,
        }
    }

    /// Also stamp `reviewed_at`
    #[inline]
    #[must_use]
    pub fn reviewed(mut self, at: Timestamp) -> Self {
        self.reviewed_at = Some(at);
        self
    }

    /// Apply to `request`
    pub fn apply(&self, request: &mut ProjectRequest) {
        if let Some(status) = self.status {
            request.status = status;
        }
        if let Some(at) = self.updated_at {
            request.updated_at = at;
        }
        if let Some(at) = self.reviewed_at {
            request.reviewed_at = Some(at);
        }
    }
}

/// Column assignments for a project update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    /// New status
    pub status: Option<ProjectStatus>,
    /// Assign a developer
    pub developer_id: Option<UserId>,
    /// New progress
    pub progress_percentage: Option<u8>,
    /// New `updated_at`
    pub updated_at: Option<Timestamp>,
}

impl ProjectPatch {
    /// Set status and stamp `updated_at`
    #[inline]
    #[must_use]
    pub fn status(status: ProjectStatus, at: Timestamp) -> Self {
        Self {
            status: Some(status),
            updated_at: Some(at),
            ..Self::default()
        }
    }

    /// Also assign `developer`
    #[inline]
    #[must_use]
    pub fn with_developer(mut self, developer: UserId) -> Self {
        self.developer_id = Some(developer);
        self
    }

    /// Also set progress
    #[inline]
    #[must_use]
    pub fn with_progress(mut self, progress: Option<u8>) -> Self {
        self.progress_percentage = progress;
        self
    }

    /// Apply to `project`
    pub fn apply(&self, project: &mut Project) {
        if let Some(status) = self.status {
            project.status = status;
        }
        if let Some(developer) = self.developer_id {
            project.developer_id = Some(developer);
        }
        if let Some(progress) = self.progress_percentage {
            project.progress_percentage = Some(progress);
        }
        if let Some(at) = self.updated_at {
            project.updated_at = at;
        }
    }
}

/// Column assignments for a user update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserPatch {
    /// New role
    pub role: Option<Role>,
}

impl UserPatch {
    /// Apply to `user`
    pub fn apply(&self, user: &mut User) {
        if let Some(role) = self.role {
            user.role = role;
        }
    }
}
