//! Store and transaction traits

use crate::error::StoreError;
use crate::query::{
    CollaboratorFilter, ProjectFilter, ProjectGuard, ProjectPatch, RequestFilter, RequestGuard,
    RequestPatch, UserPatch,
};
use async_trait::async_trait;
use forge_model::{
    EntityRef, Project, ProjectCollaborator, ProjectId, ProjectRequest, RequestId, StatusUpdate,
    User, UserId,
};

/// Relational store boundary
///
/// Reads on the store observe the last committed state. All writes go
/// through a [`Transaction`] opened with [`Store::begin`].
#[async_trait]
pub trait Store: Send + Sync + std::fmt::Debug {
    /// Find a user by id
    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Find a request by id
    async fn find_request(&self, id: RequestId) -> Result<Option<ProjectRequest>, StoreError>;

    /// Requests matching `filter`, in id order
    async fn find_requests(&self, filter: &RequestFilter)
        -> Result<Vec<ProjectRequest>, StoreError>;

    /// Find a project by id
    async fn find_project(&self, id: ProjectId) -> Result<Option<Project>, StoreError>;

    /// Projects matching `filter`, in id order
    async fn find_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>, StoreError>;

    /// Audit entries of `entity`, in append order
    async fn find_status_updates(&self, entity: EntityRef)
        -> Result<Vec<StatusUpdate>, StoreError>;

    /// Collaborator memberships matching `filter`
    async fn find_collaborators(
        &self,
        filter: &CollaboratorFilter,
    ) -> Result<Vec<ProjectCollaborator>, StoreError>;

    /// Open a unit of work
    ///
    /// Dropping the returned transaction without calling
    /// [`Transaction::commit`] discards every write made through it.
    async fn begin(&self) -> Result<Box<dyn Transaction>, StoreError>;
}

/// An open unit of work
///
/// Reads see the transaction's own writes. Conditional updates return the
/// number of rows their guard matched (0 or 1).
#[async_trait]
pub trait Transaction: Send {
    /// Find a user by id
    async fn find_user(&mut self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Find a request by id
    async fn find_request(&mut self, id: RequestId) -> Result<Option<ProjectRequest>, StoreError>;

    /// Find a project by id
    async fn find_project(&mut self, id: ProjectId) -> Result<Option<Project>, StoreError>;

    /// Insert a user; ids and emails are unique
    async fn insert_user(&mut self, user: User) -> Result<(), StoreError>;

    /// Insert a request
    async fn insert_request(&mut self, request: ProjectRequest) -> Result<(), StoreError>;

    /// Insert a project; at most one project per originating request
    async fn insert_project(&mut self, project: Project) -> Result<(), StoreError>;

    /// Append an audit entry
    ///
    /// The store assigns `sequence`; the value on `update` is overwritten.
    /// Returns the entry as stored.
    async fn insert_status_update(
        &mut self,
        update: StatusUpdate,
    ) -> Result<StatusUpdate, StoreError>;

    /// Insert a collaborator; one membership per (project, user)
    async fn insert_collaborator(
        &mut self,
        collaborator: ProjectCollaborator,
    ) -> Result<(), StoreError>;

    /// `UPDATE project_requests SET patch WHERE id = id AND guard`
    async fn update_request(
        &mut self,
        id: RequestId,
        guard: RequestGuard,
        patch: RequestPatch,
    ) -> Result<u64, StoreError>;

    /// `UPDATE projects SET patch WHERE id = id AND guard`
    async fn update_project(
        &mut self,
        id: ProjectId,
        guard: ProjectGuard,
        patch: ProjectPatch,
    ) -> Result<u64, StoreError>;

    /// `UPDATE users SET patch WHERE id = id`
    async fn update_user(&mut self, id: UserId, patch: UserPatch) -> Result<u64, StoreError>;

    /// Make every write visible atomically
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    /// Discard every write
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
