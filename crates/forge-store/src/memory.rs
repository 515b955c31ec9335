//! In-memory store
//!
//! Committed state is a set of persistent (`im`) tables behind a lock.
//! A transaction:
//! - holds the writer gate for its whole lifetime, so writers are serialized
//! - works on an O(1) clone of the committed tables
//! - publishes its clone with a single swap on commit
//!
//! Readers never wait on writers and never see a half-applied transaction.

use crate::error::StoreError;
use crate::query::{
    CollaboratorFilter, ProjectFilter, ProjectGuard, ProjectPatch, RequestFilter, RequestGuard,
    RequestPatch, UserPatch,
};
use crate::store::{Store, Transaction};
use async_trait::async_trait;
use forge_model::{
    CollaboratorId, EntityRef, Project, ProjectCollaborator, ProjectId, ProjectRequest, RequestId,
    StatusUpdate, User, UserId,
};
use im::{OrdMap, Vector};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;

/// Failure points that can be armed for a single transaction step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    /// Next `insert_project` fails
    InsertProject,
    /// Next `insert_status_update` fails
    InsertStatusUpdate,
    /// Next `update_project` fails
    UpdateProject,
    /// Next `commit` fails
    Commit,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    users: OrdMap<UserId, User>,
    requests: OrdMap<RequestId, ProjectRequest>,
    projects: OrdMap<ProjectId, Project>,
    status_updates: Vector<StatusUpdate>,
    collaborators: OrdMap<CollaboratorId, ProjectCollaborator>,
    next_sequence: u64,
}

impl Tables {
    fn requests_matching(&self, filter: &RequestFilter) -> Vec<ProjectRequest> {
        self.requests
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect()
    }

    fn projects_matching(&self, filter: &ProjectFilter) -> Vec<Project> {
        self.projects
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect()
    }

    fn collaborators_matching(&self, filter: &CollaboratorFilter) -> Vec<ProjectCollaborator> {
        self.collaborators
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect()
    }

    fn status_updates_of(&self, entity: EntityRef) -> Vec<StatusUpdate> {
        self.status_updates
            .iter()
            .filter(|u| u.entity == entity)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Default)]
struct Shared {
    committed: RwLock<Tables>,
    writer: Arc<tokio::sync::Mutex<()>>,
    armed: Mutex<Vec<Fault>>,
}

impl Shared {
    fn trip(&self, fault: Fault) -> Result<(), StoreError> {
        let mut armed = self.armed.lock();
        if let Some(idx) = armed.iter().position(|f| *f == fault) {
            armed.remove(idx);
            tracing::debug!(?fault, "injected store fault");
            return Err(StoreError::Backend(format!("injected fault: {fault:?}")));
        }
        Ok(())
    }
}

/// Thread-safe in-memory [`Store`]
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    /// Create an empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a one-shot failure for the next matching transaction step
    pub fn inject_fault(&self, fault: Fault) {
        self.shared.armed.lock().push(fault);
    }

    /// Number of committed audit entries
    #[must_use]
    pub fn status_update_count(&self) -> usize {
        self.shared.committed.read().status_updates.len()
    }

    /// Number of committed projects
    #[must_use]
    pub fn project_count(&self) -> usize {
        self.shared.committed.read().projects.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.shared.committed.read().users.get(&id).cloned())
    }

    async fn find_request(&self, id: RequestId) -> Result<Option<ProjectRequest>, StoreError> {
        Ok(self.shared.committed.read().requests.get(&id).cloned())
    }

    async fn find_requests(
        &self,
        filter: &RequestFilter,
    ) -> Result<Vec<ProjectRequest>, StoreError> {
        Ok(self.shared.committed.read().requests_matching(filter))
    }

    async fn find_project(&self, id: ProjectId) -> Result<Option<Project>, StoreError> {
        Ok(self.shared.committed.read().projects.get(&id).cloned())
    }

    async fn find_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>, StoreError> {
        Ok(self.shared.committed.read().projects_matching(filter))
    }

    async fn find_status_updates(
        &self,
        entity: EntityRef,
    ) -> Result<Vec<StatusUpdate>, StoreError> {
        Ok(self.shared.committed.read().status_updates_of(entity))
    }

    async fn find_collaborators(
        &self,
        filter: &CollaboratorFilter,
    ) -> Result<Vec<ProjectCollaborator>, StoreError> {
        Ok(self.shared.committed.read().collaborators_matching(filter))
    }

    async fn begin(&self) -> Result<Box<dyn Transaction>, StoreError> {
        // Suspension point, as the round-trip to a real backend would be.
        tokio::task::yield_now().await;

        let gate = Arc::clone(&self.shared.writer).lock_owned().await;
        let staged = self.shared.committed.read().clone();

        Ok(Box::new(MemoryTransaction {
            shared: Arc::clone(&self.shared),
            staged,
            _gate: gate,
        }))
    }
}

/// Transaction over a [`MemoryStore`]
///
/// Holds the writer gate until committed or dropped.
#[derive(Debug)]
struct MemoryTransaction {
    shared: Arc<Shared>,
    staged: Tables,
    _gate: OwnedMutexGuard<()>,
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn find_user(&mut self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.staged.users.get(&id).cloned())
    }

    async fn find_request(&mut self, id: RequestId) -> Result<Option<ProjectRequest>, StoreError> {
        Ok(self.staged.requests.get(&id).cloned())
    }

    async fn find_project(&mut self, id: ProjectId) -> Result<Option<Project>, StoreError> {
        Ok(self.staged.projects.get(&id).cloned())
    }

    async fn insert_user(&mut self, user: User) -> Result<(), StoreError> {
        if self.staged.users.contains_key(&user.id) {
            return Err(StoreError::unique("users", format!("id={}", user.id)));
        }
        if self
            .staged
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StoreError::unique("users", format!("email={}", user.email)));
        }
        self.staged.users.insert(user.id, user);
        Ok(())
    }

    async fn insert_request(&mut self, request: ProjectRequest) -> Result<(), StoreError> {
        if self.staged.requests.contains_key(&request.id) {
            return Err(StoreError::unique(
                "project_requests",
                format!("id={}", request.id),
            ));
        }
        self.staged.requests.insert(request.id, request);
        Ok(())
    }

    async fn insert_project(&mut self, project: Project) -> Result<(), StoreError> {
        self.shared.trip(Fault::InsertProject)?;

        if self.staged.projects.contains_key(&project.id) {
            return Err(StoreError::unique("projects", format!("id={}", project.id)));
        }
        if let Some(request_id) = project.request_id {
            if self
                .staged
                .projects
                .values()
                .any(|p| p.request_id == Some(request_id))
            {
                return Err(StoreError::unique(
                    "projects",
                    format!("request_id={request_id}"),
                ));
            }
        }
        self.staged.projects.insert(project.id, project);
        Ok(())
    }

    async fn insert_status_update(
        &mut self,
        mut update: StatusUpdate,
    ) -> Result<StatusUpdate, StoreError> {
        self.shared.trip(Fault::InsertStatusUpdate)?;

        self.staged.next_sequence += 1;
        update.sequence = self.staged.next_sequence;
        self.staged.status_updates.push_back(update.clone());
        Ok(update)
    }

    async fn insert_collaborator(
        &mut self,
        collaborator: ProjectCollaborator,
    ) -> Result<(), StoreError> {
        if self.staged.collaborators.values().any(|c| {
            c.project_id == collaborator.project_id && c.user_id == collaborator.user_id
        }) {
            return Err(StoreError::unique(
                "project_collaborators",
                format!(
                    "project_id={} user_id={}",
                    collaborator.project_id, collaborator.user_id
                ),
            ));
        }
        self.staged
            .collaborators
            .insert(collaborator.id, collaborator);
        Ok(())
    }

    async fn update_request(
        &mut self,
        id: RequestId,
        guard: RequestGuard,
        patch: RequestPatch,
    ) -> Result<u64, StoreError> {
        match self.staged.requests.get_mut(&id) {
            Some(request) if guard.matches(request) => {
                patch.apply(request);
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn update_project(
        &mut self,
        id: ProjectId,
        guard: ProjectGuard,
        patch: ProjectPatch,
    ) -> Result<u64, StoreError> {
        self.shared.trip(Fault::UpdateProject)?;

        match self.staged.projects.get_mut(&id) {
            Some(project) if guard.matches(project) => {
                patch.apply(project);
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn update_user(&mut self, id: UserId, patch: UserPatch) -> Result<u64, StoreError> {
        match self.staged.users.get_mut(&id) {
            Some(user) => {
                patch.apply(user);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.shared.trip(Fault::Commit)?;

        let MemoryTransaction {
            shared, staged, _gate, ..
        } = *self;
        *shared.committed.write() = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}
