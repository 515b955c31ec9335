//! Status audit trail
//!
//! Entries are appended inside the transaction that performs the status
//! change they document, so both commit or neither does. Reads filter by
//! role: admin-equivalent actors see everything, everyone else sees only
//! client-visible entries.

use crate::auth::{Actor, AuthorizationGuard};
use crate::error::{ServiceError, ServiceResult};
use forge_model::{EntityRef, Project, ProjectId, StatusUpdate};
use forge_store::{CollaboratorFilter, Store, Transaction};
use std::cmp::Reverse;
use std::sync::Arc;

/// Append-only status history
#[derive(Debug, Clone)]
pub struct StatusAuditLog {
    store: Arc<dyn Store>,
}

impl StatusAuditLog {
    /// Create an audit log over `store`
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Append `entry` inside the caller's transaction
    ///
    /// Returns the entry with its store-assigned sequence.
    pub async fn record(
        &self,
        tx: &mut dyn Transaction,
        entry: StatusUpdate,
    ) -> ServiceResult<StatusUpdate> {
        let stored = tx.insert_status_update(entry).await?;
        tracing::debug!(
            entity = %stored.entity,
            sequence = stored.sequence,
            new_status = %stored.new_status,
            "status update recorded"
        );
        Ok(stored)
    }

    /// Entries of `entity` visible to `actor`, newest first
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.id, %entity))]
    pub async fn list(&self, entity: EntityRef, actor: &Actor) -> ServiceResult<Vec<StatusUpdate>> {
        match entity {
            EntityRef::Request(id) => {
                let request = self
                    .store
                    .find_request(id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("project request", id))?;
                AuthorizationGuard::require_request_access(actor, &request)?;
            }
            EntityRef::Project(id) => {
                let project = self.load_project(id).await?;
                self.require_project_read(actor, &project).await?;
            }
        }

        let mut entries = self.store.find_status_updates(entity).await?;
        entries.sort_by_key(|e| Reverse(e.chronology()));
        Ok(visible_to(actor, entries))
    }

    /// Request history followed by project history, oldest first
    ///
    /// Ordered by `(created_at, sequence)` and filtered by role.
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn get_complete_project_history(
        &self,
        project_id: ProjectId,
        actor: &Actor,
    ) -> ServiceResult<Vec<StatusUpdate>> {
        let project = self.load_project(project_id).await?;
        self.require_project_read(actor, &project).await?;

        let mut history = match project.request_id {
            Some(request_id) => {
                self.store
                    .find_status_updates(EntityRef::Request(request_id))
                    .await?
            }
            None => Vec::new(),
        };
        history.extend(
            self.store
                .find_status_updates(EntityRef::Project(project_id))
                .await?,
        );
        history.sort_by_key(StatusUpdate::chronology);

        Ok(visible_to(actor, history))
    }

    async fn load_project(&self, id: ProjectId) -> ServiceResult<Project> {
        self.store
            .find_project(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("project", id))
    }

    async fn require_project_read(&self, actor: &Actor, project: &Project) -> ServiceResult<()> {
        let is_collaborator = !actor.is_admin()
            && !project.is_client(actor.id)
            && !project.is_developer(actor.id)
            && is_collaborator(self.store.as_ref(), project.id, actor).await?;
        AuthorizationGuard::require_project_read(actor, project, is_collaborator)
    }
}

/// Whether `actor` holds a collaborator membership on `project_id`
pub(crate) async fn is_collaborator(
    store: &dyn Store,
    project_id: ProjectId,
    actor: &Actor,
) -> ServiceResult<bool> {
    let filter = CollaboratorFilter {
        project_id: Some(project_id),
        user_id: Some(actor.id),
    };
    Ok(!store.find_collaborators(&filter).await?.is_empty())
}

fn visible_to(actor: &Actor, entries: Vec<StatusUpdate>) -> Vec<StatusUpdate> {
    if actor.is_admin() {
        entries
    } else {
        entries.into_iter().filter(|e| e.is_client_visible).collect()
    }
}
