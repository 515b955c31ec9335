//! Project execution: status changes, progress notes and membership

use crate::audit::{self, StatusAuditLog};
use crate::auth::{Actor, AuthorizationGuard};
use crate::error::{ServiceError, ServiceResult};
use crate::uow;
use forge_model::state_machine::validate_transition;
use forge_model::{
    CollaboratorRole, EntityRef, Lifecycle, NewProject, Project, ProjectCollaborator, ProjectId,
    ProjectStatus, StatusUpdate, UserId,
};
use forge_store::{ProjectGuard, ProjectPatch, Store, StoreError, Transaction};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Status change requested on a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStatusInput {
    /// Target status; equal to the current one for a progress note
    pub new_status: ProjectStatus,
    /// Progress, 0 to 100
    #[serde(default)]
    pub progress_percentage: Option<u8>,
    /// Audit message
    pub update_message: String,
    /// Whether clients see the entry
    #[serde(default = "default_visible")]
    pub is_client_visible: bool,
}

fn default_visible() -> bool {
    true
}

impl ProjectStatusInput {
    /// Create a client-visible status change
    #[must_use]
    pub fn new(new_status: ProjectStatus, update_message: impl Into<String>) -> Self {
        Self {
            new_status,
            progress_percentage: None,
            update_message: update_message.into(),
            is_client_visible: true,
        }
    }

    /// Attach progress
    #[inline]
    #[must_use]
    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress_percentage = Some(progress);
        self
    }

    /// Hide the entry from clients
    #[inline]
    #[must_use]
    pub fn internal(mut self) -> Self {
        self.is_client_visible = false;
        self
    }
}

/// Validated status change, applied under the writer gate
struct StatusChange {
    from: ProjectStatus,
    to: ProjectStatus,
    progress: Option<u8>,
    message: String,
    client_visible: bool,
}

/// Project status, creation and collaborator management
#[derive(Debug, Clone)]
pub struct ProjectProgress {
    store: Arc<dyn Store>,
    audit: StatusAuditLog,
}

impl ProjectProgress {
    /// Create the service
    #[must_use]
    pub fn new(store: Arc<dyn Store>, audit: StatusAuditLog) -> Self {
        Self { store, audit }
    }

    /// Change a project's status or record a progress note
    #[tracing::instrument(
        skip(self, input, actor),
        fields(actor = %actor.id, to = %input.new_status)
    )]
    pub async fn update_project_status(
        &self,
        id: ProjectId,
        input: ProjectStatusInput,
        actor: &Actor,
    ) -> ServiceResult<StatusUpdate> {
        let project = self.load(id).await?;
        AuthorizationGuard::require_project_manager(actor, &project)?;

        let from = project.status;
        let to = input.new_status;
        if from == to {
            if from.is_terminal() {
                return Err(ServiceError::InvalidStatus(format!(
                    "project {id} is {from} and accepts no further updates"
                )));
            }
        } else {
            validate_transition(from, to)?;
        }
        if to.requires_developer() && project.developer_id.is_none() {
            return Err(ServiceError::InvalidStatus(format!(
                "{to} requires an assigned developer"
            )));
        }
        if input.update_message.trim().is_empty() {
            return Err(ServiceError::validation("updateMessage must not be blank"));
        }
        let progress = match (to, input.progress_percentage) {
            (ProjectStatus::Completed, _) => Some(100),
            (_, Some(p)) if p > 100 => {
                return Err(ServiceError::validation(format!(
                    "progress must be within 0..=100, got {p}"
                )));
            }
            (_, p) => p,
        };

        let change = StatusChange {
            from,
            to,
            progress,
            message: input.update_message,
            client_visible: input.is_client_visible,
        };

        let mut tx = self.store.begin().await?;
        let result = self.apply(tx.as_mut(), id, change, actor).await;
        let stored = uow::finish(tx, result).await?;

        tracing::info!(project = %id, %from, %to, progress = ?progress, "project status updated");
        Ok(stored)
    }

    async fn apply(
        &self,
        tx: &mut dyn Transaction,
        id: ProjectId,
        change: StatusChange,
        actor: &Actor,
    ) -> ServiceResult<StatusUpdate> {
        // Stamped under the writer gate so created_at follows commit order
        let at = forge_model::now();

        let patch = ProjectPatch::status(change.to, at).with_progress(change.progress);
        let rows = tx
            .update_project(id, ProjectGuard::status_is(change.from), patch)
            .await?;
        if rows == 0 {
            tracing::warn!(project = %id, "stale project status");
            return Err(ServiceError::InvalidStatus(format!(
                "project {id} changed status concurrently"
            )));
        }

        let entry = StatusUpdate::new(
            EntityRef::Project(id),
            Some(change.from.into()),
            change.to.into(),
            actor.id,
            change.message,
            at,
        )
        .with_progress(change.progress)
        .client_visible(change.client_visible);
        self.audit.record(tx, entry).await
    }

    /// Create a project without an originating request; admin-equivalent only
    #[tracing::instrument(
        skip(self, input, actor),
        fields(actor = %actor.id, client = %input.client_id)
    )]
    pub async fn create_project(&self, input: NewProject, actor: &Actor) -> ServiceResult<Project> {
        AuthorizationGuard::require_admin(actor)?;
        for (field, value) in [
            ("projectName", &input.project_name),
            ("description", &input.description),
            ("projectType", &input.project_type),
        ] {
            if value.trim().is_empty() {
                return Err(ServiceError::validation(format!("{field} must not be blank")));
            }
        }
        if self.store.find_user(input.client_id).await?.is_none() {
            return Err(ServiceError::validation(format!(
                "client {} does not exist",
                input.client_id
            )));
        }

        let project = Project::from_input(input, forge_model::now());

        let mut tx = self.store.begin().await?;
        let result = async {
            match tx.insert_project(project.clone()).await {
                Ok(()) => {}
                Err(StoreError::UniqueViolation { detail, .. }) => {
                    return Err(ServiceError::CreationFailed(detail));
                }
                Err(e) => return Err(e.into()),
            }
            let entry = StatusUpdate::new(
                EntityRef::Project(project.id),
                None,
                ProjectStatus::Approved.into(),
                actor.id,
                "Project created",
                project.created_at,
            );
            self.audit.record(tx.as_mut(), entry).await?;
            Ok(project)
        }
        .await;
        let project = uow::finish(tx, result).await?;

        tracing::info!(project = %project.id, "project created");
        Ok(project)
    }

    /// Load a project; client, assigned developer, collaborator or admin
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn get_project(&self, id: ProjectId, actor: &Actor) -> ServiceResult<Project> {
        let project = self.load(id).await?;
        let is_collaborator = !AuthorizationGuard::can_read_project(actor, &project, false)
            && audit::is_collaborator(self.store.as_ref(), id, actor).await?;
        AuthorizationGuard::require_project_read(actor, &project, is_collaborator)?;
        Ok(project)
    }

    /// Add a secondary member; admin or the project's client
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn add_collaborator(
        &self,
        project_id: ProjectId,
        user_id: UserId,
        role: CollaboratorRole,
        actor: &Actor,
    ) -> ServiceResult<ProjectCollaborator> {
        let project = self.load(project_id).await?;
        AuthorizationGuard::require_project_owner(actor, &project)?;
        if self.store.find_user(user_id).await?.is_none() {
            return Err(ServiceError::validation(format!(
                "user {user_id} does not exist"
            )));
        }

        let collaborator = ProjectCollaborator::new(project_id, user_id, role, forge_model::now());

        let mut tx = self.store.begin().await?;
        let result = match tx.insert_collaborator(collaborator.clone()).await {
            Ok(()) => Ok(collaborator),
            Err(StoreError::UniqueViolation { .. }) => Err(ServiceError::validation(format!(
                "user {user_id} is already a collaborator on project {project_id}"
            ))),
            Err(e) => Err(e.into()),
        };
        let collaborator = uow::finish(tx, result).await?;

        tracing::info!(project = %project_id, user = %user_id, "collaborator added");
        Ok(collaborator)
    }

    async fn load(&self, id: ProjectId) -> ServiceResult<Project> {
        self.store
            .find_project(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("project", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_defaults_to_client_visible() {
        let input: ProjectStatusInput =
            serde_json::from_str(r#"{"newStatus":"in_testing","updateMessage":"QA"}"#).unwrap();
        assert!(input.is_client_visible);
        assert_eq!(input.new_status, ProjectStatus::InTesting);
        assert_eq!(input.progress_percentage, None);
    }

    #[test]
    fn builder_sets_fields() {
        let input = ProjectStatusInput::new(ProjectStatus::InProgress, "half way")
            .with_progress(50)
            .internal();
        assert_eq!(input.progress_percentage, Some(50));
        assert!(!input.is_client_visible);
    }
}
