//! Developer assignment
//!
//! A project's `developer_id` goes from `None` to `Some` exactly once. The
//! write is `UPDATE .. WHERE status = approved AND developer_id IS NULL`;
//! when two claims race, the guard matches for only one of them and the
//! other sees zero affected rows. A miss caused by a status change rather
//! than another claim is reported as an invalid status.

use crate::audit::StatusAuditLog;
use crate::auth::{Actor, AuthorizationGuard};
use crate::config::AuditConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::uow;
use forge_model::{EntityRef, Project, ProjectId, ProjectStatus, Role, StatusUpdate, UserId};
use forge_store::{ProjectGuard, ProjectPatch, Store, Transaction};
use std::sync::Arc;

/// Race-safe project claiming
#[derive(Debug, Clone)]
pub struct ProjectAssignmentEngine {
    store: Arc<dyn Store>,
    audit: StatusAuditLog,
    config: AuditConfig,
}

impl ProjectAssignmentEngine {
    /// Create an engine
    #[must_use]
    pub fn new(store: Arc<dyn Store>, audit: StatusAuditLog, config: AuditConfig) -> Self {
        Self {
            store,
            audit,
            config,
        }
    }

    /// Assign `developer_id` to an approved, unassigned project and start it
    ///
    /// Developers may only assign themselves. Admin-equivalent actors may
    /// assign any user holding the Developer role.
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn assign_project(
        &self,
        project_id: ProjectId,
        developer_id: UserId,
        actor: &Actor,
    ) -> ServiceResult<Project> {
        AuthorizationGuard::check_permission(Some(actor), Role::Developer)?;
        self.check_assignee(developer_id, actor).await?;

        let project = self
            .store
            .find_project(project_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("project", project_id))?;
        if project.developer_id.is_some() {
            tracing::warn!(project = %project_id, "project already has a developer");
            return Err(ServiceError::AlreadyAssigned(project_id));
        }
        if project.status != ProjectStatus::Approved {
            return Err(ServiceError::InvalidStatus(format!(
                "only approved projects can be assigned, project is {}",
                project.status
            )));
        }

        let mut tx = self.store.begin().await?;
        let result = self
            .claim(tx.as_mut(), project_id, developer_id, actor)
            .await;
        let project = uow::finish(tx, result).await?;

        tracing::info!(project = %project_id, developer = %developer_id, "project assigned");
        Ok(project)
    }

    async fn check_assignee(&self, developer_id: UserId, actor: &Actor) -> ServiceResult<()> {
        if !actor.is_admin() {
            if developer_id != actor.id {
                tracing::warn!(developer = %developer_id, "developer tried to assign someone else");
                return Err(ServiceError::forbidden(
                    "developers may only assign themselves",
                ));
            }
            return Ok(());
        }

        match self.store.find_user(developer_id).await? {
            Some(user) if user.role == Role::Developer => Ok(()),
            Some(user) => Err(ServiceError::validation(format!(
                "user {developer_id} is a {}, not a developer",
                user.role
            ))),
            None => Err(ServiceError::validation(format!(
                "assignee {developer_id} does not exist"
            ))),
        }
    }

    async fn claim(
        &self,
        tx: &mut dyn Transaction,
        project_id: ProjectId,
        developer_id: UserId,
        actor: &Actor,
    ) -> ServiceResult<Project> {
        let at = forge_model::now();

        let rows = tx
            .update_project(
                project_id,
                ProjectGuard::claimable(),
                ProjectPatch::status(ProjectStatus::InProgress, at).with_developer(developer_id),
            )
            .await?;
        if rows == 0 {
            tracing::warn!(
                project = %project_id,
                developer = %developer_id,
                "assignment race lost"
            );
            return Err(match tx.find_project(project_id).await? {
                Some(current) if current.developer_id.is_some() => {
                    ServiceError::AlreadyAssigned(project_id)
                }
                Some(current) => ServiceError::InvalidStatus(format!(
                    "project {project_id} moved to {} before it could be assigned",
                    current.status
                )),
                None => ServiceError::not_found("project", project_id),
            });
        }

        let entry = StatusUpdate::new(
            EntityRef::Project(project_id),
            Some(ProjectStatus::Approved.into()),
            ProjectStatus::InProgress.into(),
            actor.id,
            "Developer assigned, work started",
            at,
        )
        .client_visible(self.config.assignment_client_visible);
        self.audit.record(tx, entry).await?;

        tx.find_project(project_id)
            .await?
            .filter(|p| p.is_developer(developer_id))
            .ok_or_else(|| {
                ServiceError::AssignmentFailed(format!("project {project_id} not updated"))
            })
    }
}
