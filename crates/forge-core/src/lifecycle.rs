//! Project request lifecycle
//!
//! `Requested -> InReview -> Approved`, with `Cancelled` reachable from both
//! open states. `Approved` is reachable only through
//! [`RequestLifecycleEngine::approve_project_request`], which also
//! materializes the project in the same transaction.

use crate::audit::StatusAuditLog;
use crate::auth::{Actor, AuthorizationGuard};
use crate::config::AuditConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::uow;
use forge_model::state_machine::validate_transition;
use forge_model::{
    EntityRef, NewProjectRequest, Project, ProjectRequest, RequestId, RequestStatus, Role,
    StatusUpdate,
};
use forge_store::{RequestFilter, RequestGuard, RequestPatch, Store, StoreError, Transaction};
use std::sync::Arc;

/// Request state machine and approval
#[derive(Debug, Clone)]
pub struct RequestLifecycleEngine {
    store: Arc<dyn Store>,
    audit: StatusAuditLog,
    config: AuditConfig,
}

impl RequestLifecycleEngine {
    /// Create an engine
    #[must_use]
    pub fn new(store: Arc<dyn Store>, audit: StatusAuditLog, config: AuditConfig) -> Self {
        Self {
            store,
            audit,
            config,
        }
    }

    /// Submit a new request owned by `owner`
    #[tracing::instrument(
        skip(self, input, owner),
        fields(owner = %owner.id, project_name = %input.project_name)
    )]
    pub async fn create_project_request(
        &self,
        input: NewProjectRequest,
        owner: &Actor,
    ) -> ServiceResult<ProjectRequest> {
        AuthorizationGuard::check_permission(Some(owner), Role::Client)?;
        validate_request_input(&input)?;

        let request = ProjectRequest::from_input(input, owner.id, forge_model::now());

        let mut tx = self.store.begin().await?;
        let result = self.insert_request(tx.as_mut(), request, owner).await;
        let request = uow::finish(tx, result).await?;

        tracing::info!(request = %request.id, "project request created");
        Ok(request)
    }

    async fn insert_request(
        &self,
        tx: &mut dyn Transaction,
        request: ProjectRequest,
        owner: &Actor,
    ) -> ServiceResult<ProjectRequest> {
        match tx.insert_request(request.clone()).await {
            Ok(()) => {}
            Err(StoreError::UniqueViolation { detail, .. }) => {
                return Err(ServiceError::CreationFailed(detail));
            }
            Err(e) => return Err(e.into()),
        }

        let entry = StatusUpdate::new(
            EntityRef::Request(request.id),
            None,
            RequestStatus::Requested.into(),
            owner.id,
            "Project request submitted",
            request.created_at,
        );
        self.audit.record(tx, entry).await?;
        Ok(request)
    }

    /// Load a request; owner or admin only
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn get_project_request(
        &self,
        id: RequestId,
        actor: &Actor,
    ) -> ServiceResult<ProjectRequest> {
        let request = self.load(id).await?;
        AuthorizationGuard::require_request_access(actor, &request)?;
        Ok(request)
    }

    /// All requests for admins, own requests for everyone else
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn list_project_requests(&self, actor: &Actor) -> ServiceResult<Vec<ProjectRequest>> {
        let filter = if actor.is_admin() {
            RequestFilter::all()
        } else {
            RequestFilter::owned_by(actor.id)
        };
        Ok(self.store.find_requests(&filter).await?)
    }

    /// Move a request along its state machine
    ///
    /// `Approved` is always rejected here.
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn update_project_request_status(
        &self,
        id: RequestId,
        new_status: RequestStatus,
        actor: &Actor,
    ) -> ServiceResult<ProjectRequest> {
        let request = self.load(id).await?;
        AuthorizationGuard::require_request_access(actor, &request)?;

        if new_status == RequestStatus::Approved {
            tracing::warn!(request = %id, "approval attempted through generic status update");
            return Err(ServiceError::InvalidStatus(
                "requests are approved only through approval".to_string(),
            ));
        }
        validate_transition(request.status, new_status)?;

        let message = format!("Status changed from {} to {new_status}", request.status);
        let updated = self
            .transition(&request, new_status, Review::Keep, actor, message)
            .await?;

        tracing::info!(
            request = %id,
            from = %request.status,
            to = %new_status,
            "request status updated"
        );
        Ok(updated)
    }

    /// Approve an in-review request and materialize its project
    ///
    /// The status change, the project insert and the audit entry commit
    /// together or not at all.
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn approve_project_request(
        &self,
        id: RequestId,
        actor: &Actor,
    ) -> ServiceResult<Project> {
        AuthorizationGuard::require_admin(actor)?;

        let request = self.load(id).await?;
        if request.status != RequestStatus::InReview {
            return Err(ServiceError::InvalidStatus(format!(
                "only in_review requests can be approved, request is {}",
                request.status
            )));
        }

        let mut tx = self.store.begin().await?;
        let result = self.approve_in(tx.as_mut(), &request, actor).await;
        let project = uow::finish(tx, result).await?;

        tracing::info!(request = %id, project = %project.id, "request approved");
        Ok(project)
    }

    async fn approve_in(
        &self,
        tx: &mut dyn Transaction,
        request: &ProjectRequest,
        actor: &Actor,
    ) -> ServiceResult<Project> {
        let at = forge_model::now();

        let rows = tx
            .update_request(
                request.id,
                RequestGuard::status_is(RequestStatus::InReview),
                RequestPatch::status(RequestStatus::Approved, at).reviewed(at),
            )
            .await?;
        if rows == 0 {
            tracing::warn!(request = %request.id, "request left in_review before approval");
            return Err(ServiceError::InvalidStatus(format!(
                "request {} is no longer in_review",
                request.id
            )));
        }

        let project = Project::from_request(request, at);
        match tx.insert_project(project.clone()).await {
            Ok(()) => {}
            Err(StoreError::UniqueViolation { detail, .. }) => {
                return Err(ServiceError::CreationFailed(format!(
                    "project already exists for request: {detail}"
                )));
            }
            Err(e) => return Err(e.into()),
        }

        let entry = StatusUpdate::new(
            EntityRef::Request(request.id),
            Some(RequestStatus::InReview.into()),
            RequestStatus::Approved.into(),
            actor.id,
            "Request approved and project created",
            at,
        );
        self.audit.record(tx, entry).await?;

        tx.find_project(project.id).await?.ok_or_else(|| {
            ServiceError::CreationFailed(format!("project {} not stored", project.id))
        })
    }

    /// Cancel an open request; admin-equivalent only
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn reject_project_request(
        &self,
        id: RequestId,
        actor: &Actor,
    ) -> ServiceResult<ProjectRequest> {
        AuthorizationGuard::require_admin(actor)?;

        let request = self.load(id).await?;
        validate_transition(request.status, RequestStatus::Cancelled)?;

        let updated = self
            .transition(
                &request,
                RequestStatus::Cancelled,
                Review::Stamp,
                actor,
                "Request rejected".to_string(),
            )
            .await?;

        tracing::info!(request = %id, "request rejected");
        Ok(updated)
    }

    async fn load(&self, id: RequestId) -> ServiceResult<ProjectRequest> {
        self.store
            .find_request(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("project request", id))
    }

    /// Guarded status write plus audit entry in one transaction
    ///
    /// Client visibility of the entry follows
    /// [`AuditConfig::request_updates_client_visible`].
    async fn transition(
        &self,
        request: &ProjectRequest,
        new_status: RequestStatus,
        review: Review,
        actor: &Actor,
        message: String,
    ) -> ServiceResult<ProjectRequest> {
        let mut tx = self.store.begin().await?;
        let result = async {
            let at = forge_model::now();
            let patch = match review {
                Review::Keep => RequestPatch::status(new_status, at),
                Review::Stamp => RequestPatch::status(new_status, at).reviewed(at),
            };

            let rows = tx
                .update_request(request.id, RequestGuard::status_is(request.status), patch)
                .await?;
            if rows == 0 {
                tracing::warn!(request = %request.id, "stale request status");
                return Err(ServiceError::InvalidStatus(format!(
                    "request {} changed status concurrently",
                    request.id
                )));
            }

            let entry = StatusUpdate::new(
                EntityRef::Request(request.id),
                Some(request.status.into()),
                new_status.into(),
                actor.id,
                message,
                at,
            )
            .client_visible(self.config.request_updates_client_visible);
            self.audit.record(tx.as_mut(), entry).await?;

            tx.find_request(request.id)
                .await?
                .ok_or_else(|| ServiceError::not_found("project request", request.id))
        }
        .await;
        uow::finish(tx, result).await
    }
}

/// Whether a transition stamps `reviewed_at`
#[derive(Debug, Clone, Copy)]
enum Review {
    Keep,
    Stamp,
}

fn validate_request_input(input: &NewProjectRequest) -> ServiceResult<()> {
    for (field, value) in [
        ("projectName", &input.project_name),
        ("description", &input.description),
        ("projectType", &input.project_type),
    ] {
        if value.trim().is_empty() {
            return Err(ServiceError::validation(format!("{field} must not be blank")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_rejected() {
        let input = NewProjectRequest::new("  ", "desc", "web");
        assert!(matches!(
            validate_request_input(&input),
            Err(ServiceError::Validation(msg)) if msg.contains("projectName")
        ));
        assert!(validate_request_input(&NewProjectRequest::new("p", "d", "web")).is_ok());
    }
}
