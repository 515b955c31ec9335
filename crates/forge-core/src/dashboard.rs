//! Role-scoped dashboards
//!
//! Read-only aggregation over committed rows. Nothing is cached; every call
//! reflects the latest committed state.

use crate::auth::Actor;
use crate::config::DashboardConfig;
use crate::error::ServiceResult;
use forge_model::{Project, ProjectId, ProjectRequest, ProjectStatus, RequestStatus, Role};
use forge_store::{CollaboratorFilter, ProjectFilter, RequestFilter, Store};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Counts shown at the top of a dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    /// Projects in scope
    pub total_projects: usize,
    /// Approved, in progress, in testing or ready for launch
    pub active_projects: usize,
    /// Completed
    pub completed_projects: usize,
    /// Requests in scope
    pub total_requests: usize,
    /// Requests still `Requested`
    pub pending_review_requests: usize,
    /// Requests `InReview`
    pub in_review_requests: usize,
}

impl DashboardSummary {
    /// Summarize `projects` and `requests`
    #[must_use]
    pub fn over<'a>(
        projects: impl IntoIterator<Item = &'a Project>,
        requests: &[ProjectRequest],
    ) -> Self {
        let mut summary = Self {
            total_requests: requests.len(),
            ..Self::default()
        };
        for project in projects {
            summary.total_projects += 1;
            if project.status.is_active() {
                summary.active_projects += 1;
            }
            if project.status == ProjectStatus::Completed {
                summary.completed_projects += 1;
            }
        }
        for request in requests {
            match request.status {
                RequestStatus::Requested => summary.pending_review_requests += 1,
                RequestStatus::InReview => summary.in_review_requests += 1,
                RequestStatus::Approved | RequestStatus::Cancelled => {}
            }
        }
        summary
    }
}

/// Everything one actor sees on their dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    /// Owned or collaborated projects; every project for admins
    pub projects: Vec<Project>,
    /// Own requests; every request for admins
    pub project_requests: Vec<ProjectRequest>,
    /// Developers only: approved projects with no developer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_projects: Option<Vec<Project>>,
    /// Developers only: projects assigned to the actor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_projects: Option<Vec<Project>>,
    /// Counts
    pub summary: DashboardSummary,
}

/// Builds [`Dashboard`]s
#[derive(Debug, Clone)]
pub struct DashboardAggregator {
    store: Arc<dyn Store>,
    config: DashboardConfig,
}

impl DashboardAggregator {
    /// Create an aggregator
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: DashboardConfig) -> Self {
        Self { store, config }
    }

    /// Dashboard for `actor`
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.id, role = %actor.role))]
    pub async fn my_dashboard(&self, actor: &Actor) -> ServiceResult<Dashboard> {
        if actor.is_admin() {
            return self.admin_dashboard().await;
        }

        let projects = self.member_projects(actor).await?;
        let project_requests = self
            .store
            .find_requests(&RequestFilter::owned_by(actor.id))
            .await?;

        let (available_projects, assigned_projects) = if actor.role == Role::Developer {
            let available = self.scoped(&ProjectFilter::claimable()).await?;
            let assigned = self.scoped(&ProjectFilter::assigned_to(actor.id)).await?;
            (Some(available), Some(assigned))
        } else {
            (None, None)
        };

        let summary = match &assigned_projects {
            Some(assigned) => {
                let seen: BTreeSet<ProjectId> = projects.iter().map(|p| p.id).collect();
                let extra = assigned.iter().filter(|p| !seen.contains(&p.id));
                DashboardSummary::over(projects.iter().chain(extra), &project_requests)
            }
            None => DashboardSummary::over(&projects, &project_requests),
        };

        tracing::debug!(
            projects = projects.len(),
            requests = project_requests.len(),
            "dashboard built"
        );
        Ok(Dashboard {
            projects,
            project_requests,
            available_projects,
            assigned_projects,
            summary,
        })
    }

    async fn admin_dashboard(&self) -> ServiceResult<Dashboard> {
        let projects = self.scoped(&ProjectFilter::all()).await?;
        let project_requests = self.store.find_requests(&RequestFilter::all()).await?;
        let summary = DashboardSummary::over(&projects, &project_requests);

        Ok(Dashboard {
            projects,
            project_requests,
            available_projects: None,
            assigned_projects: None,
            summary,
        })
    }

    /// Owned projects plus collaborations where the actor is not the primary developer
    async fn member_projects(&self, actor: &Actor) -> ServiceResult<Vec<Project>> {
        let mut projects = self.scoped(&ProjectFilter::for_client(actor.id)).await?;

        let memberships = self
            .store
            .find_collaborators(&CollaboratorFilter::for_user(actor.id))
            .await?;
        let owned: BTreeSet<ProjectId> = projects.iter().map(|p| p.id).collect();
        let ids: Vec<ProjectId> = memberships
            .into_iter()
            .map(|m| m.project_id)
            .filter(|id| !owned.contains(id))
            .collect();

        if !ids.is_empty() {
            let collaborated = self.scoped(&ProjectFilter::with_ids(ids)).await?;
            projects.extend(
                collaborated
                    .into_iter()
                    .filter(|p| !p.is_developer(actor.id)),
            );
        }
        Ok(projects)
    }

    async fn scoped(&self, filter: &ProjectFilter) -> ServiceResult<Vec<Project>> {
        let projects = self.store.find_projects(filter).await?;
        if self.config.include_cancelled_projects {
            Ok(projects)
        } else {
            Ok(projects
                .into_iter()
                .filter(|p| p.status != ProjectStatus::Cancelled)
                .collect())
        }
    }
}
