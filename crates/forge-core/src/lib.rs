//! Forge service layer
//!
//! Clients submit project requests, admins review and approve them into
//! projects, developers claim and deliver projects, and everyone gets a
//! role-scoped dashboard. Every status change is recorded in an
//! append-only audit trail inside the same transaction.
//!
//! # Components
//!
//! - [`AuthorizationGuard`]: role rank and ownership checks
//! - [`UserDirectory`]: identity resolution
//! - [`RequestLifecycleEngine`]: request state machine and approval
//! - [`ProjectAssignmentEngine`]: race-safe developer claiming
//! - [`ProjectProgress`]: project status, creation and collaborators
//! - [`StatusAuditLog`]: role-filtered status history
//! - [`DashboardAggregator`]: per-role views and counts
//!
//! # Example
//!
//! ```rust
//! use forge_core::prelude::*;
//! use forge_store::MemoryStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), ServiceError> {
//! let services = Services::new(Arc::new(MemoryStore::new()), ForgeConfig::default());
//!
//! let client = services.users().register_user(NewUser::new(Role::Client, "c@example.com")).await?;
//! let admin = services.users().register_user(NewUser::new(Role::Admin, "a@example.com")).await?;
//! let (client, admin) = (Actor::from(&client), Actor::from(&admin));
//!
//! let request = services
//!     .requests()
//!     .create_project_request(NewProjectRequest::new("Shop", "Online store", "ecommerce"), &client)
//!     .await?;
//! services
//!     .requests()
//!     .update_project_request_status(request.id, RequestStatus::InReview, &admin)
//!     .await?;
//! let project = services.requests().approve_project_request(request.id, &admin).await?;
//!
//! assert_eq!(project.request_id, Some(request.id));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod assignment;
pub mod audit;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod lifecycle;
pub mod progress;
pub mod services;
pub mod uow;

// Re-exports
pub use assignment::ProjectAssignmentEngine;
pub use audit::StatusAuditLog;
pub use auth::{Actor, AuthorizationGuard, UserDirectory};
pub use config::{AuditConfig, ConfigError, DashboardConfig, ForgeConfig, LogConfig};
pub use dashboard::{Dashboard, DashboardAggregator, DashboardSummary};
pub use error::{ErrorCode, ServiceError, ServiceResult};
pub use lifecycle::RequestLifecycleEngine;
pub use progress::{ProjectProgress, ProjectStatusInput};
pub use services::Services;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports
pub mod prelude {
    pub use crate::{
        Actor, AuthorizationGuard, Dashboard, DashboardSummary, ErrorCode, ForgeConfig,
        ProjectStatusInput, ServiceError, ServiceResult, Services,
    };
    pub use forge_model::{
        CollaboratorRole, EntityRef, NewProject, NewProjectRequest, NewUser, Project,
        ProjectId, ProjectRequest, ProjectStatus, RequestId, RequestStatus, Role, StatusUpdate,
        UserId,
    };
}
