//! Forge domain model
//!
//! Plain records shared by the store and the service layer:
//! - Typed identifiers (ULID, sortable)
//! - Users and the closed [`Role`] enumeration with its rank ordering
//! - Project requests, projects and collaborators
//! - Append-only [`StatusUpdate`] audit entries
//! - Lifecycle state machines for requests and projects
//!
//! # Example
//!
//! ```rust
//! use forge_model::{RequestStatus, Role, state_machine::validate_transition};
//!
//! assert!(Role::SuperAdmin.satisfies(Role::Admin));
//! assert!(validate_transition(RequestStatus::Requested, RequestStatus::InReview).is_ok());
//! assert!(validate_transition(RequestStatus::Approved, RequestStatus::InReview).is_err());
//! ```

#![warn(missing_docs)]

pub mod collaborator;
pub mod error;
pub mod ids;
pub mod project;
pub mod request;
pub mod role;
pub mod state_machine;
pub mod status_update;
pub mod user;

// Re-exports
pub use collaborator::{CollaboratorRole, ProjectCollaborator};
pub use error::{ModelError, TransitionError};
pub use ids::{CollaboratorId, ProjectId, RequestId, StatusUpdateId, UserId};
pub use project::{NewProject, Project, ProjectStatus};
pub use request::{NewProjectRequest, ProjectRequest, RequestStatus};
pub use role::Role;
pub use state_machine::Lifecycle;
pub use status_update::{EntityRef, EntityStatus, EntityType, StatusUpdate};
pub use user::{NewUser, User};

/// Timestamp type used across all records
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Current wall-clock time
#[inline]
#[must_use]
pub fn now() -> Timestamp {
    chrono::Utc::now()
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
