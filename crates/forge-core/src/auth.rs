//! Identity resolution and permission checks
//!
//! [`AuthorizationGuard`] is pure: it decides from an [`Actor`] and the row
//! being touched, never from the store. Ownership and role are alternate
//! paths; an operation passes if either holds.

use crate::error::{ServiceError, ServiceResult};
use crate::uow;
use forge_model::{NewUser, Project, ProjectRequest, Role, User, UserId};
use forge_store::{Store, UserPatch};
use serde::Serialize;
use std::sync::Arc;

/// Resolved caller identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Actor {
    /// User id
    pub id: UserId,
    /// Role at resolution time
    pub role: Role,
}

impl Actor {
    /// Create an actor
    #[inline]
    #[must_use]
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    /// Build from a free-form role string; unknown roles are `FORBIDDEN`
    pub fn from_role_str(id: UserId, role: &str) -> ServiceResult<Self> {
        Ok(Self::new(id, role.parse()?))
    }

    /// Admin or SuperAdmin
    #[inline]
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.is_admin_equivalent()
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.role)
    }
}

/// Role and ownership checks
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorizationGuard;

impl AuthorizationGuard {
    /// Require an actor whose rank is at least `required`
    pub fn check_permission(actor: Option<&Actor>, required: Role) -> ServiceResult<&Actor> {
        let Some(actor) = actor else {
            return Err(ServiceError::forbidden("no actor"));
        };
        if actor.role.satisfies(required) {
            Ok(actor)
        } else {
            tracing::warn!(actor = %actor.id, role = %actor.role, %required, "permission denied");
            Err(ServiceError::forbidden(format!(
                "role {} does not satisfy {required}",
                actor.role
            )))
        }
    }

    /// Require an admin-equivalent actor
    pub fn require_admin(actor: &Actor) -> ServiceResult<()> {
        Self::check_permission(Some(actor), Role::Admin).map(|_| ())
    }

    /// Whether `actor` may read or update `request`
    #[must_use]
    pub fn can_access_request(actor: &Actor, request: &ProjectRequest) -> bool {
        actor.is_admin() || request.is_owned_by(actor.id)
    }

    /// Require owner or admin on `request`
    pub fn require_request_access(actor: &Actor, request: &ProjectRequest) -> ServiceResult<()> {
        if Self::can_access_request(actor, request) {
            Ok(())
        } else {
            tracing::warn!(actor = %actor.id, request = %request.id, "request access denied");
            Err(ServiceError::forbidden(format!(
                "no access to project request {}",
                request.id
            )))
        }
    }

    /// Whether `actor` may read `project`
    ///
    /// `is_collaborator` is the caller's membership lookup result.
    #[must_use]
    pub fn can_read_project(actor: &Actor, project: &Project, is_collaborator: bool) -> bool {
        actor.is_admin()
            || project.is_client(actor.id)
            || project.is_developer(actor.id)
            || is_collaborator
    }

    /// Require read access on `project`
    pub fn require_project_read(
        actor: &Actor,
        project: &Project,
        is_collaborator: bool,
    ) -> ServiceResult<()> {
        if Self::can_read_project(actor, project, is_collaborator) {
            Ok(())
        } else {
            tracing::warn!(actor = %actor.id, project = %project.id, "project access denied");
            Err(ServiceError::forbidden(format!(
                "no access to project {}",
                project.id
            )))
        }
    }

    /// Require admin or the assigned developer
    pub fn require_project_manager(actor: &Actor, project: &Project) -> ServiceResult<()> {
        if actor.is_admin() || project.is_developer(actor.id) {
            Ok(())
        } else {
            tracing::warn!(actor = %actor.id, project = %project.id, "project update denied");
            Err(ServiceError::forbidden(format!(
                "only the assigned developer or an admin may update project {}",
                project.id
            )))
        }
    }

    /// Require admin or the project's client
    pub fn require_project_owner(actor: &Actor, project: &Project) -> ServiceResult<()> {
        if actor.is_admin() || project.is_client(actor.id) {
            Ok(())
        } else {
            Err(ServiceError::forbidden(format!(
                "only the client or an admin may manage project {}",
                project.id
            )))
        }
    }
}

/// User lookup and provisioning
#[derive(Debug, Clone)]
pub struct UserDirectory {
    store: Arc<dyn Store>,
}

impl UserDirectory {
    /// Create a directory over `store`
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Resolve an identity-provider user id to an [`Actor`]
    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self, user_id: UserId) -> ServiceResult<Actor> {
        match self.store.find_user(user_id).await? {
            Some(user) => Ok(Actor::from(&user)),
            None => {
                tracing::warn!("unknown identity");
                Err(ServiceError::Unauthorized(format!("unknown user {user_id}")))
            }
        }
    }

    /// Provision a user supplied by the identity provider
    #[tracing::instrument(skip(self, input), fields(email = %input.email, role = %input.role))]
    pub async fn register_user(&self, input: NewUser) -> ServiceResult<User> {
        let email = input.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(ServiceError::validation(format!(
                "invalid email '{}'",
                input.email
            )));
        }

        let user = User::from_input(input, forge_model::now());

        let mut tx = self.store.begin().await?;
        let result = match tx.insert_user(user.clone()).await {
            Ok(()) => Ok(user),
            Err(forge_store::StoreError::UniqueViolation { detail, .. }) => {
                Err(ServiceError::validation(format!("user already exists: {detail}")))
            }
            Err(e) => Err(e.into()),
        };
        let user = uow::finish(tx, result).await?;

        tracing::info!(user = %user.id, "user registered");
        Ok(user)
    }

    /// Change a user's role; admin-equivalent only
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn update_user_role(
        &self,
        user_id: UserId,
        role: Role,
        actor: &Actor,
    ) -> ServiceResult<User> {
        AuthorizationGuard::require_admin(actor)?;

        let mut tx = self.store.begin().await?;
        let result = async {
            let rows = tx.update_user(user_id, UserPatch { role: Some(role) }).await?;
            if rows == 0 {
                return Err(ServiceError::not_found("user", user_id));
            }
            tx.find_user(user_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("user", user_id))
        }
        .await;
        let user = uow::finish(tx, result).await?;

        tracing::info!(user = %user.id, role = %user.role, "role updated");
        Ok(user)
    }
}
