//! Testing utilities for Forge workspace
//!
//! Shared fixtures: a fresh in-memory store wired into [`Services`], one
//! registered user per role, and helpers that drive requests and projects
//! into a given lifecycle state.

#![allow(missing_docs)]

use forge_core::{Actor, ForgeConfig, Services};
use forge_model::{NewProjectRequest, NewUser, Project, ProjectRequest, RequestStatus, Role};
use forge_store::{MemoryStore, Store};
use std::sync::Arc;

/// Services over a fresh store, plus direct access to the store
pub struct Harness {
    pub services: Services,
    pub store: MemoryStore,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(ForgeConfig::default())
    }

    pub fn with_config(config: ForgeConfig) -> Self {
        Self::with_layer(config, |store| Arc::new(store))
    }

    /// Services over `layer(store)`; `store` stays reachable for assertions
    pub fn with_layer(
        config: ForgeConfig,
        layer: impl FnOnce(MemoryStore) -> Arc<dyn Store>,
    ) -> Self {
        let store = MemoryStore::new();
        let services = Services::new(layer(store.clone()), config);
        Self { services, store }
    }

    /// Register a user and return it as an actor
    pub async fn actor(&self, role: Role, email: &str) -> Actor {
        let user = self
            .services
            .users()
            .register_user(NewUser::new(role, email))
            .await
            .unwrap();
        Actor::from(&user)
    }

    /// One actor per role
    pub async fn cast(&self) -> Cast {
        Cast {
            client: self.actor(Role::Client, "client@forge.test").await,
            other_client: self.actor(Role::Client, "other@forge.test").await,
            developer: self.actor(Role::Developer, "dev@forge.test").await,
            other_developer: self.actor(Role::Developer, "dev2@forge.test").await,
            admin: self.actor(Role::Admin, "admin@forge.test").await,
            super_admin: self.actor(Role::SuperAdmin, "root@forge.test").await,
        }
    }

    /// A fresh `Requested` request owned by `owner`
    pub async fn request(&self, owner: &Actor) -> ProjectRequest {
        self.services
            .requests()
            .create_project_request(sample_request(), owner)
            .await
            .unwrap()
    }

    /// A request owned by `owner`, moved to `InReview` by `admin`
    pub async fn request_in_review(&self, owner: &Actor, admin: &Actor) -> ProjectRequest {
        let request = self.request(owner).await;
        self.services
            .requests()
            .update_project_request_status(request.id, RequestStatus::InReview, admin)
            .await
            .unwrap()
    }

    /// An approved, unassigned project owned by `owner`
    pub async fn approved_project(&self, owner: &Actor, admin: &Actor) -> Project {
        let request = self.request_in_review(owner, admin).await;
        self.services
            .requests()
            .approve_project_request(request.id, admin)
            .await
            .unwrap()
    }

    /// An in-progress project owned by `owner` and assigned to `developer`
    pub async fn assigned_project(
        &self,
        owner: &Actor,
        admin: &Actor,
        developer: &Actor,
    ) -> Project {
        let project = self.approved_project(owner, admin).await;
        self.services
            .assignments()
            .assign_project(project.id, developer.id, developer)
            .await
            .unwrap()
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// Registered actors, one per role
#[derive(Debug, Clone, Copy)]
pub struct Cast {
    pub client: Actor,
    pub other_client: Actor,
    pub developer: Actor,
    pub other_developer: Actor,
    pub admin: Actor,
    pub super_admin: Actor,
}

pub fn sample_request() -> NewProjectRequest {
    NewProjectRequest::new("Storefront", "Online store with checkout", "ecommerce")
        .with_budget("10k-20k")
        .with_timeline("3 months")
        .with_requirements("payments, inventory")
}
