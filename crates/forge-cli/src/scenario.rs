//! Scenario replay
//!
//! A scenario seeds users under short labels, then runs a list of steps
//! against a fresh in-memory store. Steps refer to users, requests and
//! projects by label; a step's `save` field names the request or project it
//! produces.

use anyhow::{Context, Result};
use forge_core::prelude::*;
use forge_core::ErrorCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Scenario file
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Scenario {
    /// Users to register before the first step
    pub(crate) users: Vec<UserSeed>,
    /// Operations, run in order
    pub(crate) steps: Vec<Step>,
}

impl Scenario {
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("invalid scenario {}", path.display()))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserSeed {
    pub(crate) key: String,
    pub(crate) role: Role,
    pub(crate) email: String,
    #[serde(default)]
    pub(crate) first_name: Option<String>,
    #[serde(default)]
    pub(crate) last_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub(crate) enum Step {
    CreateRequest {
        #[serde(rename = "as")]
        actor: String,
        request: NewProjectRequest,
        save: Option<String>,
    },
    SetRequestStatus {
        #[serde(rename = "as")]
        actor: String,
        request: String,
        status: RequestStatus,
    },
    Approve {
        #[serde(rename = "as")]
        actor: String,
        request: String,
        save: Option<String>,
    },
    Reject {
        #[serde(rename = "as")]
        actor: String,
        request: String,
    },
    Assign {
        #[serde(rename = "as")]
        actor: String,
        project: String,
        developer: String,
    },
    UpdateProjectStatus {
        #[serde(rename = "as")]
        actor: String,
        project: String,
        input: ProjectStatusInput,
    },
    AddCollaborator {
        #[serde(rename = "as")]
        actor: String,
        project: String,
        user: String,
        role: CollaboratorRole,
    },
    Dashboard {
        #[serde(rename = "as")]
        actor: String,
    },
    History {
        #[serde(rename = "as")]
        actor: String,
        project: String,
    },
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Step::CreateRequest { .. } => "create_request",
            Step::SetRequestStatus { .. } => "set_request_status",
            Step::Approve { .. } => "approve",
            Step::Reject { .. } => "reject",
            Step::Assign { .. } => "assign",
            Step::UpdateProjectStatus { .. } => "update_project_status",
            Step::AddCollaborator { .. } => "add_collaborator",
            Step::Dashboard { .. } => "dashboard",
            Step::History { .. } => "history",
        }
    }
}

/// Result of one step
#[derive(Debug, Clone, Serialize)]
pub(crate) struct Outcome {
    pub(crate) step: usize,
    pub(crate) op: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) code: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) error: Option<String>,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub(crate) result: Value,
}

impl Outcome {
    pub(crate) fn is_ok(&self) -> bool {
        self.code.is_none()
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.code, &self.error) {
            (Some(code), Some(error)) => {
                write!(f, "[{}] {} FAILED {code}: {error}", self.step, self.op)
            }
            _ => write!(f, "[{}] {} ok", self.step, self.op),
        }
    }
}

/// Replays a scenario against fresh services
pub(crate) struct Runner {
    services: Services,
    users: HashMap<String, Actor>,
    requests: HashMap<String, RequestId>,
    projects: HashMap<String, ProjectId>,
}

impl Runner {
    pub(crate) fn new(config: ForgeConfig) -> Self {
        let store = Arc::new(forge_store::MemoryStore::new());
        Self {
            services: Services::new(store, config),
            users: HashMap::new(),
            requests: HashMap::new(),
            projects: HashMap::new(),
        }
    }

    /// Seed users, then run every step; step failures are outcomes, not errors
    pub(crate) async fn run(&mut self, scenario: Scenario) -> Result<Vec<Outcome>> {
        for seed in scenario.users {
            let mut input = NewUser::new(seed.role, seed.email);
            input.first_name = seed.first_name;
            input.last_name = seed.last_name;
            let user = self
                .services
                .users()
                .register_user(input)
                .await
                .with_context(|| format!("failed to seed user '{}'", seed.key))?;
            tracing::debug!(key = %seed.key, user = %user.id, "user seeded");
            self.users.insert(seed.key, Actor::from(&user));
        }

        let mut outcomes = Vec::with_capacity(scenario.steps.len());
        for (idx, step) in scenario.steps.into_iter().enumerate() {
            let op = step.name();
            let outcome = match self.apply(step).await {
                Ok(result) => Outcome {
                    step: idx + 1,
                    op,
                    code: None,
                    error: None,
                    result,
                },
                Err(err) => {
                    tracing::debug!(step = idx + 1, op, code = %err.code(), "step failed");
                    Outcome {
                        step: idx + 1,
                        op,
                        code: Some(err.code()),
                        error: Some(err.to_string()),
                        result: Value::Null,
                    }
                }
            };
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    async fn apply(&mut self, step: Step) -> ServiceResult<Value> {
        match step {
            Step::CreateRequest {
                actor,
                request,
                save,
            } => {
                let actor = self.actor(&actor)?;
                let created = self
                    .services
                    .requests()
                    .create_project_request(request, &actor)
                    .await?;
                if let Some(label) = save {
                    self.requests.insert(label, created.id);
                }
                to_value(&created)
            }
            Step::SetRequestStatus {
                actor,
                request,
                status,
            } => {
                let actor = self.actor(&actor)?;
                let id = self.request(&request)?;
                let updated = self
                    .services
                    .requests()
                    .update_project_request_status(id, status, &actor)
                    .await?;
                to_value(&updated)
            }
            Step::Approve {
                actor,
                request,
                save,
            } => {
                let actor = self.actor(&actor)?;
                let id = self.request(&request)?;
                let project = self
                    .services
                    .requests()
                    .approve_project_request(id, &actor)
                    .await?;
                if let Some(label) = save {
                    self.projects.insert(label, project.id);
                }
                to_value(&project)
            }
            Step::Reject { actor, request } => {
                let actor = self.actor(&actor)?;
                let id = self.request(&request)?;
                let rejected = self
                    .services
                    .requests()
                    .reject_project_request(id, &actor)
                    .await?;
                to_value(&rejected)
            }
            Step::Assign {
                actor,
                project,
                developer,
            } => {
                let actor = self.actor(&actor)?;
                let developer = self.actor(&developer)?;
                let id = self.project(&project)?;
                let assigned = self
                    .services
                    .assignments()
                    .assign_project(id, developer.id, &actor)
                    .await?;
                to_value(&assigned)
            }
            Step::UpdateProjectStatus {
                actor,
                project,
                input,
            } => {
                let actor = self.actor(&actor)?;
                let id = self.project(&project)?;
                let entry = self
                    .services
                    .progress()
                    .update_project_status(id, input, &actor)
                    .await?;
                to_value(&entry)
            }
            Step::AddCollaborator {
                actor,
                project,
                user,
                role,
            } => {
                let actor = self.actor(&actor)?;
                let member = self.actor(&user)?;
                let id = self.project(&project)?;
                let collaborator = self
                    .services
                    .progress()
                    .add_collaborator(id, member.id, role, &actor)
                    .await?;
                to_value(&collaborator)
            }
            Step::Dashboard { actor } => {
                let actor = self.actor(&actor)?;
                let dashboard = self.services.dashboard().my_dashboard(&actor).await?;
                to_value(&dashboard)
            }
            Step::History { actor, project } => {
                let actor = self.actor(&actor)?;
                let id = self.project(&project)?;
                let history = self
                    .services
                    .audit()
                    .get_complete_project_history(id, &actor)
                    .await?;
                to_value(&history)
            }
        }
    }

    /// Unknown user labels behave like an unresolvable identity
    fn actor(&self, key: &str) -> ServiceResult<Actor> {
        self.users
            .get(key)
            .copied()
            .ok_or_else(|| ServiceError::Unauthorized(format!("unknown user '{key}'")))
    }

    fn request(&self, label: &str) -> ServiceResult<RequestId> {
        self.requests
            .get(label)
            .copied()
            .ok_or_else(|| ServiceError::not_found("project request", label))
    }

    fn project(&self, label: &str) -> ServiceResult<ProjectId> {
        self.projects
            .get(label)
            .copied()
            .ok_or_else(|| ServiceError::not_found("project", label))
    }
}

fn to_value<T: Serialize>(value: &T) -> ServiceResult<Value> {
    serde_json::to_value(value)
        .map_err(|e| ServiceError::validation(format!("unserializable result: {e}")))
}
