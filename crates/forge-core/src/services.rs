//! Service container
//!
//! Built once at startup from a store and a configuration, then passed by
//! reference to whatever handles incoming calls. Services hold only the
//! shared store handle and their configuration section.

use crate::assignment::ProjectAssignmentEngine;
use crate::audit::StatusAuditLog;
use crate::auth::UserDirectory;
use crate::config::ForgeConfig;
use crate::dashboard::DashboardAggregator;
use crate::lifecycle::RequestLifecycleEngine;
use crate::progress::ProjectProgress;
use forge_store::Store;
use std::sync::Arc;

/// All Forge services over one store
#[derive(Debug, Clone)]
pub struct Services {
    config: ForgeConfig,
    users: UserDirectory,
    audit: StatusAuditLog,
    requests: RequestLifecycleEngine,
    assignments: ProjectAssignmentEngine,
    progress: ProjectProgress,
    dashboard: DashboardAggregator,
}

impl Services {
    /// Wire every service to `store`
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: ForgeConfig) -> Self {
        let audit = StatusAuditLog::new(Arc::clone(&store));

        Self {
            users: UserDirectory::new(Arc::clone(&store)),
            requests: RequestLifecycleEngine::new(Arc::clone(&store), audit.clone(), config.audit),
            assignments: ProjectAssignmentEngine::new(
                Arc::clone(&store),
                audit.clone(),
                config.audit,
            ),
            progress: ProjectProgress::new(Arc::clone(&store), audit.clone()),
            dashboard: DashboardAggregator::new(store, config.dashboard),
            audit,
            config,
        }
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ForgeConfig {
        &self.config
    }

    /// Identity resolution and user provisioning
    #[inline]
    #[must_use]
    pub fn users(&self) -> &UserDirectory {
        &self.users
    }

    /// Audit trail reads
    #[inline]
    #[must_use]
    pub fn audit(&self) -> &StatusAuditLog {
        &self.audit
    }

    /// Request lifecycle and approval
    #[inline]
    #[must_use]
    pub fn requests(&self) -> &RequestLifecycleEngine {
        &self.requests
    }

    /// Developer assignment
    #[inline]
    #[must_use]
    pub fn assignments(&self) -> &ProjectAssignmentEngine {
        &self.assignments
    }

    /// Project status and membership
    #[inline]
    #[must_use]
    pub fn progress(&self) -> &ProjectProgress {
        &self.progress
    }

    /// Dashboards
    #[inline]
    #[must_use]
    pub fn dashboard(&self) -> &DashboardAggregator {
        &self.dashboard
    }
}
