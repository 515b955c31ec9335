//! Service configuration
//!
//! Loaded from TOML; every section and field has a default, so an empty
//! file is a valid configuration.
//!
//! ```toml
//! [log]
//! filter = "forge=debug"
//! json = true
//!
//! [audit]
//! request_updates_client_visible = false
//!
//! [dashboard]
//! include_cancelled_projects = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Config path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML for [`ForgeConfig`]
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgeConfig {
    /// Logging
    pub log: LogConfig,
    /// Audit trail visibility
    pub audit: AuditConfig,
    /// Dashboard contents
    pub dashboard: DashboardConfig,
}

impl ForgeConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Set the log filter directive
    #[inline]
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log.filter = filter.into();
        self
    }

    /// Emit logs as JSON lines
    #[inline]
    #[must_use]
    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.log.json = json;
        self
    }

    /// Set client visibility of request status changes
    #[inline]
    #[must_use]
    pub fn with_request_updates_client_visible(mut self, visible: bool) -> Self {
        self.audit.request_updates_client_visible = visible;
        self
    }

    /// Set client visibility of developer assignment entries
    #[inline]
    #[must_use]
    pub fn with_assignment_client_visible(mut self, visible: bool) -> Self {
        self.audit.assignment_client_visible = visible;
        self
    }

    /// Show or hide cancelled projects on dashboards
    #[inline]
    #[must_use]
    pub fn with_cancelled_projects(mut self, include: bool) -> Self {
        self.dashboard.include_cancelled_projects = include;
        self
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
    /// JSON output
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

/// Audit visibility configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Whether generic request status changes are shown to clients
    pub request_updates_client_visible: bool,
    /// Whether the "developer assigned" entry is shown to clients
    pub assignment_client_visible: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            request_updates_client_visible: true,
            assignment_client_visible: true,
        }
    }
}

/// Dashboard configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Include cancelled projects in project lists and totals
    pub include_cancelled_projects: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            include_cancelled_projects: true,
        }
    }
}
