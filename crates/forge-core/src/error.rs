//! Service errors
//!
//! Every failure a caller can observe maps to one stable [`ErrorCode`]:
//! - Identity and permission failures (`UNAUTHORIZED`, `FORBIDDEN`)
//! - Missing rows (`NOT_FOUND`)
//! - Lifecycle violations and lost races (`INVALID_STATUS`, `ALREADY_ASSIGNED`)
//! - Writes the store did not apply (`CREATION_FAILED`, `ASSIGNMENT_FAILED`)
//! - Rejected input (`VALIDATION`) and backend failures (`STORE`)

use forge_model::{ModelError, ProjectId, TransitionError};
use forge_store::StoreError;
use serde::Serialize;

/// Result alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Main service error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// No resolvable identity
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Role or ownership insufficient
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Row absent
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of row
        entity: &'static str,
        /// Requested id
        id: String,
    },

    /// Illegal or stale transition
    #[error("invalid status: {0}")]
    InvalidStatus(String),

    /// Project already has a developer, or the assignment race was lost
    #[error("project {0} is already assigned")]
    AlreadyAssigned(ProjectId),

    /// Store did not apply an expected insert
    #[error("creation failed: {0}")]
    CreationFailed(String),

    /// Store did not apply an expected assignment
    #[error("assignment failed: {0}")]
    AssignmentFailed(String),

    /// Input rejected
    #[error("validation failed: {0}")]
    Validation(String),

    /// Store failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    /// Create a not-found error
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Create a forbidden error
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden(reason.into())
    }

    /// Create a validation error
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }

    /// Stable code of this error
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Unauthorized(_) => ErrorCode::Unauthorized,
            Self::Forbidden(_) => ErrorCode::Forbidden,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::InvalidStatus(_) => ErrorCode::InvalidStatus,
            Self::AlreadyAssigned(_) => ErrorCode::AlreadyAssigned,
            Self::CreationFailed(_) => ErrorCode::CreationFailed,
            Self::AssignmentFailed(_) => ErrorCode::AssignmentFailed,
            Self::Validation(_) => ErrorCode::Validation,
            Self::Store(_) => ErrorCode::Store,
        }
    }

    /// Whether retrying the whole operation may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_transient())
    }
}

impl From<TransitionError> for ServiceError {
    fn from(err: TransitionError) -> Self {
        Self::InvalidStatus(err.to_string())
    }
}

impl From<ModelError> for ServiceError {
    fn from(err: ModelError) -> Self {
        match err {
            // An unparseable role never grants anything
            ModelError::UnknownRole(role) => Self::Forbidden(format!("unknown role: {role}")),
            ModelError::UnknownStatus(status) => {
                Self::InvalidStatus(format!("unknown status: {status}"))
            }
            ModelError::Transition(e) => e.into(),
        }
    }
}

/// Stable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// `UNAUTHORIZED`
    Unauthorized,
    /// `FORBIDDEN`
    Forbidden,
    /// `NOT_FOUND`
    NotFound,
    /// `INVALID_STATUS`
    InvalidStatus,
    /// `ALREADY_ASSIGNED`
    AlreadyAssigned,
    /// `CREATION_FAILED`
    CreationFailed,
    /// `ASSIGNMENT_FAILED`
    AssignmentFailed,
    /// `VALIDATION`
    Validation,
    /// `STORE`
    Store,
}

impl ErrorCode {
    /// Wire form
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::InvalidStatus => "INVALID_STATUS",
            Self::AlreadyAssigned => "ALREADY_ASSIGNED",
            Self::CreationFailed => "CREATION_FAILED",
            Self::AssignmentFailed => "ASSIGNMENT_FAILED",
            Self::Validation => "VALIDATION",
            Self::Store => "STORE",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
