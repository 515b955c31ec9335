//! Store errors

/// Errors returned by a [`Store`](crate::Store) or [`Transaction`](crate::Transaction)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Insert violated a uniqueness constraint
    #[error("unique constraint violated on {table}: {detail}")]
    UniqueViolation {
        /// Table name
        table: &'static str,
        /// Offending key
        detail: String,
    },

    /// Backend failure (connection lost, statement failed, injected fault)
    #[error("store backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Create a unique-violation error
    pub fn unique(table: &'static str, detail: impl Into<String>) -> Self {
        Self::UniqueViolation {
            table,
            detail: detail.into(),
        }
    }

    /// Whether retrying the whole operation may succeed
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Backend(_))
    }
}
