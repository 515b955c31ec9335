//! Forge storage boundary
//!
//! The service layer talks to persistence only through two traits:
//! - [`Store`]: reads of committed state, and [`Store::begin`] to open a unit of work
//! - [`Transaction`]: reads that see the transaction's own writes, inserts, and
//!   `WHERE`-guarded conditional updates that report affected rows
//!
//! [`MemoryStore`] implements both with serializable writers and atomic
//! snapshot commits, so a reader observes either the state before a
//! transaction or the state after it, never a mix.
//!
//! # Example
//!
//! ```rust
//! use forge_model::{NewUser, Role, User};
//! use forge_store::{MemoryStore, Store, Transaction};
//!
//! # async fn example() -> Result<(), forge_store::StoreError> {
//! let store = MemoryStore::new();
//! let user = User::from_input(NewUser::new(Role::Client, "c@example.com"), forge_model::now());
//!
//! let mut tx = store.begin().await?;
//! tx.insert_user(user.clone()).await?;
//! tx.commit().await?;
//!
//! assert_eq!(store.find_user(user.id).await?, Some(user));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod memory;
pub mod query;
pub mod store;

// Re-exports
pub use error::StoreError;
pub use memory::{Fault, MemoryStore};
pub use query::{
    CollaboratorFilter, DeveloperFilter, ProjectFilter, ProjectGuard, ProjectPatch, RequestFilter,
    RequestGuard, RequestPatch, UserPatch,
};
pub use store::{Store, Transaction};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
