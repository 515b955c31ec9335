//! Unit of work
//!
//! Operations open a transaction with [`Store::begin`](forge_store::Store::begin),
//! run their statements against `tx.as_mut()`, then hand the transaction and
//! the outcome to [`finish`]: commit on `Ok`, rollback on `Err`.

use crate::error::ServiceResult;
use forge_store::Transaction;

/// Commit `tx` if `result` is `Ok`, otherwise roll it back
///
/// A failed commit turns the result into the commit error. A failed
/// rollback is logged and the original error is returned.
pub async fn finish<T>(tx: Box<dyn Transaction>, result: ServiceResult<T>) -> ServiceResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback) = tx.rollback().await {
                tracing::error!(error = %rollback, "rollback failed");
            }
            tracing::debug!(code = %err.code(), "transaction rolled back");
            Err(err)
        }
    }
}
