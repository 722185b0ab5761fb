use super::StorageError;
use async_trait::async_trait;
use std::any::Any;

/// A unit of work against the store.
///
/// Dropping a transaction without calling [`Transaction::commit`] must discard
/// its writes, so a panic or a cancelled future always ends in rollback.
#[async_trait]
pub trait Transaction: Send + Sync {
    async fn commit(self: Box<Self>) -> Result<(), StorageError>;

    async fn rollback(self: Box<Self>) -> Result<(), StorageError>;

    /// Lets a store recover its own transaction type from a handle.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[async_trait]
pub trait TransactionProvider: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn Transaction>, StorageError>;
}

/// Commits on `Ok`, rolls back on `Err` and hands the outcome back.
///
/// A failed rollback is only logged: the original error is what the caller
/// needs to see.
pub async fn finish_tx<T, E>(tx: Box<dyn Transaction>, outcome: Result<T, E>) -> Result<T, E>
where
    E: From<StorageError> + std::fmt::Display,
{
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            tracing::debug!("transaction committed");
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(error = %rollback_err, cause = %err, "transaction rollback failed");
            } else {
                tracing::debug!(cause = %err, "transaction rolled back");
            }
            Err(err)
        }
    }
}
