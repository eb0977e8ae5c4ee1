//! Unit of Work - transaction scope per request
//!
//! Every data-mutating operation runs inside exactly one transaction scope:
//!
//! 1. [`TransactionManager::begin`] opens a transaction against the shared pool.
//! 2. The scope receives `&mut Tx` and threads it through every repository call.
//! 3. [`settle`] inspects the scope's `Result`:
//!    - `Ok`  → commit. A failing commit is surfaced as an internal error, never retried.
//!    - `Err` → rollback, then the original error is returned unchanged.
//!
//! Exactly one of commit / rollback happens per scope. Errors are never
//! swallowed here; the only decision taken is commit-vs-rollback.
//!
//! ## Cancellation
//! A deadline passed to [`with_transaction`] races the scope against
//! `tokio::time::timeout`; expiry takes the rollback path like any other
//! failure. When the whole request future is dropped instead, the backing
//! transaction's drop guard rolls back.

use std::time::Duration;

use futures::future::BoxFuture;

use crate::error::app_error::{AppError, AppResult};

/// An open transaction
#[trait_variant::make(Transaction: Send)]
pub trait LocalTransaction: Sized {
    /// Make every write performed through this transaction visible
    async fn commit(self) -> AppResult<()>;

    /// Discard every write performed through this transaction
    async fn rollback(self) -> AppResult<()>;
}

/// Source of transactions (usually wraps a connection pool)
#[trait_variant::make(TransactionManager: Send)]
pub trait LocalTransactionManager {
    type Tx: Transaction + Send;

    /// Open a new transaction
    async fn begin(&self) -> AppResult<Self::Tx>;
}

/// Run `scope` inside a fresh transaction.
///
/// ## Arguments
/// * `manager` - transaction source
/// * `deadline` - optional upper bound on the time spent inside the scope
/// * `scope` - the work; receives the transaction handle
///
/// ## Examples
/// ```rust,ignore
/// let user = with_transaction(&store, Some(Duration::from_secs(5)), |tx| {
///     Box::pin(async move {
///         let role = tx.get_or_create("user").await?;
///         tx.insert(&new_user, role.id).await
///     })
/// })
/// .await?;
/// ```
pub async fn with_transaction<M, T, E, F>(
    manager: &M,
    deadline: Option<Duration>,
    scope: F,
) -> Result<T, E>
where
    M: TransactionManager + Sync,
    T: Send,
    E: From<AppError> + Send,
    F: for<'t> FnOnce(&'t mut M::Tx) -> BoxFuture<'t, Result<T, E>> + Send,
{
    let mut tx = manager.begin().await.map_err(E::from)?;

    let outcome = match deadline {
        Some(limit) => match tokio::time::timeout(limit, scope(&mut tx)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!(
                    deadline_ms = limit.as_millis() as u64,
                    "Request deadline exceeded"
                );
                Err(E::from(AppError::internal("Request deadline exceeded")))
            }
        },
        None => scope(&mut tx).await,
    };

    settle(tx, outcome).await
}

/// Commit or roll back `tx` depending on `outcome`.
///
/// The original error is always the one returned on the failure path; a
/// failing rollback is logged only.
pub async fn settle<X, T, E>(tx: X, outcome: Result<T, E>) -> Result<T, E>
where
    X: Transaction,
    E: From<AppError>,
{
    match outcome {
        Ok(value) => {
            tx.commit().await.map_err(|e| {
                tracing::error!(error = %e, "Transaction commit failed");
                E::from(e)
            })?;
            tracing::debug!("Transaction committed");
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!(error = %rollback_err, "Transaction rollback failed");
            } else {
                tracing::debug!("Transaction rolled back");
            }
            Err(err)
        }
    }
}

// ============================================================================
// PostgreSQL implementation (feature-gated)
// ============================================================================

#[cfg(feature = "sqlx")]
pub mod postgres {
    //! Pool-backed unit of work.
    //!
    //! Isolation level is left at the store default.

    use sqlx::{PgConnection, PgPool, Postgres};

    use super::{Transaction, TransactionManager};
    use crate::error::app_error::{AppError, AppResult};

    /// Opens one transaction per unit of work from the shared pool
    #[derive(Clone)]
    pub struct PgTransactionManager {
        pool: PgPool,
    }

    impl PgTransactionManager {
        pub fn new(pool: PgPool) -> Self {
            Self { pool }
        }

        pub fn pool(&self) -> &PgPool {
            &self.pool
        }
    }

    impl TransactionManager for PgTransactionManager {
        type Tx = PgUnitOfWork;

        async fn begin(&self) -> AppResult<PgUnitOfWork> {
            // Blocks until a pooled connection frees up or the pool's
            // acquire timeout elapses.
            let tx = self.pool.begin().await?;

            Ok(PgUnitOfWork { tx })
        }
    }

    /// A live PostgreSQL transaction.
    ///
    /// Dropping it without calling `commit` rolls back.
    pub struct PgUnitOfWork {
        tx: sqlx::Transaction<'static, Postgres>,
    }

    impl PgUnitOfWork {
        /// Connection bound to this transaction, for use as a query executor
        pub fn conn(&mut self) -> &mut PgConnection {
            &mut self.tx
        }
    }

    impl Transaction for PgUnitOfWork {
        async fn commit(self) -> AppResult<()> {
            self.tx
                .commit()
                .await
                .map_err(|e| AppError::internal("Failed to commit transaction").with_source(e))
        }

        async fn rollback(self) -> AppResult<()> {
            self.tx
                .rollback()
                .await
                .map_err(|e| AppError::internal("Failed to roll back transaction").with_source(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::error::kind::ErrorKind;

    #[derive(Default)]
    struct Counters {
        begun: AtomicUsize,
        committed: AtomicUsize,
        rolled_back: AtomicUsize,
        fail_commit: bool,
    }

    struct FakeTx {
        counters: Arc<Counters>,
        writes: Vec<&'static str>,
    }

    impl Transaction for FakeTx {
        async fn commit(self) -> AppResult<()> {
            if self.counters.fail_commit {
                return Err(AppError::internal("disk full"));
            }
            self.counters.committed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn rollback(self) -> AppResult<()> {
            self.counters.rolled_back.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FakeManager {
        counters: Arc<Counters>,
    }

    impl TransactionManager for FakeManager {
        type Tx = FakeTx;

        async fn begin(&self) -> AppResult<FakeTx> {
            self.counters.begun.fetch_add(1, Ordering::SeqCst);
            Ok(FakeTx {
                counters: self.counters.clone(),
                writes: Vec::new(),
            })
        }
    }

    fn manager(fail_commit: bool) -> (FakeManager, Arc<Counters>) {
        let counters = Arc::new(Counters {
            fail_commit,
            ..Counters::default()
        });
        (
            FakeManager {
                counters: counters.clone(),
            },
            counters,
        )
    }

    fn totals(c: &Counters) -> (usize, usize, usize) {
        (
            c.begun.load(Ordering::SeqCst),
            c.committed.load(Ordering::SeqCst),
            c.rolled_back.load(Ordering::SeqCst),
        )
    }

    #[tokio::test]
    async fn test_commit_on_success() {
        let (mgr, counters) = manager(false);

        let result: AppResult<usize> = with_transaction(&mgr, None, |tx| {
            Box::pin(async move {
                tx.writes.push("users");
                Ok(tx.writes.len())
            })
        })
        .await;

        assert_eq!(result.unwrap(), 1);
        assert_eq!(totals(&counters), (1, 1, 0));
    }

    #[tokio::test]
    async fn test_rollback_keeps_original_error() {
        let (mgr, counters) = manager(false);

        let result: AppResult<()> = with_transaction(&mgr, None, |tx| {
            Box::pin(async move {
                tx.writes.push("users");
                Err(AppError::not_found("Role not found"))
            })
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.message(), "Role not found");
        assert_eq!(totals(&counters), (1, 0, 1));
    }

    #[tokio::test]
    async fn test_commit_failure_is_internal() {
        let (mgr, counters) = manager(true);

        let result: AppResult<()> =
            with_transaction(&mgr, None, |_tx| Box::pin(async move { Ok(()) })).await;

        assert_eq!(result.unwrap_err().kind(), ErrorKind::InternalServerError);
        // A failed commit is not followed by a rollback.
        assert_eq!(totals(&counters), (1, 0, 0));
    }

    #[tokio::test]
    async fn test_deadline_rolls_back() {
        let (mgr, counters) = manager(false);

        let result: AppResult<()> =
            with_transaction(&mgr, Some(Duration::from_millis(10)), |_tx| {
                Box::pin(async move {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(())
                })
            })
            .await;

        assert_eq!(result.unwrap_err().kind(), ErrorKind::InternalServerError);
        assert_eq!(totals(&counters), (1, 0, 1));
    }
}
