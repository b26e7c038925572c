use std::{future::Future, pin::Pin};

use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};

use crate::{EngineError, ResultEngine};

mod accounts;
mod ledger;
mod transfers;

/// Boxed future returned by a unit of work passed to [`Engine::with_tx`].
pub type TxFuture<'c, T> = Pin<Box<dyn Future<Output = ResultEngine<T>> + Send + 'c>>;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Run `work` inside one database transaction.
    ///
    /// Commits when `work` succeeds, rolls back when it fails. A failed
    /// rollback is reported together with the error that caused it. If the
    /// returned future is dropped before completion the transaction handle is
    /// dropped with it and the database rolls back.
    pub async fn with_tx<T, F>(&self, work: F) -> ResultEngine<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c Engine, &'c DatabaseTransaction) -> TxFuture<'c, T> + Send,
    {
        let db_tx = self
            .database
            .begin()
            .await
            .map_err(EngineError::from_begin)?;

        let outcome = work(self, &db_tx).await;
        match outcome {
            Ok(value) => {
                db_tx.commit().await.map_err(EngineError::from_commit)?;
                Ok(value)
            }
            Err(err) => {
                tracing::warn!("rolling back transaction: {err}");
                match db_tx.rollback().await {
                    Ok(()) => Err(err),
                    Err(rollback) => Err(EngineError::Rollback {
                        source: Box::new(err),
                        rollback,
                    }),
                }
            }
        }
    }
}

fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidName(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

fn validate_page(offset: u64, limit: u64) -> ResultEngine<()> {
    if limit == 0 {
        return Err(EngineError::InvalidPage("limit must be > 0".to_string()));
    }
    if offset.checked_add(limit).is_none() {
        return Err(EngineError::InvalidPage("offset overflows".to_string()));
    }
    Ok(())
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}
