//! The module contains the error the engine can throw.
//!
//! The errors are grouped as:
//!
//! - validation: [`InvalidAmount`], [`InvalidTransfer`], [`InvalidName`],
//!   [`InvalidPage`] and [`CurrencyMismatch`], reported before any database
//!   work;
//! - [`KeyNotFound`] thrown when an account, entry or transfer is missing;
//! - [`AccountInUse`] when deleting an account that has ledger history;
//! - transaction: [`Conflict`], [`Begin`], [`Commit`] and [`Rollback`]. They
//!   are transient, the engine never retries them;
//! - [`Database`] for everything else the store reports.
//!
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`InvalidTransfer`]: EngineError::InvalidTransfer
//!  [`InvalidName`]: EngineError::InvalidName
//!  [`InvalidPage`]: EngineError::InvalidPage
//!  [`CurrencyMismatch`]: EngineError::CurrencyMismatch
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`AccountInUse`]: EngineError::AccountInUse
//!  [`Conflict`]: EngineError::Conflict
//!  [`Begin`]: EngineError::Begin
//!  [`Commit`]: EngineError::Commit
//!  [`Rollback`]: EngineError::Rollback
//!  [`Database`]: EngineError::Database
use sea_orm::{
    DbErr, RuntimeErr, SqlErr,
    sqlx::{self, error::DatabaseError},
};
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid transfer: {0}")]
    InvalidTransfer(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid page: {0}")]
    InvalidPage(String),
    #[error("Currency mismatch: {0}")]
    CurrencyMismatch(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Account in use: {0}")]
    AccountInUse(String),
    /// Serialization failure or deadlock abort reported by the database.
    #[error("Transaction conflict: {0}")]
    Conflict(DbErr),
    #[error("Begin failed: {0}")]
    Begin(DbErr),
    #[error("Commit failed: {0}")]
    Commit(DbErr),
    /// The unit of work failed and the rollback failed too.
    #[error("{source}; rollback failed: {rollback}")]
    Rollback {
        source: Box<EngineError>,
        rollback: DbErr,
    },
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Classify an error coming from a store primitive.
    ///
    /// Foreign key violations only happen when a referenced account is
    /// missing, so they surface as [`EngineError::KeyNotFound`].
    pub(crate) fn from_store(err: DbErr) -> Self {
        if let Some(SqlErr::ForeignKeyConstraintViolation(_)) = err.sql_err() {
            return Self::KeyNotFound("account not exists".to_string());
        }
        if is_conflict(&err) {
            return Self::Conflict(err);
        }
        Self::Database(err)
    }

    pub(crate) fn from_begin(err: DbErr) -> Self {
        if is_conflict(&err) {
            return Self::Conflict(err);
        }
        Self::Begin(err)
    }

    pub(crate) fn from_commit(err: DbErr) -> Self {
        if is_conflict(&err) {
            return Self::Conflict(err);
        }
        Self::Commit(err)
    }

    /// Whether the caller may retry the whole operation.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Conflict(_) | Self::Begin(_) | Self::Commit(_) => true,
            Self::Rollback { source, .. } => source.is_transient(),
            _ => false,
        }
    }
}

fn database_error(err: &DbErr) -> Option<&dyn DatabaseError> {
    match err {
        DbErr::Conn(RuntimeErr::SqlxError(sqlx::Error::Database(db_err)))
        | DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(db_err)))
        | DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(db_err))) => {
            Some(&**db_err)
        }
        _ => None,
    }
}

/// SQLite `BUSY`/`LOCKED` (including their extended codes), and on every
/// other backend SQLSTATE `serialization_failure`/`deadlock_detected`.
fn is_conflict(err: &DbErr) -> bool {
    let Some(db_err) = database_error(err) else {
        return false;
    };
    let Some(code) = db_err.code() else {
        return false;
    };
    if db_err.try_downcast_ref::<sqlx::sqlite::SqliteError>().is_some() {
        return code
            .parse::<i32>()
            .map(|code| matches!(code & 0xff, 5 | 6))
            .unwrap_or(false);
    }
    matches!(&*code, "40001" | "40P01")
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidTransfer(a), Self::InvalidTransfer(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidPage(a), Self::InvalidPage(b)) => a == b,
            (Self::CurrencyMismatch(a), Self::CurrencyMismatch(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::AccountInUse(a), Self::AccountInUse(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b))
            | (Self::Begin(a), Self::Begin(b))
            | (Self::Commit(a), Self::Commit(b))
            | (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            (
                Self::Rollback {
                    source: a,
                    rollback: ra,
                },
                Self::Rollback {
                    source: b,
                    rollback: rb,
                },
            ) => a == b && ra.to_string() == rb.to_string(),
            _ => false,
        }
    }
}
