//! Ledger engine.
//!
//! Accounts hold an integer balance in minor units. Funds only move through
//! [`Engine::transfer`], which records a [`Transfer`], a debit and a credit
//! [`Entry`] and updates both balances in one database transaction.

pub use accounts::Account;
pub use commands::TransferCmd;
pub use currency::Currency;
pub use entries::Entry;
pub use error::EngineError;
pub use ops::{Engine, EngineBuilder, TxFuture};
pub use transfers::{Transfer, TransferResult};

mod accounts;
mod commands;
mod currency;
mod entries;
mod error;
mod ops;
mod transfers;

pub type ResultEngine<T> = Result<T, EngineError>;
