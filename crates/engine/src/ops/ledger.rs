//! Row-level primitives over accounts, entries and transfers.
//!
//! Every primitive takes the connection to run on, so it can be used both on
//! the plain database handle and inside [`Engine::with_tx`].

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, sea_query::Expr,
};

use crate::{
    Account, EngineError, Entry, ResultEngine, Transfer, accounts, entries, transfers,
};

use super::{Engine, validate_page};

impl Engine {
    /// Insert a transfer record.
    pub async fn create_transfer<C: ConnectionTrait>(
        &self,
        db: &C,
        from_account_id: i64,
        to_account_id: i64,
        amount: i64,
    ) -> ResultEngine<Transfer> {
        let model = transfers::ActiveModel::record(from_account_id, to_account_id, amount)
            .insert(db)
            .await
            .map_err(EngineError::from_store)?;
        Ok(model.into())
    }

    /// Insert a ledger entry with a signed `amount`.
    pub async fn create_entry<C: ConnectionTrait>(
        &self,
        db: &C,
        account_id: i64,
        amount: i64,
    ) -> ResultEngine<Entry> {
        let model = entries::ActiveModel::record(account_id, amount)
            .insert(db)
            .await
            .map_err(EngineError::from_store)?;
        Ok(model.into())
    }

    /// Atomically add `delta` to the stored balance and return the updated row.
    ///
    /// The increment runs as a single `UPDATE ... SET balance = balance + ?`
    /// statement, which also takes the row lock on databases that have them.
    pub async fn add_account_balance<C: ConnectionTrait>(
        &self,
        db: &C,
        account_id: i64,
        delta: i64,
    ) -> ResultEngine<Account> {
        let result = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::Balance,
                Expr::col(accounts::Column::Balance).add(delta),
            )
            .filter(accounts::Column::Id.eq(account_id))
            .exec(db)
            .await
            .map_err(EngineError::from_store)?;
        if result.rows_affected == 0 {
            return Err(EngineError::KeyNotFound(format!("account {account_id}")));
        }
        self.require_account(db, account_id).await
    }

    pub(crate) async fn require_account<C: ConnectionTrait>(
        &self,
        db: &C,
        account_id: i64,
    ) -> ResultEngine<Account> {
        accounts::Entity::find_by_id(account_id)
            .one(db)
            .await
            .map_err(EngineError::from_store)?
            .ok_or_else(|| EngineError::KeyNotFound(format!("account {account_id}")))?
            .try_into()
    }

    pub async fn entry(&self, entry_id: i64) -> ResultEngine<Entry> {
        entries::Entity::find_by_id(entry_id)
            .one(&self.database)
            .await
            .map_err(EngineError::from_store)?
            .map(Entry::from)
            .ok_or_else(|| EngineError::KeyNotFound(format!("entry {entry_id}")))
    }

    pub async fn transfer_record(&self, transfer_id: i64) -> ResultEngine<Transfer> {
        transfers::Entity::find_by_id(transfer_id)
            .one(&self.database)
            .await
            .map_err(EngineError::from_store)?
            .map(Transfer::from)
            .ok_or_else(|| EngineError::KeyNotFound(format!("transfer {transfer_id}")))
    }

    /// Entries of one account, oldest first.
    pub async fn list_entries(
        &self,
        account_id: i64,
        offset: u64,
        limit: u64,
    ) -> ResultEngine<Vec<Entry>> {
        validate_page(offset, limit)?;
        let models = entries::Entity::find()
            .filter(entries::Column::AccountId.eq(account_id))
            .order_by_asc(entries::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.database)
            .await
            .map_err(EngineError::from_store)?;
        Ok(models.into_iter().map(Entry::from).collect())
    }

    /// Transfers between two accounts in either direction, oldest first.
    pub async fn list_transfers(
        &self,
        account_a: i64,
        account_b: i64,
        offset: u64,
        limit: u64,
    ) -> ResultEngine<Vec<Transfer>> {
        validate_page(offset, limit)?;
        let forward = transfers::Column::FromAccountId
            .eq(account_a)
            .and(transfers::Column::ToAccountId.eq(account_b));
        let backward = transfers::Column::FromAccountId
            .eq(account_b)
            .and(transfers::Column::ToAccountId.eq(account_a));
        let models = transfers::Entity::find()
            .filter(forward.or(backward))
            .order_by_asc(transfers::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.database)
            .await
            .map_err(EngineError::from_store)?;
        Ok(models.into_iter().map(Transfer::from).collect())
    }
}
