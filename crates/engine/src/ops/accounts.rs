use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

use crate::{Account, Currency, EngineError, ResultEngine, accounts, entries};

use super::{Engine, normalize_required_name, validate_page};

impl Engine {
    /// Open a new account with a zero balance.
    pub async fn create_account(&self, owner: &str, currency: Currency) -> ResultEngine<Account> {
        let owner = normalize_required_name(owner, "owner")?;
        let model = accounts::ActiveModel::open(owner, currency)
            .insert(&self.database)
            .await
            .map_err(EngineError::from_store)?;
        tracing::debug!(account_id = model.id, "account created");
        model.try_into()
    }

    pub async fn account(&self, account_id: i64) -> ResultEngine<Account> {
        self.require_account(&self.database, account_id).await
    }

    /// Accounts ordered by id.
    pub async fn list_accounts(&self, offset: u64, limit: u64) -> ResultEngine<Vec<Account>> {
        validate_page(offset, limit)?;
        accounts::Entity::find()
            .order_by_asc(accounts::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.database)
            .await
            .map_err(EngineError::from_store)?
            .into_iter()
            .map(Account::try_from)
            .collect()
    }

    /// Overwrite the stored balance.
    ///
    /// This is an administrative correction: it bypasses the ledger and writes
    /// no entry. Transfers never use it.
    pub async fn update_account(&self, account_id: i64, balance: i64) -> ResultEngine<Account> {
        let model = accounts::ActiveModel {
            id: ActiveValue::Unchanged(account_id),
            balance: ActiveValue::Set(balance),
            ..Default::default()
        };
        match model.update(&self.database).await {
            Ok(model) => model.try_into(),
            Err(DbErr::RecordNotUpdated | DbErr::RecordNotFound(_)) => {
                Err(EngineError::KeyNotFound(format!("account {account_id}")))
            }
            Err(err) => Err(EngineError::from_store(err)),
        }
    }

    /// Delete an account.
    ///
    /// Accounts with ledger history cannot be deleted.
    pub async fn delete_account(&self, account_id: i64) -> ResultEngine<()> {
        let history = entries::Entity::find()
            .filter(entries::Column::AccountId.eq(account_id))
            .count(&self.database)
            .await
            .map_err(EngineError::from_store)?;
        if history > 0 {
            return Err(EngineError::AccountInUse(format!(
                "account {account_id} has {history} entries"
            )));
        }

        let result = accounts::Entity::delete_by_id(account_id)
            .exec(&self.database)
            .await
            .map_err(|err| match EngineError::from_store(err) {
                // A transfer landed between the check and the delete.
                EngineError::KeyNotFound(_) => {
                    EngineError::AccountInUse(format!("account {account_id} has entries"))
                }
                other => other,
            })?;
        if result.rows_affected == 0 {
            return Err(EngineError::KeyNotFound(format!("account {account_id}")));
        }
        Ok(())
    }
}
