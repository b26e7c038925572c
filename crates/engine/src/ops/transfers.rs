use sea_orm::DatabaseTransaction;

use crate::{Account, EngineError, ResultEngine, TransferCmd, TransferResult};

use super::Engine;

impl Engine {
    /// Move funds between two accounts.
    ///
    /// Writes the transfer record, the debit and credit entries and both
    /// balance updates in one database transaction. Balances are updated in
    /// ascending account id order whatever the direction of the transfer, so
    /// concurrent transfers over the same pair always lock rows in the same
    /// order and cannot deadlock each other.
    ///
    /// Source balances are allowed to go negative.
    pub async fn transfer(&self, cmd: TransferCmd) -> ResultEngine<TransferResult> {
        validate_transfer(&cmd)?;
        let TransferCmd {
            from_account_id,
            to_account_id,
            amount,
        } = cmd;

        let result: TransferResult = self
            .with_tx(|engine, db_tx| {
                Box::pin(async move {
                    for account_id in lock_order(from_account_id, to_account_id) {
                        engine.require_account(db_tx, account_id).await?;
                    }

                    let transfer = engine
                        .create_transfer(db_tx, from_account_id, to_account_id, amount)
                        .await?;
                    let from_entry = engine
                        .create_entry(db_tx, from_account_id, -amount)
                        .await?;
                    let to_entry = engine.create_entry(db_tx, to_account_id, amount).await?;
                    let (from_account, to_account) = engine
                        .move_balances(db_tx, from_account_id, to_account_id, amount)
                        .await?;

                    Ok(TransferResult {
                        transfer,
                        from_entry,
                        to_entry,
                        from_account,
                        to_account,
                    })
                })
            })
            .await?;

        tracing::debug!(
            transfer_id = result.transfer.id,
            from_account_id,
            to_account_id,
            amount,
            "transfer committed"
        );
        Ok(result)
    }

    /// Apply both deltas, lowest account id first. Returns `(from, to)`
    /// accounts after the update.
    async fn move_balances(
        &self,
        db_tx: &DatabaseTransaction,
        from_account_id: i64,
        to_account_id: i64,
        amount: i64,
    ) -> ResultEngine<(Account, Account)> {
        let delta = |account_id: i64| {
            if account_id == from_account_id {
                -amount
            } else {
                amount
            }
        };
        let [first, second] = lock_order(from_account_id, to_account_id);
        let first_account = self.add_account_balance(db_tx, first, delta(first)).await?;
        let second_account = self
            .add_account_balance(db_tx, second, delta(second))
            .await?;

        if first == from_account_id {
            Ok((first_account, second_account))
        } else {
            Ok((second_account, first_account))
        }
    }
}

fn validate_transfer(cmd: &TransferCmd) -> ResultEngine<()> {
    if cmd.amount <= 0 {
        return Err(EngineError::InvalidAmount(
            "amount must be > 0".to_string(),
        ));
    }
    if cmd.from_account_id == cmd.to_account_id {
        return Err(EngineError::InvalidTransfer(
            "from_account_id and to_account_id must differ".to_string(),
        ));
    }
    Ok(())
}

/// Both ids, lowest first.
fn lock_order(a: i64, b: i64) -> [i64; 2] {
    if a < b { [a, b] } else { [b, a] }
}
