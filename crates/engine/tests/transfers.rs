use std::{collections::HashSet, sync::Arc, time::Duration};

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{Currency, Engine, EngineError, TransferCmd};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    // One connection: every pooled connection would get its own in-memory database.
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn account_with_balance(engine: &Engine, owner: &str, balance: i64) -> engine::Account {
    let account = engine.create_account(owner, Currency::Eur).await.unwrap();
    engine.update_account(account.id, balance).await.unwrap()
}

async fn count(db: &DatabaseConnection, table: &str) -> i64 {
    let row = db
        .query_one(Statement::from_string(
            db.get_database_backend(),
            format!("SELECT COUNT(*) AS n FROM {table}"),
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get("", "n").unwrap()
}

#[tokio::test]
async fn transfer_moves_funds_between_accounts() {
    let (engine, _db) = engine_with_db().await;
    let a = account_with_balance(&engine, "alice", 100).await;
    let b = account_with_balance(&engine, "bob", 50).await;

    let result = engine.transfer(TransferCmd::new(a.id, b.id, 10)).await.unwrap();

    assert_eq!(result.transfer.from_account_id, a.id);
    assert_eq!(result.transfer.to_account_id, b.id);
    assert_eq!(result.transfer.amount, 10);
    assert!(result.transfer.id > 0);

    assert_eq!(result.from_entry.account_id, a.id);
    assert_eq!(result.from_entry.amount, -10);
    assert_eq!(result.to_entry.account_id, b.id);
    assert_eq!(result.to_entry.amount, 10);
    assert_eq!(result.from_entry.amount + result.to_entry.amount, 0);

    assert_eq!(result.from_account.id, a.id);
    assert_eq!(result.from_account.balance, 90);
    assert_eq!(result.to_account.id, b.id);
    assert_eq!(result.to_account.balance, 60);

    assert_eq!(
        engine.transfer_record(result.transfer.id).await.unwrap(),
        result.transfer
    );
    assert_eq!(
        engine.entry(result.from_entry.id).await.unwrap(),
        result.from_entry
    );
    assert_eq!(engine.entry(result.to_entry.id).await.unwrap(), result.to_entry);
    assert_eq!(engine.account(a.id).await.unwrap().balance, 90);
    assert_eq!(engine.account(b.id).await.unwrap().balance, 60);
}

#[tokio::test]
async fn transfer_from_higher_to_lower_id() {
    let (engine, _db) = engine_with_db().await;
    let low = account_with_balance(&engine, "alice", 100).await;
    let high = account_with_balance(&engine, "bob", 100).await;
    assert!(low.id < high.id);

    let result = engine
        .transfer(TransferCmd::new(high.id, low.id, 30))
        .await
        .unwrap();

    assert_eq!(result.from_account.id, high.id);
    assert_eq!(result.from_account.balance, 70);
    assert_eq!(result.to_account.id, low.id);
    assert_eq!(result.to_account.balance, 130);
}

#[tokio::test]
async fn overdraft_is_allowed() {
    let (engine, _db) = engine_with_db().await;
    let a = account_with_balance(&engine, "alice", 5).await;
    let b = account_with_balance(&engine, "bob", 0).await;

    let result = engine.transfer(TransferCmd::new(a.id, b.id, 20)).await.unwrap();
    assert_eq!(result.from_account.balance, -15);
    assert_eq!(result.to_account.balance, 20);
}

#[tokio::test]
async fn invalid_transfers_persist_nothing() {
    let (engine, db) = engine_with_db().await;
    let a = account_with_balance(&engine, "alice", 100).await;
    let b = account_with_balance(&engine, "bob", 50).await;

    let err = engine
        .transfer(TransferCmd::new(a.id, a.id, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransfer(_)));

    let err = engine
        .transfer(TransferCmd::new(a.id, b.id, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = engine
        .transfer(TransferCmd::new(a.id, b.id, -5))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    assert_eq!(count(&db, "transfers").await, 0);
    assert_eq!(count(&db, "entries").await, 0);
    assert_eq!(engine.account(a.id).await.unwrap().balance, 100);
    assert_eq!(engine.account(b.id).await.unwrap().balance, 50);
}

#[tokio::test]
async fn missing_account_is_not_found() {
    let (engine, db) = engine_with_db().await;
    let a = account_with_balance(&engine, "alice", 100).await;

    let err = engine
        .transfer(TransferCmd::new(a.id, a.id + 100, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let err = engine
        .transfer(TransferCmd::new(a.id + 100, a.id, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    assert_eq!(count(&db, "transfers").await, 0);
    assert_eq!(count(&db, "entries").await, 0);
    assert_eq!(engine.account(a.id).await.unwrap().balance, 100);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_transfers_same_direction() {
    let (engine, _db) = engine_with_db().await;
    let engine = Arc::new(engine);
    let a = account_with_balance(&engine, "alice", 1000).await;
    let b = account_with_balance(&engine, "bob", 1000).await;

    let n = 5;
    let amount = 10;

    let (a_id, b_id) = (a.id, b.id);
    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..n {
        let engine = Arc::clone(&engine);
        tasks.spawn(async move { engine.transfer(TransferCmd::new(a_id, b_id, amount)).await });
    }

    let mut seen = HashSet::new();
    while let Some(joined) = tasks.join_next().await {
        let result = joined.unwrap().unwrap();
        assert_eq!(result.transfer.amount, amount);
        assert_eq!(result.from_entry.amount, -amount);
        assert_eq!(result.to_entry.amount, amount);

        let debited = a.balance - result.from_account.balance;
        let credited = result.to_account.balance - b.balance;
        assert_eq!(debited, credited);
        assert!(debited > 0);
        assert_eq!(debited % amount, 0);

        let k = debited / amount;
        assert!((1..=n).contains(&k));
        assert!(seen.insert(k), "balance snapshot {k} seen twice");
    }
    assert_eq!(seen.len() as i64, n);

    assert_eq!(engine.account(a.id).await.unwrap().balance, a.balance - n * amount);
    assert_eq!(engine.account(b.id).await.unwrap().balance, b.balance + n * amount);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_opposite_transfers_do_not_deadlock() {
    let (engine, _db) = engine_with_db().await;
    let engine = Arc::new(engine);
    let a = account_with_balance(&engine, "alice", 1000).await;
    let b = account_with_balance(&engine, "bob", 1000).await;

    let n = 10;
    let amount = 10;

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..n {
        let engine = Arc::clone(&engine);
        let (from, to) = if i % 2 == 1 { (b.id, a.id) } else { (a.id, b.id) };
        tasks.spawn(async move { engine.transfer(TransferCmd::new(from, to, amount)).await });
    }

    let outcome = tokio::time::timeout(Duration::from_secs(30), async {
        let mut results = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            results.push(joined.unwrap());
        }
        results
    })
    .await
    .expect("transfers did not complete");

    assert_eq!(outcome.len(), n);
    for result in outcome {
        result.unwrap();
    }

    assert_eq!(engine.account(a.id).await.unwrap().balance, a.balance);
    assert_eq!(engine.account(b.id).await.unwrap().balance, b.balance);
}

#[tokio::test]
async fn failure_after_transfer_insert_rolls_back_everything() {
    let (engine, db) = engine_with_db().await;
    let a = account_with_balance(&engine, "alice", 100).await;
    let b = account_with_balance(&engine, "bob", 50).await;

    // The credit entry is the third write of a transfer.
    db.execute_unprepared(
        "CREATE TRIGGER fail_credit BEFORE INSERT ON entries WHEN NEW.amount > 0 \
         BEGIN SELECT RAISE(ABORT, 'induced failure'); END;",
    )
    .await
    .unwrap();

    let err = engine
        .transfer(TransferCmd::new(a.id, b.id, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Database(_)));

    assert_eq!(count(&db, "transfers").await, 0);
    assert_eq!(count(&db, "entries").await, 0);
    assert_eq!(engine.account(a.id).await.unwrap().balance, 100);
    assert_eq!(engine.account(b.id).await.unwrap().balance, 50);
}

#[tokio::test]
async fn failure_on_second_balance_update_rolls_back_everything() {
    let (engine, db) = engine_with_db().await;
    let a = account_with_balance(&engine, "alice", 100).await;
    let b = account_with_balance(&engine, "bob", 50).await;

    // `b` has the higher id, so its balance is updated last.
    db.execute_unprepared(&format!(
        "CREATE TRIGGER fail_update BEFORE UPDATE OF balance ON accounts WHEN NEW.id = {} \
         BEGIN SELECT RAISE(ABORT, 'induced failure'); END;",
        b.id
    ))
    .await
    .unwrap();

    let err = engine.transfer(TransferCmd::new(a.id, b.id, 10)).await;
    assert!(err.is_err());

    assert_eq!(count(&db, "transfers").await, 0);
    assert_eq!(count(&db, "entries").await, 0);
    assert_eq!(engine.account(a.id).await.unwrap().balance, 100);
    assert_eq!(engine.account(b.id).await.unwrap().balance, 50);
}

async fn balance_updates(db: &DatabaseConnection) -> Vec<i64> {
    db.query_all(Statement::from_string(
        db.get_database_backend(),
        "SELECT account_id FROM balance_updates ORDER BY seq".to_string(),
    ))
    .await
    .unwrap()
    .iter()
    .map(|row| row.try_get::<i64>("", "account_id").unwrap())
    .collect()
}

#[tokio::test]
async fn balances_are_updated_lowest_id_first() {
    let (engine, db) = engine_with_db().await;
    let a = account_with_balance(&engine, "alice", 100).await;
    let b = account_with_balance(&engine, "bob", 50).await;
    assert!(a.id < b.id);

    db.execute_unprepared(
        "CREATE TABLE balance_updates \
         (seq INTEGER PRIMARY KEY AUTOINCREMENT, account_id INTEGER NOT NULL)",
    )
    .await
    .unwrap();
    db.execute_unprepared(
        "CREATE TRIGGER log_balance_update AFTER UPDATE OF balance ON accounts \
         BEGIN INSERT INTO balance_updates (account_id) VALUES (NEW.id); END;",
    )
    .await
    .unwrap();

    engine.transfer(TransferCmd::new(b.id, a.id, 5)).await.unwrap();
    assert_eq!(balance_updates(&db).await, vec![a.id, b.id]);

    engine.transfer(TransferCmd::new(a.id, b.id, 5)).await.unwrap();
    assert_eq!(balance_updates(&db).await, vec![a.id, b.id, a.id, b.id]);

    assert_eq!(engine.account(a.id).await.unwrap().balance, 100);
    assert_eq!(engine.account(b.id).await.unwrap().balance, 50);
}

#[tokio::test]
async fn failed_begin_is_reported_as_transaction_error() {
    // No database behind the engine: opening a transaction fails.
    let engine = Engine::builder().build().await.unwrap();

    let err = engine
        .transfer(TransferCmd::new(1, 2, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Begin(_)), "{err:?}");
    assert!(err.is_transient());
}

#[tokio::test]
async fn with_tx_commits_on_success_and_rolls_back_on_error() {
    let (engine, db) = engine_with_db().await;
    let a = account_with_balance(&engine, "alice", 0).await;
    let a_id = a.id;

    engine
        .with_tx(|engine, db_tx| {
            Box::pin(async move {
                engine.create_entry(db_tx, a_id, 7).await?;
                engine.add_account_balance(db_tx, a_id, 7).await?;
                Ok(())
            })
        })
        .await
        .unwrap();
    assert_eq!(count(&db, "entries").await, 1);
    assert_eq!(engine.account(a.id).await.unwrap().balance, 7);

    let err = engine
        .with_tx(|engine, db_tx| {
            Box::pin(async move {
                engine.create_entry(db_tx, a_id, 3).await?;
                engine.add_account_balance(db_tx, a_id, 3).await?;
                Err::<(), _>(EngineError::InvalidAmount("abort".to_string()))
            })
        })
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InvalidAmount("abort".to_string()));
    assert_eq!(count(&db, "entries").await, 1);
    assert_eq!(engine.account(a.id).await.unwrap().balance, 7);
}

#[tokio::test]
async fn cancelled_unit_of_work_is_rolled_back() {
    let (engine, db) = engine_with_db().await;
    let a = account_with_balance(&engine, "alice", 100).await;
    let b = account_with_balance(&engine, "bob", 50).await;
    let (a_id, b_id) = (a.id, b.id);

    let cancelled = tokio::time::timeout(
        Duration::from_millis(100),
        engine.with_tx(|engine, db_tx| {
            Box::pin(async move {
                engine.create_transfer(db_tx, a_id, b_id, 10).await?;
                engine.add_account_balance(db_tx, a_id, -10).await?;
                std::future::pending::<()>().await;
                Ok(())
            })
        }),
    )
    .await;
    assert!(cancelled.is_err());

    assert_eq!(count(&db, "transfers").await, 0);
    assert_eq!(engine.account(a.id).await.unwrap().balance, 100);
}

#[tokio::test]
async fn add_account_balance_on_missing_account() {
    let (engine, db) = engine_with_db().await;

    let err = engine.add_account_balance(&db, 42, 10).await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn list_transfers_in_both_directions() {
    let (engine, _db) = engine_with_db().await;
    let a = account_with_balance(&engine, "alice", 100).await;
    let b = account_with_balance(&engine, "bob", 100).await;
    let c = account_with_balance(&engine, "carol", 100).await;

    engine.transfer(TransferCmd::new(a.id, b.id, 1)).await.unwrap();
    engine.transfer(TransferCmd::new(b.id, a.id, 2)).await.unwrap();
    engine.transfer(TransferCmd::new(a.id, c.id, 3)).await.unwrap();

    let transfers = engine.list_transfers(a.id, b.id, 0, 10).await.unwrap();
    let amounts: Vec<i64> = transfers.iter().map(|t| t.amount).collect();
    assert_eq!(amounts, vec![1, 2]);

    let entries = engine.list_entries(a.id, 0, 10).await.unwrap();
    let amounts: Vec<i64> = entries.iter().map(|e| e.amount).collect();
    assert_eq!(amounts, vec![-1, 2, -3]);

    let page = engine.list_entries(a.id, 1, 1).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].amount, 2);
}
