use chrono::{Duration, TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    Account, AccountKind, CreateAccountCmd, CreateTransactionCmd, Engine, EngineError,
    MaterializeOutcome, RecurringInterval, Transaction, TransactionKind,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (username, password, email) VALUES (?, ?, ?)",
        vec![
            "alice".into(),
            "password".into(),
            "alice@example.com".into(),
        ],
    ))
    .await
    .unwrap();
    let engine = Engine::builder().database(db.clone()).build();
    (engine, db)
}

async fn default_account(engine: &Engine, balance_minor: i64) -> Account {
    engine
        .create_account(CreateAccountCmd {
            user_id: "alice".to_string(),
            name: "Main".to_string(),
            kind: AccountKind::Current,
            balance_minor,
            is_default: true,
        })
        .await
        .unwrap()
}

async fn monthly_template(engine: &Engine, account: &Account) -> Transaction {
    engine
        .create_transaction(CreateTransactionCmd {
            user_id: "alice".to_string(),
            account_id: account.id,
            kind: TransactionKind::Expense,
            amount_minor: 5_000,
            category: "bills".to_string(),
            description: Some("Netflix".to_string()),
            occurred_at: Utc.with_ymd_and_hms(2026, 8, 1, 9, 0, 0).unwrap(),
            recurring_interval: Some(RecurringInterval::Monthly),
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn never_processed_template_is_due_immediately() {
    let (engine, _db) = engine_with_db().await;
    let account = default_account(&engine, 0).await;
    let template = monthly_template(&engine, &account).await;
    // A plain entry must never show up in the due set.
    engine
        .create_transaction(CreateTransactionCmd {
            user_id: "alice".to_string(),
            account_id: account.id,
            kind: TransactionKind::Income,
            amount_minor: 1_000,
            category: "salary".to_string(),
            description: None,
            occurred_at: Utc::now(),
            recurring_interval: None,
        })
        .await
        .unwrap();

    // Due even before next_recurring_date: it has never been processed.
    let due = engine
        .due_recurring_transactions(template.occurred_at)
        .await
        .unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].id, template.id);
}

#[tokio::test]
async fn processed_template_is_due_only_past_its_next_date() {
    let (engine, _db) = engine_with_db().await;
    let account = default_account(&engine, 0).await;
    let template = monthly_template(&engine, &account).await;

    let first_fire = Utc.with_ymd_and_hms(2026, 9, 1, 9, 0, 0).unwrap();
    engine
        .materialize_recurring(template.id, "alice", first_fire)
        .await
        .unwrap();

    let soon = first_fire + Duration::days(1);
    assert!(engine.due_recurring_transactions(soon).await.unwrap().is_empty());

    let next_month = Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap();
    let due = engine.due_recurring_transactions(next_month).await.unwrap();
    assert_eq!(due.len(), 1);
}

#[tokio::test]
async fn materialize_inserts_ledger_copy_and_advances_schedule() {
    let (engine, _db) = engine_with_db().await;
    let account = default_account(&engine, 100_000).await;
    let template = monthly_template(&engine, &account).await;

    let now = Utc.with_ymd_and_hms(2026, 9, 1, 9, 0, 0).unwrap();
    let outcome = engine
        .materialize_recurring(template.id, "alice", now)
        .await
        .unwrap();
    let MaterializeOutcome::Fired { transaction_id } = outcome else {
        panic!("expected a fire, got {outcome:?}");
    };

    let ledger = engine.transaction(transaction_id, "alice").await.unwrap();
    assert!(!ledger.is_recurring);
    assert_eq!(ledger.amount_minor, 5_000);
    assert_eq!(ledger.occurred_at, now);
    assert_eq!(ledger.description.as_deref(), Some("Netflix (Recurring)"));

    let account = engine.account(account.id, "alice").await.unwrap();
    assert_eq!(account.balance_minor, 95_000);

    let template = engine.transaction(template.id, "alice").await.unwrap();
    assert_eq!(template.last_processed, Some(now));
    assert_eq!(
        template.next_recurring_date,
        Some(Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap())
    );
}

#[tokio::test]
async fn redelivered_event_is_skipped_not_duplicated() {
    let (engine, _db) = engine_with_db().await;
    let account = default_account(&engine, 100_000).await;
    let template = monthly_template(&engine, &account).await;

    let now = Utc.with_ymd_and_hms(2026, 9, 1, 9, 0, 0).unwrap();
    let first = engine
        .materialize_recurring(template.id, "alice", now)
        .await
        .unwrap();
    assert!(matches!(first, MaterializeOutcome::Fired { .. }));

    // Same event delivered again: the claim matches zero rows.
    let second = engine
        .materialize_recurring(template.id, "alice", now)
        .await
        .unwrap();
    assert_eq!(second, MaterializeOutcome::Skipped);

    let account = engine.account(account.id, "alice").await.unwrap();
    assert_eq!(account.balance_minor, 95_000);

    let ledger = engine
        .list_transactions(account.id, "alice", 50)
        .await
        .unwrap();
    // Template plus exactly one materialized copy.
    assert_eq!(ledger.len(), 2);
}

#[tokio::test]
async fn template_without_description_uses_its_category() {
    let (engine, _db) = engine_with_db().await;
    let account = default_account(&engine, 0).await;

    let template = engine
        .create_transaction(CreateTransactionCmd {
            user_id: "alice".to_string(),
            account_id: account.id,
            kind: TransactionKind::Expense,
            amount_minor: 1_500,
            category: "utilities".to_string(),
            description: None,
            occurred_at: Utc::now(),
            recurring_interval: Some(RecurringInterval::Weekly),
        })
        .await
        .unwrap();

    let outcome = engine
        .materialize_recurring(template.id, "alice", Utc::now())
        .await
        .unwrap();
    let MaterializeOutcome::Fired { transaction_id } = outcome else {
        panic!("expected a fire");
    };

    let ledger = engine.transaction(transaction_id, "alice").await.unwrap();
    assert_eq!(ledger.description.as_deref(), Some("utilities (Recurring)"));
}

#[tokio::test]
async fn materializing_a_plain_transaction_fails() {
    let (engine, _db) = engine_with_db().await;
    let account = default_account(&engine, 0).await;

    let plain = engine
        .create_transaction(CreateTransactionCmd {
            user_id: "alice".to_string(),
            account_id: account.id,
            kind: TransactionKind::Income,
            amount_minor: 1_000,
            category: "salary".to_string(),
            description: None,
            occurred_at: Utc::now(),
            recurring_interval: None,
        })
        .await
        .unwrap();

    let err = engine
        .materialize_recurring(plain.id, "alice", Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}
