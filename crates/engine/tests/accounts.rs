use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{AccountKind, CreateAccountCmd, Engine, EngineError};
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

fn account_cmd(name: &str, is_default: bool) -> CreateAccountCmd {
    CreateAccountCmd {
        user_id: "alice".to_string(),
        name: name.to_string(),
        kind: AccountKind::Current,
        balance_minor: 0,
        is_default,
    }
}

#[tokio::test]
async fn first_account_is_default_even_when_not_requested() {
    let (engine, _db) = engine_with_db().await;

    let account = engine.create_account(account_cmd("Main", false)).await.unwrap();
    assert!(account.is_default);
}

#[tokio::test]
async fn new_default_demotes_the_previous_one() {
    let (engine, _db) = engine_with_db().await;

    let first = engine.create_account(account_cmd("Main", false)).await.unwrap();
    let second = engine.create_account(account_cmd("Savings", true)).await.unwrap();

    assert!(second.is_default);
    let first = engine.account(first.id, "alice").await.unwrap();
    assert!(!first.is_default);

    let default = engine.default_account("alice").await.unwrap().unwrap();
    assert_eq!(default.id, second.id);
}

#[tokio::test]
async fn non_default_second_account_leaves_default_alone() {
    let (engine, _db) = engine_with_db().await;

    let first = engine.create_account(account_cmd("Main", false)).await.unwrap();
    let second = engine.create_account(account_cmd("Savings", false)).await.unwrap();

    assert!(!second.is_default);
    let default = engine.default_account("alice").await.unwrap().unwrap();
    assert_eq!(default.id, first.id);
}

#[tokio::test]
async fn set_default_account_swaps_the_flag() {
    let (engine, _db) = engine_with_db().await;

    let first = engine.create_account(account_cmd("Main", false)).await.unwrap();
    let second = engine.create_account(account_cmd("Savings", false)).await.unwrap();

    let promoted = engine.set_default_account(second.id, "alice").await.unwrap();
    assert!(promoted.is_default);

    let first = engine.account(first.id, "alice").await.unwrap();
    assert!(!first.is_default);
}

#[tokio::test]
async fn negative_opening_balance_is_rejected() {
    let (engine, _db) = engine_with_db().await;

    let mut cmd = account_cmd("Main", false);
    cmd.balance_minor = -100;
    let err = engine.create_account(cmd).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[tokio::test]
async fn blank_account_name_is_rejected() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .create_account(account_cmd("   ", false))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn accounts_are_scoped_to_their_owner() {
    let (engine, db) = engine_with_db().await;
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (username, password, email) VALUES (?, ?, ?)",
        vec!["bob".into(), "password".into(), "bob@example.com".into()],
    ))
    .await
    .unwrap();

    let account = engine.create_account(account_cmd("Main", false)).await.unwrap();

    let err = engine.account(account.id, "bob").await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
    assert!(engine.list_accounts("bob").await.unwrap().is_empty());
}
