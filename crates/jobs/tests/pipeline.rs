use std::sync::Arc;

use chrono::{Datelike, Months, TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, Statement};
use tokio::sync::mpsc;

use engine::{
    AccountKind, CreateAccountCmd, CreateTransactionCmd, Engine, RecurringInterval,
    TransactionKind,
};
use jobs::{
    JobContext, JobsConfig, MemoryNotifier, TemplateKind, check_budget_alerts_once,
    materializer_worker, send_monthly_reports_once, trigger_recurring_once,
};
use migration::MigratorTrait;

async fn context() -> (JobContext, Arc<MemoryNotifier>) {
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

    let notifier = Arc::new(MemoryNotifier::default());
    let ctx = JobContext {
        engine: Arc::new(Engine::builder().database(db).build()),
        notifier: notifier.clone(),
        ai: None,
        config: JobsConfig::default(),
    };
    (ctx, notifier)
}

async fn default_account(engine: &Engine) -> engine::Account {
    engine
        .create_account(CreateAccountCmd {
            user_id: "alice".to_string(),
            name: "Main".to_string(),
            kind: AccountKind::Current,
            balance_minor: 1_000_000,
            is_default: true,
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn budget_sweep_sends_once_and_then_suppresses() {
    let (ctx, notifier) = context().await;
    let account = default_account(&ctx.engine).await;

    ctx.engine.upsert_budget("alice", 100_000).await.unwrap();
    ctx.engine
        .create_transaction(CreateTransactionCmd {
            user_id: "alice".to_string(),
            account_id: account.id,
            kind: TransactionKind::Expense,
            amount_minor: 85_000,
            category: "groceries".to_string(),
            description: None,
            occurred_at: Utc::now(),
            recurring_interval: None,
        })
        .await
        .unwrap();

    let sent = check_budget_alerts_once(&ctx).await.unwrap();
    assert_eq!(sent, 1);

    let messages = notifier.sent();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].recipient, "alice@example.com");
    assert_eq!(messages[0].template, TemplateKind::BudgetAlert);
    assert_eq!(messages[0].subject, "Budget Alert for Main");
    assert_eq!(messages[0].data["total_expenses_minor"], 85_000);

    // Alert already sent this month.
    let sent = check_budget_alerts_once(&ctx).await.unwrap();
    assert_eq!(sent, 0);
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test]
async fn under_budget_sweep_sends_nothing() {
    let (ctx, notifier) = context().await;
    default_account(&ctx.engine).await;
    ctx.engine.upsert_budget("alice", 100_000).await.unwrap();

    let sent = check_budget_alerts_once(&ctx).await.unwrap();
    assert_eq!(sent, 0);
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn trigger_and_worker_materialize_each_due_template_once() {
    let (ctx, _notifier) = context().await;
    let account = default_account(&ctx.engine).await;

    ctx.engine
        .create_transaction(CreateTransactionCmd {
            user_id: "alice".to_string(),
            account_id: account.id,
            kind: TransactionKind::Expense,
            amount_minor: 5_000,
            category: "bills".to_string(),
            description: Some("Netflix".to_string()),
            occurred_at: Utc::now(),
            recurring_interval: Some(RecurringInterval::Monthly),
        })
        .await
        .unwrap();

    let (tx, rx) = mpsc::channel(8);
    let enqueued = trigger_recurring_once(&ctx.engine, &tx).await.unwrap();
    assert_eq!(enqueued, 1);

    // Close the channel so the worker drains and returns.
    drop(tx);
    materializer_worker(&ctx.engine, rx).await;

    let account = ctx.engine.account(account.id, "alice").await.unwrap();
    assert_eq!(account.balance_minor, 995_000);

    // Schedule advanced: nothing due on a rescan.
    let (tx, _rx) = mpsc::channel(8);
    let enqueued = trigger_recurring_once(&ctx.engine, &tx).await.unwrap();
    assert_eq!(enqueued, 0);
}

#[tokio::test]
async fn monthly_report_without_ai_uses_fallback_insights() {
    let (ctx, notifier) = context().await;
    let account = default_account(&ctx.engine).await;

    let now = Utc.with_ymd_and_hms(2026, 9, 1, 0, 30, 0).unwrap();
    let last_month = now.checked_sub_months(Months::new(1)).unwrap();
    ctx.engine
        .create_transaction(CreateTransactionCmd {
            user_id: "alice".to_string(),
            account_id: account.id,
            kind: TransactionKind::Expense,
            amount_minor: 42_000,
            category: "travel".to_string(),
            description: None,
            occurred_at: last_month,
            recurring_interval: None,
        })
        .await
        .unwrap();

    let sent = send_monthly_reports_once(&ctx, now).await.unwrap();
    assert_eq!(sent, 1);

    let messages = notifier.sent();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].template, TemplateKind::MonthlyReport);
    assert_eq!(
        messages[0].subject,
        "Your Monthly Financial Report - August"
    );
    assert_eq!(messages[0].data["total_expenses_minor"], 42_000);
    assert_eq!(
        messages[0].data["insights"].as_array().map(Vec::len),
        Some(3)
    );
    assert_eq!(messages[0].data["month"], "August");
    // Month sanity: the report covers the month before `now`.
    assert_eq!(last_month.month(), 8);
}
