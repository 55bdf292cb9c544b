use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;
    let mut tasks = tokio::task::JoinSet::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "gruzzolo={level},server={level},engine={level},jobs={level},ai={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.database).await?;
    let ai_client = settings.ai.map(|ai| {
        let client = ai::Client::new(ai.api_key);
        match ai.model {
            Some(model) => client.with_model(model),
            None => client,
        }
    });

    if let Some(server) = settings.server {
        let db = db.clone();
        let ai_client = ai_client.clone();
        tasks.spawn(async move {
            tracing::info!("Found server settings...");
            let engine = engine::Engine::builder().database(db.clone()).build();

            let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
            let addr = format!("{}:{}", bind, server.port);
            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(listener) => listener,
                Err(err) => {
                    tracing::error!("failed to bind server listener: {err}");
                    return;
                }
            };
            if let Err(err) = server::run_with_listener(engine, db, ai_client, listener).await {
                tracing::error!("server failed: {err}");
            }
        });
    }

    if let Some(jobs_settings) = settings.jobs {
        let db = db.clone();
        let ai_client = ai_client.clone();
        tasks.spawn(async move {
            tracing::info!("Found jobs settings...");
            let engine = Arc::new(engine::Engine::builder().database(db).build());
            let notifier = Arc::new(jobs::HttpNotifier::new(
                jobs_settings.notifier_endpoint,
                jobs_settings.notifier_api_key,
            ));

            jobs::run(jobs::JobContext {
                engine,
                notifier,
                ai: ai_client.map(Arc::new),
                config: jobs::JobsConfig::default(),
            })
            .await;
        });
    }

    while tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }

    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
