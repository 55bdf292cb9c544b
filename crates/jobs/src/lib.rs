//! Background jobs: budget alert sweeps, the recurring-transaction pipeline
//! and monthly report delivery.
//!
//! `run` drives everything from plain `tokio::time` intervals on a `JoinSet`;
//! the trigger and the materializer worker talk over an mpsc channel. Each
//! job body is also exposed as a `*_once` function so tests can drive it
//! without the timers.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Utc};
use tokio::{sync::mpsc, task::JoinSet};

use engine::{Engine, EngineError};

pub use alerts::check_budget_alerts_once;
pub use notify::{HttpNotifier, MemoryNotifier, Notification, Notifier, NotifyError, TemplateKind};
pub use recurring::{RecurringDue, materializer_worker, trigger_recurring_once};
pub use reports::send_monthly_reports_once;

mod alerts;
mod notify;
mod recurring;
mod reports;

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
}

#[derive(Clone, Debug)]
pub struct JobsConfig {
    /// How often budgets are swept for alerts.
    pub alert_interval: Duration,
    /// How often the due-template scan runs.
    pub recurring_interval: Duration,
    /// How often the month-change check runs; reports only go out when the
    /// calendar month has actually changed.
    pub report_interval: Duration,
    /// Capacity of the due-event channel.
    pub event_buffer: usize,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            alert_interval: Duration::from_secs(6 * 60 * 60),
            recurring_interval: Duration::from_secs(24 * 60 * 60),
            report_interval: Duration::from_secs(24 * 60 * 60),
            event_buffer: 64,
        }
    }
}

#[derive(Clone)]
pub struct JobContext {
    pub engine: Arc<Engine>,
    pub notifier: Arc<dyn Notifier>,
    pub ai: Option<Arc<ai::Client>>,
    pub config: JobsConfig,
}

/// Spawn all job loops and run until aborted.
pub async fn run(ctx: JobContext) {
    let (events_tx, events_rx) = mpsc::channel(ctx.config.event_buffer);
    let mut set = JoinSet::new();

    {
        let ctx = ctx.clone();
        set.spawn(async move {
            let mut tick = tokio::time::interval(ctx.config.alert_interval);
            loop {
                tick.tick().await;
                match check_budget_alerts_once(&ctx).await {
                    Ok(sent) => tracing::debug!("budget sweep done, {sent} alert(s) sent"),
                    Err(err) => tracing::error!("budget sweep failed: {err}"),
                }
            }
        });
    }

    {
        let ctx = ctx.clone();
        set.spawn(async move {
            let mut tick = tokio::time::interval(ctx.config.recurring_interval);
            loop {
                tick.tick().await;
                match trigger_recurring_once(&ctx.engine, &events_tx).await {
                    Ok(n) => tracing::debug!("recurring scan done, {n} event(s) enqueued"),
                    Err(err) => tracing::error!("recurring scan failed: {err}"),
                }
            }
        });
    }

    {
        let ctx = ctx.clone();
        set.spawn(async move {
            materializer_worker(&ctx.engine, events_rx).await;
        });
    }

    {
        let ctx = ctx.clone();
        set.spawn(async move {
            let mut tick = tokio::time::interval(ctx.config.report_interval);
            // Reports fire on the first tick in a new month.
            let mut current_month = month_key(Utc::now());
            loop {
                tick.tick().await;
                let now = Utc::now();
                let month = month_key(now);
                if month == current_month {
                    continue;
                }
                current_month = month;
                match send_monthly_reports_once(&ctx, now).await {
                    Ok(sent) => tracing::info!("monthly reports done, {sent} sent"),
                    Err(err) => tracing::error!("monthly reports failed: {err}"),
                }
            }
        });
    }

    while let Some(res) = set.join_next().await {
        if let Err(err) = res {
            tracing::error!("job task aborted: {err}");
        }
    }
}

fn month_key(now: chrono::DateTime<Utc>) -> (i32, u32) {
    (now.year(), now.month())
}
