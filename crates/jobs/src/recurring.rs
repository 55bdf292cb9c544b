//! Recurring transaction pipeline: trigger and materializer worker.

use chrono::Utc;
use tokio::sync::mpsc;
use uuid::Uuid;

use engine::{Engine, MaterializeOutcome};

use crate::JobError;

/// One due template, forwarded from the trigger to the worker.
///
/// Delivery is at-least-once; the engine's claim step makes redelivery a
/// no-op.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecurringDue {
    pub transaction_id: Uuid,
    pub user_id: String,
}

/// Scan for due templates and enqueue one event per row.
///
/// Returns how many events were enqueued.
pub async fn trigger_recurring_once(
    engine: &Engine,
    events: &mpsc::Sender<RecurringDue>,
) -> Result<usize, JobError> {
    let due = engine.due_recurring_transactions(Utc::now()).await?;
    let mut enqueued = 0;

    for template in due {
        let event = RecurringDue {
            transaction_id: template.id,
            user_id: template.user_id,
        };
        if events.send(event).await.is_err() {
            // Worker gone; the next scan will pick the rest up again.
            tracing::warn!("recurring event channel closed");
            break;
        }
        enqueued += 1;
    }
    Ok(enqueued)
}

/// Consume due events until the channel closes.
pub async fn materializer_worker(engine: &Engine, mut events: mpsc::Receiver<RecurringDue>) {
    while let Some(event) = events.recv().await {
        match engine
            .materialize_recurring(event.transaction_id, &event.user_id, Utc::now())
            .await
        {
            Ok(MaterializeOutcome::Fired { transaction_id }) => {
                tracing::info!(
                    template = %event.transaction_id,
                    created = %transaction_id,
                    "recurring transaction materialized"
                );
            }
            Ok(MaterializeOutcome::Skipped) => {
                tracing::debug!(template = %event.transaction_id, "not due anymore, skipped");
            }
            Err(err) => {
                tracing::error!(template = %event.transaction_id, "materialization failed: {err}");
            }
        }
    }
}
