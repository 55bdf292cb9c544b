//! Budget alert sweep.

use chrono::Utc;
use serde_json::json;

use engine::AlertDecision;

use crate::{JobContext, JobError, Notification, TemplateKind};

/// Evaluate every budget once and deliver alerts for those over threshold.
///
/// A failure on one budget is logged and does not stop the sweep. Returns
/// the number of alerts delivered.
pub async fn check_budget_alerts_once(ctx: &JobContext) -> Result<usize, JobError> {
    let budgets = ctx.engine.all_budgets().await?;
    let now = Utc::now();
    let mut sent = 0;

    for budget in budgets {
        match alert_one(ctx, &budget, now).await {
            Ok(true) => sent += 1,
            Ok(false) => {}
            Err(err) => {
                tracing::error!(user = %budget.user_id, "budget alert failed: {err}");
            }
        }
    }
    Ok(sent)
}

async fn alert_one(
    ctx: &JobContext,
    budget: &engine::Budget,
    now: chrono::DateTime<Utc>,
) -> Result<bool, JobError> {
    let decision = ctx.engine.evaluate_budget_alert(budget, now).await?;
    let AlertDecision::Send {
        account,
        total_expenses_minor,
        percentage_used,
    } = decision
    else {
        return Ok(false);
    };

    let user = ctx.engine.user(&budget.user_id).await?;
    ctx.notifier
        .send(Notification {
            recipient: user.email,
            subject: format!("Budget Alert for {}", account.name),
            template: TemplateKind::BudgetAlert,
            data: json!({
                "account_name": account.name,
                "budget_amount_minor": budget.amount_minor,
                "total_expenses_minor": total_expenses_minor,
                "percentage_used": percentage_used,
            }),
        })
        .await?;

    // Persisted after delivery: a crash in between re-sends rather than
    // silently dropping the alert.
    ctx.engine.mark_alert_sent(budget.id, now).await?;
    tracing::info!(user = %budget.user_id, "budget alert sent ({percentage_used:.1}% used)");
    Ok(true)
}
