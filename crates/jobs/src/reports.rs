//! Monthly financial report delivery.

use chrono::{DateTime, Datelike, Months, Utc};
use serde_json::json;

use crate::{JobContext, JobError, Notification, TemplateKind};

/// Fallback insights used when no AI client is configured or the call fails.
const CANNED_INSIGHTS: [&str; 3] = [
    "Your highest expense category this month might need attention.",
    "Consider setting up a budget for better financial management.",
    "Track your recurring expenses to identify potential savings.",
];

/// Send every user a report covering the calendar month before `now`.
///
/// Returns how many reports went out; a failure for one user is logged and
/// does not stop the run.
pub async fn send_monthly_reports_once(
    ctx: &JobContext,
    now: DateTime<Utc>,
) -> Result<usize, JobError> {
    let Some(last_month) = now.checked_sub_months(Months::new(1)) else {
        return Ok(0);
    };

    let users = ctx.engine.list_users().await?;
    let mut sent = 0;

    for user in users {
        match report_one(ctx, &user, last_month).await {
            Ok(()) => sent += 1,
            Err(err) => {
                tracing::error!(user = %user.username, "monthly report failed: {err}");
            }
        }
    }
    Ok(sent)
}

async fn report_one(
    ctx: &JobContext,
    user: &engine::users::Model,
    last_month: DateTime<Utc>,
) -> Result<(), JobError> {
    let stats = ctx.engine.monthly_stats(&user.username, last_month).await?;
    let month_name = month_name(last_month.month());

    let insights = match &ctx.ai {
        Some(ai) => {
            let summary = ai::FinancialSummary {
                month: month_name.to_string(),
                total_income_minor: stats.total_income_minor,
                total_expenses_minor: stats.total_expenses_minor,
                expense_by_category: stats
                    .expense_by_category
                    .iter()
                    .map(|(category, minor)| (category.clone(), *minor))
                    .collect(),
            };
            match ai.generate_insights(&summary).await {
                Ok(insights) => insights,
                Err(err) => {
                    tracing::warn!("insight generation failed, using fallback: {err}");
                    canned_insights()
                }
            }
        }
        None => canned_insights(),
    };

    ctx.notifier
        .send(Notification {
            recipient: user.email.clone(),
            subject: format!("Your Monthly Financial Report - {month_name}"),
            template: TemplateKind::MonthlyReport,
            data: json!({
                "month": month_name,
                "total_income_minor": stats.total_income_minor,
                "total_expenses_minor": stats.total_expenses_minor,
                "expense_by_category": stats.expense_by_category,
                "transaction_count": stats.transaction_count,
                "insights": insights,
            }),
        })
        .await?;

    Ok(())
}

fn canned_insights() -> Vec<String> {
    CANNED_INSIGHTS.iter().map(ToString::to_string).collect()
}

fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        _ => "December",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_names_cover_the_year() {
        assert_eq!(month_name(1), "January");
        assert_eq!(month_name(8), "August");
        assert_eq!(month_name(12), "December");
    }
}
