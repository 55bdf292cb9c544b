//! Budget API endpoints

use api_types::budget::{BudgetPut, BudgetView};
use axum::{Extension, Json, extract::State, http::StatusCode};
use chrono::Utc;

use crate::{ServerError, server::ServerState};
use engine::users;

pub async fn upsert(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<BudgetPut>,
) -> Result<(StatusCode, Json<BudgetView>), ServerError> {
    let budget = state
        .engine
        .upsert_budget(&user.username, payload.amount_minor)
        .await?;

    Ok((
        StatusCode::OK,
        Json(BudgetView {
            amount_minor: budget.amount_minor,
            last_alert_sent: budget.last_alert_sent,
            current_month_expenses_minor: None,
            percentage_used: None,
        }),
    ))
}

pub async fn get(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<BudgetView>, ServerError> {
    let budget = state
        .engine
        .budget(&user.username)
        .await?
        .ok_or_else(|| engine::EngineError::NotFound("budget not exists".to_string()))?;

    // Usage is measured on the default account, like the alert evaluator.
    let usage = match state.engine.default_account(&user.username).await? {
        Some(account) => Some(
            state
                .engine
                .current_month_expenses(&user.username, account.id, Utc::now())
                .await?,
        ),
        None => None,
    };

    let percentage_used =
        usage.map(|expenses| expenses as f64 / budget.amount_minor as f64 * 100.0);

    Ok(Json(BudgetView {
        amount_minor: budget.amount_minor,
        last_alert_sent: budget.last_alert_sent,
        current_month_expenses_minor: usage,
        percentage_used,
    }))
}
