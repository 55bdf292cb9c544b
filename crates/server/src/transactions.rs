//! Transactions API endpoints

use api_types::{
    RecurringInterval as ApiInterval, TransactionKind as ApiKind,
    transaction::{
        TransactionCreated, TransactionList, TransactionNew, TransactionUpdate, TransactionView,
    },
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};
use engine::users;

fn map_kind(kind: engine::TransactionKind) -> ApiKind {
    match kind {
        engine::TransactionKind::Income => ApiKind::Income,
        engine::TransactionKind::Expense => ApiKind::Expense,
    }
}

fn unmap_kind(kind: ApiKind) -> engine::TransactionKind {
    match kind {
        ApiKind::Income => engine::TransactionKind::Income,
        ApiKind::Expense => engine::TransactionKind::Expense,
    }
}

fn map_interval(interval: engine::RecurringInterval) -> ApiInterval {
    match interval {
        engine::RecurringInterval::Daily => ApiInterval::Daily,
        engine::RecurringInterval::Weekly => ApiInterval::Weekly,
        engine::RecurringInterval::Monthly => ApiInterval::Monthly,
        engine::RecurringInterval::Yearly => ApiInterval::Yearly,
    }
}

fn unmap_interval(interval: ApiInterval) -> engine::RecurringInterval {
    match interval {
        ApiInterval::Daily => engine::RecurringInterval::Daily,
        ApiInterval::Weekly => engine::RecurringInterval::Weekly,
        ApiInterval::Monthly => engine::RecurringInterval::Monthly,
        ApiInterval::Yearly => engine::RecurringInterval::Yearly,
    }
}

fn view(tx: engine::Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        account_id: tx.account_id,
        kind: map_kind(tx.kind),
        amount_minor: tx.amount_minor,
        category: tx.category,
        description: tx.description,
        occurred_at: tx.occurred_at,
        is_recurring: tx.is_recurring,
        recurring_interval: tx.recurring_interval.map(map_interval),
        next_recurring_date: tx.next_recurring_date,
        last_processed: tx.last_processed,
    }
}

pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionCreated>), ServerError> {
    let tx = state
        .engine
        .create_transaction(engine::CreateTransactionCmd {
            user_id: user.username.clone(),
            account_id: payload.account_id,
            kind: unmap_kind(payload.kind),
            amount_minor: payload.amount_minor,
            category: payload.category,
            description: payload.description,
            occurred_at: payload.occurred_at,
            recurring_interval: payload.recurring_interval.map(unmap_interval),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(TransactionCreated { id: tx.id })))
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Query(params): Query<TransactionList>,
) -> Result<Json<Vec<TransactionView>>, ServerError> {
    let limit = params.limit.unwrap_or(50);
    let txs = state
        .engine
        .list_transactions(params.account_id, &user.username, limit)
        .await?;

    Ok(Json(txs.into_iter().map(view).collect()))
}

pub async fn get(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionView>, ServerError> {
    let tx = state.engine.transaction(id, &user.username).await?;
    Ok(Json(view(tx)))
}

pub async fn update(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransactionUpdate>,
) -> Result<Json<TransactionView>, ServerError> {
    let recurrence = match (payload.clear_recurring.unwrap_or(false), payload.recurring_interval) {
        (true, Some(_)) => {
            return Err(ServerError::Generic(
                "clear_recurring and recurring_interval are mutually exclusive".to_string(),
            ));
        }
        (true, None) => engine::RecurrencePatch::Clear,
        (false, Some(interval)) => engine::RecurrencePatch::Set(unmap_interval(interval)),
        (false, None) => engine::RecurrencePatch::Keep,
    };

    let tx = state
        .engine
        .update_transaction(engine::UpdateTransactionCmd {
            user_id: user.username.clone(),
            transaction_id: id,
            kind: payload.kind.map(unmap_kind),
            amount_minor: payload.amount_minor,
            category: payload.category,
            description: payload.description,
            occurred_at: payload.occurred_at,
            recurrence,
        })
        .await?;

    Ok(Json(view(tx)))
}

pub async fn delete(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_transaction(id, &user.username).await?;
    Ok(StatusCode::NO_CONTENT)
}
