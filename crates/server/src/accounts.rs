//! Accounts API endpoints

use api_types::{
    AccountKind as ApiKind,
    account::{AccountNew, AccountView},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};
use engine::users;

fn map_kind(kind: engine::AccountKind) -> ApiKind {
    match kind {
        engine::AccountKind::Current => ApiKind::Current,
        engine::AccountKind::Saving => ApiKind::Saving,
    }
}

fn view(account: engine::Account) -> AccountView {
    AccountView {
        id: account.id,
        name: account.name,
        kind: map_kind(account.kind),
        balance_minor: account.balance_minor,
        is_default: account.is_default,
        created_at: account.created_at,
    }
}

pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<AccountNew>,
) -> Result<(StatusCode, Json<AccountView>), ServerError> {
    let kind = match payload.kind {
        ApiKind::Current => engine::AccountKind::Current,
        ApiKind::Saving => engine::AccountKind::Saving,
    };

    let account = state
        .engine
        .create_account(engine::CreateAccountCmd {
            user_id: user.username.clone(),
            name: payload.name,
            kind,
            balance_minor: payload.balance_minor,
            is_default: payload.is_default.unwrap_or(false),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(view(account))))
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<AccountView>>, ServerError> {
    let accounts = state.engine.list_accounts(&user.username).await?;
    Ok(Json(accounts.into_iter().map(view).collect()))
}

pub async fn set_default(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AccountView>, ServerError> {
    let account = state.engine.set_default_account(id, &user.username).await?;
    Ok(Json(view(account)))
}
