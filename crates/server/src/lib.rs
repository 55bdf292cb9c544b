use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{ServerState, run, run_with_listener, spawn_with_listener};

mod accounts;
mod budgets;
mod receipts;
mod server;
mod transactions;

pub mod types {
    pub mod account {
        pub use api_types::account::{AccountNew, AccountView};
    }

    pub mod transaction {
        pub use api_types::transaction::{
            TransactionCreated, TransactionList, TransactionNew, TransactionUpdate,
            TransactionView,
        };
    }

    pub mod budget {
        pub use api_types::budget::{BudgetPut, BudgetView};
    }

    pub mod receipt {
        pub use api_types::receipt::{ReceiptScan, ReceiptView};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Ai(ai::AiError),
    Generic(String),
    Unavailable(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Unauthorized(_) => StatusCode::FORBIDDEN,
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::ExternalService(_) => StatusCode::BAD_GATEWAY,
        EngineError::Validation(_)
        | EngineError::InvalidAmount(_)
        | EngineError::InvalidInterval(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

fn status_for_ai_error(err: &ai::AiError) -> StatusCode {
    match err {
        ai::AiError::NotAReceipt => StatusCode::UNPROCESSABLE_ENTITY,
        ai::AiError::Network(_)
        | ai::AiError::Status { .. }
        | ai::AiError::MissingContent
        | ai::AiError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
    }
}

fn message_for_ai_error(err: ai::AiError) -> String {
    match err {
        ai::AiError::NotAReceipt => err.to_string(),
        other => {
            tracing::error!("model call failed: {other}");
            "upstream model error".to_string()
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => {
                (status_for_engine_error(&err), message_for_engine_error(err))
            }
            ServerError::Ai(err) => (status_for_ai_error(&err), message_for_ai_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
            ServerError::Unavailable(err) => (StatusCode::SERVICE_UNAVAILABLE, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<ai::AiError> for ServerError {
    fn from(value: ai::AiError) -> Self {
        Self::Ai(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_unauthorized_maps_to_403() {
        let res =
            ServerError::from(EngineError::Unauthorized("not yours".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::NotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_validation_maps_to_422() {
        let res = ServerError::from(EngineError::InvalidAmount("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn engine_bad_interval_maps_to_422() {
        let res = ServerError::from(EngineError::InvalidInterval("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn external_service_maps_to_502() {
        let res = ServerError::from(EngineError::ExternalService("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn not_a_receipt_maps_to_422() {
        let res = ServerError::from(ai::AiError::NotAReceipt).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn unavailable_maps_to_503() {
        let res = ServerError::Unavailable("no model client".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
