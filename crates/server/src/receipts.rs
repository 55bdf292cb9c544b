//! Receipt scanning endpoint

use api_types::receipt::{ReceiptScan, ReceiptView};
use axum::{Extension, Json, extract::State};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::{ServerError, server::ServerState};
use engine::users;

pub async fn scan(
    Extension(_user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<ReceiptScan>,
) -> Result<Json<ReceiptView>, ServerError> {
    let Some(ai) = state.ai.clone() else {
        return Err(ServerError::Unavailable(
            "receipt scanning is not configured".to_string(),
        ));
    };

    // Reject garbage before paying for a model call.
    if BASE64.decode(&payload.image_base64).is_err() {
        return Err(ServerError::Generic(
            "image_base64 is not valid base64".to_string(),
        ));
    }
    if payload.mime_type.is_empty() {
        return Err(ServerError::Generic("mime_type is required".to_string()));
    }

    let data = ai
        .scan_receipt(payload.image_base64, payload.mime_type)
        .await?;

    if data.amount_minor <= 0 {
        return Err(ServerError::Generic(
            "extracted amount is not positive".to_string(),
        ));
    }

    Ok(Json(ReceiptView {
        amount_minor: data.amount_minor,
        date: data.date,
        description: data.description,
        merchant_name: data.merchant_name,
        category: data.category,
    }))
}
