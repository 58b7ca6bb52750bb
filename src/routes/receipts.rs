use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::post;
use axum::{Json, Router};
use tracing::{error, info};

use crate::errors::AppError;
use crate::services::receipt_scan_service::{self, ScannedReceipt, MAX_RECEIPT_BYTES};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/receipts/scan", post(scan_receipt))
        // Multipart overhead on top of the 5 MB image cap
        .layer(DefaultBodyLimit::max(MAX_RECEIPT_BYTES + 64 * 1024))
}

async fn scan_receipt(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ScannedReceipt>, AppError> {
    info!("POST /receipts/scan - Scanning receipt");

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let mime_type = field
            .content_type()
            .unwrap_or("image/jpeg")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("failed to read upload: {e}")))?;

        let scanned = receipt_scan_service::scan_receipt(&state.insights, &mime_type, &data)
            .await
            .map_err(|e| {
                error!("Receipt scan failed: {}", e);
                e
            })?;

        return Ok(Json(scanned));
    }

    Err(AppError::Validation(
        "multipart field 'file' is required".to_string(),
    ))
}
