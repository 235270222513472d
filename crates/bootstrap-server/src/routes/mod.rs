pub mod health;
pub mod pages;

use axum::http::{StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Json;

use crate::ENDPOINTS;

/// Fallback for unmatched paths: a JSON 404 listing the valid routes.
pub async fn not_found(uri: Uri) -> impl IntoResponse {
    tracing::debug!(path = %uri.path(), "no route");
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": "Not Found",
            "message": "The requested resource was not found",
            "available_endpoints": ENDPOINTS,
        })),
    )
}
