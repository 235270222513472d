use axum::response::Response;

use crate::embed::html_page;
use crate::error::AppError;

/// GET /: landing page.
pub async fn home() -> Result<Response, AppError> {
    html_page("index.html")
}

/// GET /desk: dashboard placeholder.
pub async fn desk() -> Result<Response, AppError> {
    html_page("desk.html")
}
