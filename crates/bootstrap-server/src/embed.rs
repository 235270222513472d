use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use rust_embed::Embed;

use crate::error::AppError;

#[derive(Embed)]
#[folder = "$CARGO_MANIFEST_DIR/assets/"]
struct PageAssets;

/// Serve an embedded HTML page by file name.
pub fn html_page(name: &str) -> Result<Response, AppError> {
    let content = <PageAssets as Embed>::get(name)
        .ok_or_else(|| AppError::internal(format!("embedded page missing: {name}")))?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        content.data.into_owned(),
    )
        .into_response())
}
