pub mod embed;
pub mod error;
pub mod routes;

use axum::routing::get;
use axum::Router;
use std::future::Future;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Routes served, in the order they are advertised by the 404 handler.
pub const ENDPOINTS: &[&str] = &["/", "/api/health", "/desk"];

/// Build the axum Router with every route and middleware.
/// Used by `serve_on()` and available for integration testing.
pub fn build_router() -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(routes::pages::home))
        .route("/api/health", get(routes::health::health_check))
        .route("/desk", get(routes::pages::desk))
        .fallback(routes::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Start the server on `0.0.0.0:{port}` and run until `shutdown` resolves.
pub async fn serve<F>(port: u16, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    serve_on(listener, shutdown).await
}

/// Start the server on a pre-bound listener.
///
/// Unlike `serve`, this accepts a `TcpListener` that was already bound so the
/// caller can read the actual port before starting (useful when `port = 0`).
pub async fn serve_on<F>(listener: tokio::net::TcpListener, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let port = listener.local_addr()?.port();
    tracing::info!("status server listening on http://0.0.0.0:{port}");

    axum::serve(listener, build_router())
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("status server stopped");
    Ok(())
}
