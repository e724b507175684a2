// rest/mod.rs — Public REST API server.
//
// Axum HTTP server (default port 4400, local only unless bind_address is
// widened). All state flows through Arc<AppContext>.
//
// Endpoints:
//   GET    /api/v1/health
//   GET    /api/v1/diagnostic/questions
//   GET    /api/v1/users/{user_id}/diagnostic/status
//   POST   /api/v1/users/{user_id}/diagnostic/submit
//   GET    /api/v1/users/{user_id}/diagnostic/result
//   POST   /api/v1/users/{user_id}/sessions
//   GET    /api/v1/users/{user_id}/sessions/history
//   GET    /api/v1/users/{user_id}/sessions/{id}
//   PUT    /api/v1/users/{user_id}/sessions/{id}
//   DELETE /api/v1/users/{user_id}/sessions/{id}
//   GET    /api/v1/users/{user_id}/dashboard/summary
//   GET    /api/v1/users/{user_id}/dashboard/progress/today
//   GET    /api/v1/users/{user_id}/dashboard/progress/weekly
//   GET    /api/v1/users/{user_id}/dashboard/stats/monthly
//   GET    /api/v1/users/{user_id}/dashboard/stats/methods

pub mod auth;
pub mod routes;

use anyhow::Result;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::AppContext;

pub async fn start_rest_server(ctx: Arc<AppContext>) -> Result<()> {
    let bind = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let addr: SocketAddr = bind.parse()?;

    let router = build_router(ctx);

    info!("REST API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(err = %e, "failed to install ctrl-c handler");
    }
    info!("shutdown signal received");
}

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    let api = Router::new()
        // Diagnostic
        .route(
            "/api/v1/diagnostic/questions",
            get(routes::diagnostic::list_questions),
        )
        .route(
            "/api/v1/users/{user_id}/diagnostic/status",
            get(routes::diagnostic::status),
        )
        .route(
            "/api/v1/users/{user_id}/diagnostic/submit",
            post(routes::diagnostic::submit),
        )
        .route(
            "/api/v1/users/{user_id}/diagnostic/result",
            get(routes::diagnostic::result),
        )
        // Study sessions
        .route(
            "/api/v1/users/{user_id}/sessions",
            post(routes::sessions::create_session),
        )
        .route(
            "/api/v1/users/{user_id}/sessions/history",
            get(routes::sessions::session_history),
        )
        .route(
            "/api/v1/users/{user_id}/sessions/{id}",
            get(routes::sessions::get_session)
                .put(routes::sessions::update_session)
                .delete(routes::sessions::delete_session),
        )
        // Dashboard
        .route(
            "/api/v1/users/{user_id}/dashboard/summary",
            get(routes::dashboard::summary),
        )
        .route(
            "/api/v1/users/{user_id}/dashboard/progress/today",
            get(routes::dashboard::today_progress),
        )
        .route(
            "/api/v1/users/{user_id}/dashboard/progress/weekly",
            get(routes::dashboard::weekly_progress),
        )
        .route(
            "/api/v1/users/{user_id}/dashboard/stats/monthly",
            get(routes::dashboard::monthly_stats),
        )
        .route(
            "/api/v1/users/{user_id}/dashboard/stats/methods",
            get(routes::dashboard::methods_stats),
        )
        .layer(middleware::from_fn_with_state(
            ctx.clone(),
            auth::require_bearer,
        ));

    Router::new()
        // Health (no auth)
        .route("/api/v1/health", get(routes::health::health))
        .merge(api)
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}
