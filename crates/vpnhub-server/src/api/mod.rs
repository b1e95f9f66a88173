//! HTTP API: маршрутизация и состояние приложения.

pub mod admin_routes;
pub mod form;
pub mod rate_limit;
pub mod server_routes;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use rate_limit::RateLimiter;
use sea_orm::{ConnectionTrait, DatabaseConnection};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Общее состояние приложения. Вся изменяемая часть живёт в БД.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub rate_limiter: RateLimiter,
}

/// Построить маршрутизатор Axum.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let limiter = state.rate_limiter.clone();

    let api_routes = Router::new()
        .merge(server_routes::routes())
        .nest("/admin", admin_routes::routes())
        .layer(axum::middleware::from_fn(move |req, next| {
            let limiter = limiter.clone();
            rate_limit::rate_limit_middleware(limiter, req, next)
        }));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health: проверка работоспособности сервера.
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let db_ok = state.db.execute_unprepared("SELECT 1").await.is_ok();
    Json(serde_json::json!({
        "status": if db_ok { "ok" } else { "error" },
        "database": db_ok,
        "service": "vpnhub-server"
    }))
}
