//! Административные маршруты: статистика реестра.

use crate::api::AppState;
use crate::error::AppError;
use crate::services::admin_service;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
    pub countries: usize,
    pub capacity: i64,
    pub online_users: i64,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/stats", get(get_stats))
}

/// GET /api/v1/admin/stats: статистика реестра.
async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, AppError> {
    let stats = admin_service::get_stats(&state.db).await?;

    Ok(Json(StatsResponse {
        total: stats.total,
        active: stats.active,
        inactive: stats.inactive,
        countries: stats.countries,
        capacity: stats.capacity,
        online_users: stats.online_users,
    }))
}
