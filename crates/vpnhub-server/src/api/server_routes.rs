//! Маршруты реестра: список, добавление, деактивация, подбор сервера.

use crate::api::form::{active_flag, required_float, CreateServerRequest, FormValue};
use crate::api::AppState;
use crate::error::AppError;
use crate::services::registry_service::{self, Deactivation};
use crate::services::selection_service;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use vpnhub_entities::ServerRecord;

// ── Типы запросов/ответов ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub active: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeactivateQuery {
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub servers: Vec<ServerRecord>,
}

#[derive(Debug, Serialize)]
pub struct CreateResponse {
    pub success: bool,
    pub server: ServerRecord,
}

#[derive(Debug, Serialize)]
pub struct DeactivateResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct BestServerRequest {
    #[serde(default)]
    pub latitude: Option<FormValue>,
    #[serde(default)]
    pub longitude: Option<FormValue>,
}

#[derive(Debug, Serialize)]
pub struct BestServerResponse {
    pub server: ServerRecord,
    pub reason: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/servers",
            get(list_servers).post(create_server).delete(deactivate_server),
        )
        .route("/best-server", post(best_server))
}

// ── Обработчики ──────────────────────────────────────────────────────────────

/// GET /api/v1/servers?active=true|false: список серверов (по умолчанию только активные).
async fn list_servers(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, AppError> {
    let active_only = active_flag(query.active.as_deref())?;
    let servers = registry_service::list_servers(&state.db, active_only).await?;
    tracing::debug!("Список серверов: {} (active_only: {active_only})", servers.len());

    Ok(Json(ListResponse { servers }))
}

/// POST /api/v1/servers: добавление сервера.
async fn create_server(
    State(state): State<AppState>,
    payload: Result<Json<CreateServerRequest>, JsonRejection>,
) -> Result<Json<CreateResponse>, AppError> {
    let Json(req) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let data = req.into_new_server()?;
    let server = registry_service::create_server(&state.db, data)
        .await
        .inspect_err(|e| tracing::warn!("Сервер не добавлен: {e}"))?;

    Ok(Json(CreateResponse {
        success: true,
        server,
    }))
}

/// DELETE /api/v1/servers?id=<id>: деактивация (запись не удаляется).
async fn deactivate_server(
    State(state): State<AppState>,
    Query(query): Query<DeactivateQuery>,
) -> Result<Json<DeactivateResponse>, AppError> {
    let raw = query
        .id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::validation("id", "обязательный параметр"))?;
    let id: i32 = raw
        .parse()
        .map_err(|_| AppError::validation("id", format!("ожидается целое число, получено '{raw}'")))?;

    let message = match registry_service::deactivate_server(&state.db, id).await? {
        Deactivation::Deactivated => "Сервер деактивирован",
        Deactivation::AlreadyInactive => "Сервер уже деактивирован",
    };

    Ok(Json(DeactivateResponse {
        success: true,
        message: message.to_string(),
    }))
}

/// POST /api/v1/best-server: оптимальный сервер по геолокации, пингу и загрузке.
async fn best_server(
    State(state): State<AppState>,
    payload: Result<Json<BestServerRequest>, JsonRejection>,
) -> Result<Json<BestServerResponse>, AppError> {
    let Json(req) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let latitude = required_float("latitude", req.latitude)?;
    let longitude = required_float("longitude", req.longitude)?;

    let server = selection_service::best_server(&state.db, latitude, longitude).await?;

    Ok(Json(BestServerResponse {
        server,
        reason: "Оптимальный по расстоянию, пингу и загрузке".to_string(),
    }))
}
