//! Сервис реестра VPN-серверов: создание, список, деактивация.

use crate::error::AppError;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};
use std::net::IpAddr;
use vpnhub_entities::vpn_servers::{ActiveModel, Column, Entity as ServerEntity, Model};

pub const DEFAULT_PORT: i32 = 51820;
pub const DEFAULT_SSH_PORT: i32 = 22;
pub const DEFAULT_MAX_USERS: i32 = 100;
pub const DEFAULT_CONFIG_TYPE: &str = "amnezia";

/// Данные для создания сервера после приведения типов на границе API.
///
/// `None` означает "не передано". Строковые поля ещё не проверены:
/// пустые значения обязательных полей отклоняются в [`create_server`].
#[derive(Debug, Clone, Default)]
pub struct NewServer {
    pub name: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub ip_address: Option<String>,
    pub port: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub config_type: Option<String>,
    pub config_data: Option<String>,
    pub ssh_host: Option<String>,
    pub ssh_port: Option<i64>,
    pub ssh_user: Option<String>,
    pub ping_ms: Option<i64>,
    pub bandwidth_mbps: Option<i64>,
    pub max_users: Option<i64>,
}

/// Результат деактивации.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deactivation {
    Deactivated,
    AlreadyInactive,
}

/// Создать сервер. Возвращает сохранённую запись целиком.
pub async fn create_server(db: &DatabaseConnection, data: NewServer) -> Result<Model, AppError> {
    let model = validate(data)?;
    let created = model.insert(db).await?;

    tracing::info!(
        "Сервер добавлен: {} (id: {}, {}:{})",
        created.name,
        created.id,
        created.ip_address,
        created.port
    );
    Ok(created)
}

/// Список серверов в порядке добавления.
pub async fn list_servers(
    db: &DatabaseConnection,
    active_only: bool,
) -> Result<Vec<Model>, AppError> {
    let mut query = ServerEntity::find();
    if active_only {
        query = query.filter(Column::IsActive.eq(true));
    }
    let servers = query.order_by_asc(Column::Id).all(db).await?;
    Ok(servers)
}

/// Получить сервер по id.
pub async fn get_server(db: &DatabaseConnection, id: i32) -> Result<Model, AppError> {
    ServerEntity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Сервер не найден: {id}")))
}

/// Деактивировать сервер. Запись остаётся в БД; повторный вызов не ошибка.
pub async fn deactivate_server(
    db: &DatabaseConnection,
    id: i32,
) -> Result<Deactivation, AppError> {
    let now = Utc::now().to_rfc3339();

    let result = ServerEntity::update_many()
        .col_expr(Column::IsActive, Expr::value(false))
        .col_expr(Column::UpdatedAt, Expr::value(now))
        .filter(Column::Id.eq(id))
        .filter(Column::IsActive.eq(true))
        .exec(db)
        .await?;

    if result.rows_affected > 0 {
        tracing::info!("Сервер деактивирован: {id}");
        return Ok(Deactivation::Deactivated);
    }

    // Ничего не обновлено: либо уже неактивен, либо id неизвестен
    get_server(db, id).await?;
    tracing::debug!("Сервер {id} уже деактивирован");
    Ok(Deactivation::AlreadyInactive)
}

// ── Валидация ────────────────────────────────────────────────────────────────

fn validate(data: NewServer) -> Result<ActiveModel, AppError> {
    let name = required_text("name", data.name)?;
    let country = required_text("country", data.country)?;
    let ip_address = ip_literal(data.ip_address)?;

    let config_data = match data.config_data {
        Some(blob) if !blob.trim().is_empty() => blob,
        _ => return Err(AppError::validation("config_data", "обязательное поле")),
    };
    let config_type = match data.config_type {
        None => DEFAULT_CONFIG_TYPE.to_string(),
        Some(value) => required_text("config_type", Some(value))?,
    };

    let port = port_or_default("port", data.port, DEFAULT_PORT)?;
    let ssh_port = port_or_default("ssh_port", data.ssh_port, DEFAULT_SSH_PORT)?;
    let (latitude, longitude) = coordinates(data.latitude, data.longitude)?;
    let ping_ms = non_negative("ping_ms", data.ping_ms)?;
    let bandwidth_mbps = non_negative("bandwidth_mbps", data.bandwidth_mbps)?;
    let max_users = non_negative("max_users", data.max_users)?.unwrap_or(DEFAULT_MAX_USERS);

    let now = Utc::now().to_rfc3339();
    Ok(ActiveModel {
        name: Set(name),
        country: Set(country),
        city: Set(optional_text(data.city)),
        ip_address: Set(ip_address),
        port: Set(port),
        latitude: Set(latitude),
        longitude: Set(longitude),
        config_type: Set(config_type),
        config_data: Set(config_data),
        ssh_host: Set(optional_text(data.ssh_host)),
        ssh_port: Set(ssh_port),
        ssh_user: Set(optional_text(data.ssh_user)),
        ping_ms: Set(ping_ms),
        bandwidth_mbps: Set(bandwidth_mbps),
        max_users: Set(max_users),
        current_users: Set(0),
        is_active: Set(true),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    })
}

fn required_text(field: &str, value: Option<String>) -> Result<String, AppError> {
    optional_text(value).ok_or_else(|| AppError::validation(field, "обязательное поле"))
}

/// Пустая или пробельная строка эквивалентна отсутствию значения.
/// Непустое значение сохраняется как есть.
fn optional_text(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn ip_literal(value: Option<String>) -> Result<String, AppError> {
    let raw = required_text("ip_address", value)?;
    let ip = raw.trim();
    ip.parse::<IpAddr>()
        .map_err(|_| AppError::validation("ip_address", format!("некорректный IP-адрес: {ip}")))?;
    Ok(ip.to_string())
}

fn port_or_default(field: &str, value: Option<i64>, default: i32) -> Result<i32, AppError> {
    match value {
        None => Ok(default),
        Some(port) if (1..=65535).contains(&port) => Ok(port as i32),
        Some(port) => Err(AppError::validation(
            field,
            format!("порт {port} вне диапазона 1–65535"),
        )),
    }
}

fn non_negative(field: &str, value: Option<i64>) -> Result<Option<i32>, AppError> {
    match value {
        None => Ok(None),
        Some(v) if v < 0 => Err(AppError::validation(
            field,
            format!("значение {v} не может быть отрицательным"),
        )),
        Some(v) => i32::try_from(v)
            .map(Some)
            .map_err(|_| AppError::validation(field, format!("значение {v} слишком велико"))),
    }
}

fn coordinates(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<(Option<f64>, Option<f64>), AppError> {
    match (latitude, longitude) {
        (None, None) => Ok((None, None)),
        (Some(_), None) => Err(AppError::validation(
            "longitude",
            "задаётся вместе с latitude",
        )),
        (None, Some(_)) => Err(AppError::validation(
            "latitude",
            "задаётся вместе с longitude",
        )),
        (Some(lat), Some(lon)) => {
            check_coordinates(lat, lon)?;
            Ok((Some(lat), Some(lon)))
        }
    }
}

/// Проверить диапазоны широты [-90, 90] и долготы [-180, 180].
pub fn check_coordinates(latitude: f64, longitude: f64) -> Result<(), AppError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(AppError::validation(
            "latitude",
            format!("значение {latitude} вне диапазона [-90, 90]"),
        ));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(AppError::validation(
            "longitude",
            format!("значение {longitude} вне диапазона [-180, 180]"),
        ));
    }
    Ok(())
}
