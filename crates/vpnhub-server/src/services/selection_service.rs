//! Подбор оптимального сервера по геолокации, пингу и загрузке.

use crate::error::AppError;
use crate::services::registry_service::{check_coordinates, list_servers};
use sea_orm::DatabaseConnection;
use vpnhub_entities::vpn_servers::Model;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Штраф за пинг, если он не измерен.
const UNKNOWN_PING_PENALTY: f64 = 50.0;

/// Выбрать лучший сервер для клиента с координатами (latitude, longitude).
pub async fn best_server(
    db: &DatabaseConnection,
    latitude: f64,
    longitude: f64,
) -> Result<Model, AppError> {
    check_coordinates(latitude, longitude)?;

    let servers = list_servers(db, true).await?;
    pick_best(servers, latitude, longitude)
        .ok_or_else(|| AppError::NotFound("Нет доступных серверов".into()))
}

/// Кандидаты: есть свободные слоты и заданы координаты.
/// При равном счёте выигрывает меньший id.
pub fn pick_best(servers: Vec<Model>, latitude: f64, longitude: f64) -> Option<Model> {
    servers
        .into_iter()
        .filter(|s| s.is_active && s.has_capacity())
        .filter_map(|s| {
            let (lat, lon) = s.coordinates()?;
            let score = haversine_km(latitude, longitude, lat, lon)
                + ping_penalty(&s)
                + load_penalty(&s);
            Some((score, s))
        })
        .min_by(|(a, sa), (b, sb)| a.total_cmp(b).then(sa.id.cmp(&sb.id)))
        .map(|(_, s)| s)
}

fn ping_penalty(server: &Model) -> f64 {
    server
        .ping_ms
        .map(f64::from)
        .unwrap_or(UNKNOWN_PING_PENALTY)
}

/// Процент занятых слотов. Кандидаты всегда имеют max_users > 0.
fn load_penalty(server: &Model) -> f64 {
    f64::from(server.current_users) / f64::from(server.max_users) * 100.0
}

/// Расстояние по дуге большого круга в километрах.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}
