//! Административный сервис: статистика реестра.

use crate::error::AppError;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use std::collections::BTreeSet;
use vpnhub_entities::vpn_servers::{Column, Entity as ServerEntity};

/// Статистика реестра серверов.
#[derive(Debug, PartialEq, Eq)]
pub struct Stats {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
    /// Число различных стран среди активных серверов
    pub countries: usize,
    /// Сумма max_users по активным серверам
    pub capacity: i64,
    /// Сумма current_users по активным серверам
    pub online_users: i64,
}

/// Получить статистику по серверам.
pub async fn get_stats(db: &DatabaseConnection) -> Result<Stats, AppError> {
    let total = ServerEntity::find().count(db).await?;

    let active_servers = ServerEntity::find()
        .filter(Column::IsActive.eq(true))
        .all(db)
        .await?;
    let active = active_servers.len() as u64;

    let countries = active_servers
        .iter()
        .map(|s| s.country.to_lowercase())
        .collect::<BTreeSet<_>>()
        .len();
    let capacity = active_servers.iter().map(|s| i64::from(s.max_users)).sum();
    let online_users = active_servers
        .iter()
        .map(|s| i64::from(s.current_users))
        .sum();

    Ok(Stats {
        total,
        active,
        inactive: total.saturating_sub(active),
        countries,
        capacity,
        online_users,
    })
}
