//! Entity для таблицы vpn_servers.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vpn_servers")]
pub struct Model {
    /// Автоинкрементный идентификатор, никогда не переиспользуется
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Отображаемое имя сервера
    pub name: String,

    pub country: String,

    pub city: Option<String>,

    /// IPv4/IPv6 литерал точки входа
    pub ip_address: String,

    /// Порт туннеля (по умолчанию 51820)
    pub port: i32,

    /// Координаты задаются только парой
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    /// Диалект конфигурации туннеля, например "amnezia"
    pub config_type: String,

    /// Конфигурация туннеля, хранится как есть
    #[sea_orm(column_type = "Text")]
    pub config_data: String,

    pub ssh_host: Option<String>,
    pub ssh_port: i32,
    pub ssh_user: Option<String>,

    pub ping_ms: Option<i32>,
    pub bandwidth_mbps: Option<i32>,

    pub max_users: i32,

    /// Меняется только учётом подключений, не CRUD-операциями
    pub current_users: i32,

    /// false после деактивации, запись физически не удаляется
    pub is_active: bool,

    /// Время создания (ISO-8601)
    pub created_at: String,

    /// Время последнего изменения (ISO-8601)
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Есть ли свободные слоты для новых пользователей.
    pub fn has_capacity(&self) -> bool {
        self.current_users < self.max_users
    }

    /// Координаты сервера, если заданы обе.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}
