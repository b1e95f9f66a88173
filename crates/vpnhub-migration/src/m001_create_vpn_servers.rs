//! Миграция: создание таблицы vpn_servers.

use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m001_create_vpn_servers"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VpnServers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VpnServers::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VpnServers::Name).string().not_null())
                    .col(ColumnDef::new(VpnServers::Country).string().not_null())
                    .col(ColumnDef::new(VpnServers::City).string().null())
                    .col(ColumnDef::new(VpnServers::IpAddress).string().not_null())
                    .col(
                        ColumnDef::new(VpnServers::Port)
                            .integer()
                            .not_null()
                            .default(51820),
                    )
                    .col(ColumnDef::new(VpnServers::Latitude).double().null())
                    .col(ColumnDef::new(VpnServers::Longitude).double().null())
                    .col(
                        ColumnDef::new(VpnServers::ConfigType)
                            .string()
                            .not_null()
                            .default("amnezia"),
                    )
                    .col(ColumnDef::new(VpnServers::ConfigData).text().not_null())
                    .col(ColumnDef::new(VpnServers::SshHost).string().null())
                    .col(
                        ColumnDef::new(VpnServers::SshPort)
                            .integer()
                            .not_null()
                            .default(22),
                    )
                    .col(ColumnDef::new(VpnServers::SshUser).string().null())
                    .col(ColumnDef::new(VpnServers::PingMs).integer().null())
                    .col(ColumnDef::new(VpnServers::BandwidthMbps).integer().null())
                    .col(
                        ColumnDef::new(VpnServers::MaxUsers)
                            .integer()
                            .not_null()
                            .default(100),
                    )
                    .col(
                        ColumnDef::new(VpnServers::CurrentUsers)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(VpnServers::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(VpnServers::CreatedAt).string().not_null())
                    .col(ColumnDef::new(VpnServers::UpdatedAt).string().not_null())
                    .to_owned(),
            )
            .await?;

        // Выборка активных серверов идёт почти в каждом запросе
        manager
            .create_index(
                Index::create()
                    .table(VpnServers::Table)
                    .col(VpnServers::IsActive)
                    .name("idx_vpn_servers_is_active")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VpnServers::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum VpnServers {
    Table,
    Id,
    Name,
    Country,
    City,
    IpAddress,
    Port,
    Latitude,
    Longitude,
    ConfigType,
    ConfigData,
    SshHost,
    SshPort,
    SshUser,
    PingMs,
    BandwidthMbps,
    MaxUsers,
    CurrentUsers,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
