//! Ядро реестра VPN-серверов.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod tls;

#[cfg(test)]
mod tests;

use api::rate_limit::RateLimiter;
use api::AppState;
use config::ServerConfig;
use sea_orm::{Database, DatabaseConnection};
use tokio::sync::watch;
use tracing::info;
use vpnhub_migration::{Migrator, MigratorTrait};

/// Подключиться к БД и применить миграции.
pub async fn connect_database(db_url: &str) -> anyhow::Result<DatabaseConnection> {
    info!("Подключение к базе данных: {db_url}");
    let db = Database::connect(db_url).await?;

    info!("Выполнение миграций...");
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Запустить сервер реестра.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let db = connect_database(&config.db_url).await?;

    let state = AppState {
        db,
        rate_limiter: RateLimiter::per_minute(config.rate_limit_per_minute),
    };
    let app = api::build_router(state);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Получен сигнал завершения, останавливаю сервер...");
        let _ = shutdown_tx.send(true);
    });

    info!("Реестр VPN-серверов запущен (TLS: {})", config.tls_mode);
    tls::serve(&config, app, shutdown_rx).await?;

    info!("Реестр VPN-серверов остановлен");
    Ok(())
}
