//! Запуск HTTP(S): без TLS, с самоподписанным сертификатом или с PEM-файлами.

use crate::config::{ServerConfig, TlsMode};
use axum::Router;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

/// Интервал перечитывания PEM-файлов с диска.
const CERT_RELOAD_INTERVAL: Duration = Duration::from_secs(12 * 3600);

/// Запустить сервер в нужном TLS-режиме.
pub async fn serve(
    config: &ServerConfig,
    app: Router,
    shutdown_rx: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let addr: SocketAddr = config.listen.parse()?;
    if config.tls_mode != TlsMode::None {
        // rustls собран и с ring, и с aws-lc-rs: провайдер выбирается явно
        let _ = rustls::crypto::ring::default_provider().install_default();
    }
    match &config.tls_mode {
        TlsMode::None => serve_plain(addr, app, shutdown_rx).await,
        TlsMode::SelfSigned => {
            let rustls_config = self_signed_config(&config.domain).await?;
            info!("Запуск HTTPS сервера на {addr} (самоподписанный сертификат)");
            serve_rustls(addr, app, rustls_config, shutdown_rx).await
        }
        TlsMode::Cert => {
            let rustls_config = pem_file_config(&config.tls_cert, &config.tls_key).await?;
            info!(
                "Запуск HTTPS сервера на {addr} (сертификат: {}, ключ: {})",
                config.tls_cert, config.tls_key
            );
            serve_rustls(addr, app, rustls_config, shutdown_rx).await
        }
    }
}

/// Дождаться сигнала завершения.
async fn wait_shutdown(mut shutdown_rx: watch::Receiver<bool>) {
    while !*shutdown_rx.borrow_and_update() {
        if shutdown_rx.changed().await.is_err() {
            break;
        }
    }
}

async fn serve_plain(
    addr: SocketAddr,
    app: Router,
    shutdown_rx: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    info!("Запуск HTTP сервера на {addr} (без TLS)");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(wait_shutdown(shutdown_rx))
    .await?;
    Ok(())
}

async fn self_signed_config(
    domain: &str,
) -> anyhow::Result<axum_server::tls_rustls::RustlsConfig> {
    let subject_alt_names = vec![domain.to_string(), "localhost".to_string()];
    let certified_key = rcgen::generate_simple_self_signed(subject_alt_names)
        .map_err(|e| anyhow::anyhow!("Ошибка генерации сертификата: {e}"))?;

    let cert_pem = certified_key.cert.pem();
    let key_pem = certified_key.signing_key.serialize_pem();

    let config = axum_server::tls_rustls::RustlsConfig::from_pem(
        cert_pem.into_bytes(),
        key_pem.into_bytes(),
    )
    .await?;
    Ok(config)
}

/// PEM-сертификаты из файлов; фоновая задача перечитывает их каждые 12 часов.
async fn pem_file_config(
    cert_path: &str,
    key_path: &str,
) -> anyhow::Result<axum_server::tls_rustls::RustlsConfig> {
    let config =
        axum_server::tls_rustls::RustlsConfig::from_pem_file(cert_path, key_path).await?;

    let reload_config = config.clone();
    let reload_cert = cert_path.to_string();
    let reload_key = key_path.to_string();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CERT_RELOAD_INTERVAL);
        interval.tick().await; // первый тик срабатывает сразу
        loop {
            interval.tick().await;
            match reload_config
                .reload_from_pem_file(&reload_cert, &reload_key)
                .await
            {
                Ok(()) => tracing::info!("TLS сертификаты перезагружены"),
                Err(e) => tracing::error!("Ошибка перезагрузки TLS сертификатов: {e}"),
            }
        }
    });

    Ok(config)
}

async fn serve_rustls(
    addr: SocketAddr,
    app: Router,
    rustls_config: axum_server::tls_rustls::RustlsConfig,
    shutdown_rx: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let handle = axum_server::Handle::new();
    let handle_shutdown = handle.clone();
    tokio::spawn(async move {
        wait_shutdown(shutdown_rx).await;
        handle_shutdown.graceful_shutdown(Some(Duration::from_secs(10)));
    });

    axum_server::bind_rustls(addr, rustls_config)
        .handle(handle)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await?;
    Ok(())
}
