//! Точка входа реестра VPN-серверов.

use clap::Parser;
use tracing_subscriber::EnvFilter;
use vpnhub_server::config::{ServerConfig, TlsMode};

#[derive(Parser)]
#[command(
    name = "vpnhub-server",
    about = "VPN Hub: реестр VPN-серверов и подбор точки подключения"
)]
struct Cli {
    /// Адрес для прослушивания (host:port)
    #[arg(long, default_value = "0.0.0.0:3000", env = "VPNHUB_LISTEN")]
    listen: String,

    /// URL базы данных
    #[arg(
        long,
        default_value = "sqlite:./vpnhub.db?mode=rwc",
        env = "DATABASE_URL"
    )]
    db_url: String,

    /// Режим TLS: none, self-signed, cert
    #[arg(long, default_value = "none")]
    tls_mode: String,

    /// Домен для SAN самоподписанного сертификата
    #[arg(long, default_value = "localhost")]
    domain: String,

    /// PEM-сертификат (режим cert)
    #[arg(long, default_value = "/etc/vpnhub/cert.pem")]
    tls_cert: String,

    /// PEM-ключ (режим cert)
    #[arg(long, default_value = "/etc/vpnhub/key.pem")]
    tls_key: String,

    /// Лимит запросов к API в минуту на IP
    #[arg(long, default_value_t = 120)]
    rate_limit: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let tls_mode: TlsMode = cli
        .tls_mode
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    if cli.rate_limit == 0 {
        anyhow::bail!("--rate-limit должен быть больше нуля");
    }

    let config = ServerConfig {
        listen: cli.listen,
        db_url: cli.db_url,
        tls_mode,
        domain: cli.domain,
        tls_cert: cli.tls_cert,
        tls_key: cli.tls_key,
        rate_limit_per_minute: cli.rate_limit,
    };

    vpnhub_server::run(config).await
}
