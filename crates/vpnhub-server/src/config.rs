//! Конфигурация сервера реестра.

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Адрес для прослушивания (например "0.0.0.0:3000")
    pub listen: String,

    /// URL подключения к БД (sqlite или postgres)
    pub db_url: String,

    /// Режим TLS
    pub tls_mode: TlsMode,

    /// Домен для SAN самоподписанного сертификата
    pub domain: String,

    /// Путь к PEM-сертификату (режим cert)
    pub tls_cert: String,

    /// Путь к PEM-ключу (режим cert)
    pub tls_key: String,

    /// Лимит запросов к /api/v1 в минуту на IP
    pub rate_limit_per_minute: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsMode {
    None,
    SelfSigned,
    Cert,
}

impl std::str::FromStr for TlsMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(TlsMode::None),
            "self-signed" | "selfsigned" => Ok(TlsMode::SelfSigned),
            "cert" | "pem" => Ok(TlsMode::Cert),
            other => Err(format!(
                "Неизвестный режим TLS: {other}. Допустимые: none, self-signed, cert"
            )),
        }
    }
}

impl std::fmt::Display for TlsMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TlsMode::None => write!(f, "none"),
            TlsMode::SelfSigned => write!(f, "self-signed"),
            TlsMode::Cert => write!(f, "cert"),
        }
    }
}
