//! Ошибки клиента реестра и контроллера подключения.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Сеть недоступна или истёк таймаут.
    #[error("Ошибка соединения с реестром: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Реестр вернул {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Некорректный ответ реестра: {0}")]
    Decode(String),
}

impl ClientError {
    /// HTTP-статус ответа, если реестр ответил ошибкой.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Отказ в переходе; сессия остаётся в прежнем состоянии.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectError {
    #[error("Сервер {0} не найден или деактивирован")]
    InvalidServer(i32),

    #[error("connect вызван вне рантайма tokio")]
    NoRuntime,
}
