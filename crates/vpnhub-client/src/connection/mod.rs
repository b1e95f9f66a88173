//! Состояние VPN-подключения клиента.
//!
//! `Disconnected` → `Connecting` → `Connected` → `Disconnected`. Переход
//! `Connecting` → `Connected` происходит сам по истечении задержки и может
//! быть отменён вызовом `disconnect`.

mod controller;
mod sampler;

pub use controller::{ConnectionController, DEFAULT_SETTLE_DELAY};
pub use sampler::{LinkSample, LinkSampler, SyntheticSampler};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Снимок сессии для отображения клиентом.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ConnectionSnapshot {
    pub state: ConnectionState,
    /// Отсутствует в состоянии Disconnected
    pub server_id: Option<i32>,
    /// Заполняются только в состоянии Connected
    pub download_mbps: Option<f64>,
    pub upload_mbps: Option<f64>,
}

impl ConnectionSnapshot {
    fn connecting(server_id: i32) -> Self {
        Self {
            state: ConnectionState::Connecting,
            server_id: Some(server_id),
            download_mbps: None,
            upload_mbps: None,
        }
    }

    fn connected(server_id: i32, sample: LinkSample) -> Self {
        Self {
            state: ConnectionState::Connected,
            server_id: Some(server_id),
            download_mbps: Some(sample.download_mbps),
            upload_mbps: Some(sample.upload_mbps),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }
}
