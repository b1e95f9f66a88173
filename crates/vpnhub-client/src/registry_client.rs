//! HTTP-клиент реестра VPN-серверов.
//!
//! Используется админкой (добавление, деактивация) и клиентским приложением
//! (список, подбор сервера, снимок для [`ConnectionController`]).
//!
//! [`ConnectionController`]: crate::connection::ConnectionController

use crate::catalog::RegistrySnapshot;
use crate::error::ClientError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use vpnhub_entities::ServerRecord;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Данные нового сервера. Незаданные поля реестр заполнит значениями по умолчанию.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ServerDraft {
    pub name: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub ip_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_type: Option<String>,
    pub config_data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ping_ms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bandwidth_mbps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_users: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    servers: Vec<ServerRecord>,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    server: ServerRecord,
}

#[derive(Debug, Deserialize)]
struct BestServerResponse {
    server: ServerRecord,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Clone)]
pub struct RegistryClient {
    http: reqwest::Client,
    base_url: String,
}

impl RegistryClient {
    /// `base_url`: адрес сервера реестра без `/api/v1`, например `http://127.0.0.1:3000`.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.base_url)
    }

    /// GET /api/v1/servers?active=...
    pub async fn list_servers(&self, active_only: bool) -> Result<Vec<ServerRecord>, ClientError> {
        let resp = self
            .http
            .get(self.url("/servers"))
            .query(&[("active", active_only.to_string())])
            .send()
            .await?;
        let list: ListResponse = decode(resp).await?;
        Ok(list.servers)
    }

    /// POST /api/v1/servers
    pub async fn create_server(&self, draft: &ServerDraft) -> Result<ServerRecord, ClientError> {
        let resp = self.http.post(self.url("/servers")).json(draft).send().await?;
        let created: CreateResponse = decode(resp).await?;
        tracing::info!("Сервер {} добавлен (id: {})", created.server.name, created.server.id);
        Ok(created.server)
    }

    /// DELETE /api/v1/servers?id=...
    pub async fn deactivate_server(&self, id: i32) -> Result<(), ClientError> {
        let resp = self
            .http
            .delete(self.url("/servers"))
            .query(&[("id", id)])
            .send()
            .await?;
        decode::<serde_json::Value>(resp).await?;
        Ok(())
    }

    /// POST /api/v1/best-server
    pub async fn best_server(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<ServerRecord, ClientError> {
        let resp = self
            .http
            .post(self.url("/best-server"))
            .json(&serde_json::json!({ "latitude": latitude, "longitude": longitude }))
            .send()
            .await?;
        let best: BestServerResponse = decode(resp).await?;
        Ok(best.server)
    }

    /// Снимок активных серверов для контроллера подключения.
    pub async fn snapshot(&self) -> Result<RegistrySnapshot, ClientError> {
        Ok(RegistrySnapshot::new(self.list_servers(true).await?))
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    let status = resp.status();
    let body = resp.bytes().await?;

    if !status.is_success() {
        let message = serde_json::from_slice::<ErrorBody>(&body)
            .map(|e| e.error)
            .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
        tracing::warn!("Реестр ответил {status}: {message}");
        return Err(ClientError::Api {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()))
}
