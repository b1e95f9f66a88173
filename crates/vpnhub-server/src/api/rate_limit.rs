//! Ограничение частоты запросов к API по IP клиента (фиксированное окно).

use crate::error::AppError;
use axum::extract::ConnectInfo;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Порог размера таблицы, после которого вычищаются истёкшие окна.
const PRUNE_THRESHOLD: usize = 1000;

struct Window {
    count: u32,
    started: Instant,
}

#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<Mutex<HashMap<String, Window>>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window,
        }
    }

    pub fn per_minute(max_requests: u32) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }

    /// Учесть запрос от `key`. false: лимит в текущем окне исчерпан.
    pub async fn check(&self, key: &str) -> bool {
        let mut windows = self.windows.lock().await;
        let now = Instant::now();

        if windows.len() > PRUNE_THRESHOLD {
            windows.retain(|_, w| now.duration_since(w.started) < self.window);
        }

        let window = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            started: now,
        });

        if now.duration_since(window.started) >= self.window {
            window.count = 0;
            window.started = now;
        }

        window.count += 1;
        window.count <= self.max_requests
    }
}

/// Middleware: 429 при превышении лимита.
pub async fn rate_limit_middleware(
    rate_limiter: RateLimiter,
    req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let ip = client_ip(&req);

    if !rate_limiter.check(&ip).await {
        tracing::warn!("Превышен лимит запросов для IP: {ip}");
        return Err(AppError::TooManyRequests);
    }

    Ok(next.run(req).await)
}

/// IP клиента: первый адрес из X-Forwarded-For, иначе адрес соединения.
pub fn client_ip<B>(req: &Request<B>) -> String {
    req.headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ci| ci.0.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}
