use super::sampler::{LinkSampler, SyntheticSampler};
use super::{ConnectionSnapshot, ConnectionState};
use crate::catalog::ServerCatalog;
use crate::error::ConnectError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use vpnhub_entities::ServerRecord;

/// Задержка между `Connecting` и `Connected`.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1500);

struct Session {
    snapshot: ConnectionSnapshot,
    /// Растёт при каждом connect/disconnect; отложенный переход сверяет его
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

struct Shared {
    session: Mutex<Session>,
    state_tx: watch::Sender<ConnectionSnapshot>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, session: &Session) {
        self.state_tx.send_replace(session.snapshot.clone());
    }

    /// Завершить подключение, если оно не было отменено.
    fn settle(&self, generation: u64, server: &ServerRecord, sampler: &dyn LinkSampler) {
        let mut session = self.lock();
        if session.generation != generation || session.snapshot.state != ConnectionState::Connecting
        {
            return;
        }

        let sample = sampler.sample(server);
        session.snapshot = ConnectionSnapshot::connected(server.id, sample);
        session.pending = None;
        self.publish(&session);
        info!(
            "Подключено к {} (id: {}): ↓{} / ↑{} Мбит/с",
            server.name, server.id, sample.download_mbps, sample.upload_mbps
        );
    }
}

/// Контроллер одной клиентской сессии.
///
/// Блокировки удерживаются только на время смены состояния.
/// `connect` порождает задачу tokio; вне рантайма он возвращает
/// [`ConnectError::NoRuntime`] и состояние не меняет.
pub struct ConnectionController {
    shared: Arc<Shared>,
    catalog: RwLock<Arc<dyn ServerCatalog>>,
    sampler: Arc<dyn LinkSampler>,
    settle_delay: Duration,
}

impl ConnectionController {
    pub fn new(catalog: Arc<dyn ServerCatalog>) -> Self {
        let (state_tx, _) = watch::channel(ConnectionSnapshot::default());
        Self {
            shared: Arc::new(Shared {
                session: Mutex::new(Session {
                    snapshot: ConnectionSnapshot::default(),
                    generation: 0,
                    pending: None,
                }),
                state_tx,
            }),
            catalog: RwLock::new(catalog),
            sampler: Arc::new(SyntheticSampler::default()),
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    pub fn with_sampler(mut self, sampler: Arc<dyn LinkSampler>) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Текущее состояние сессии.
    pub fn snapshot(&self) -> ConnectionSnapshot {
        self.shared.lock().snapshot.clone()
    }

    /// Подписка на изменения состояния.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionSnapshot> {
        self.shared.state_tx.subscribe()
    }

    /// Заменить каталог серверов (например, после обновления снимка реестра).
    /// Текущая сессия не затрагивается.
    pub fn replace_catalog(&self, catalog: Arc<dyn ServerCatalog>) {
        *self.catalog.write().unwrap_or_else(PoisonError::into_inner) = catalog;
    }

    fn lookup(&self, server_id: i32) -> Option<ServerRecord> {
        self.catalog
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .find(server_id)
    }

    /// Начать подключение к серверу.
    ///
    /// Вне состояния `Disconnected` ничего не делает и возвращает текущий снимок.
    /// Неизвестный или деактивированный сервер: [`ConnectError::InvalidServer`].
    /// При любой ошибке состояние не меняется и подписчики ничего не получают.
    pub fn connect(&self, server_id: i32) -> Result<ConnectionSnapshot, ConnectError> {
        let mut session = self.shared.lock();
        if session.snapshot.state != ConnectionState::Disconnected {
            debug!(
                "connect({server_id}) проигнорирован: состояние {:?}",
                session.snapshot.state
            );
            return Ok(session.snapshot.clone());
        }

        let server = self
            .lookup(server_id)
            .filter(|s| s.is_active)
            .ok_or(ConnectError::InvalidServer(server_id))?;
        let runtime = Handle::try_current().map_err(|_| ConnectError::NoRuntime)?;

        session.generation += 1;
        let generation = session.generation;
        session.snapshot = ConnectionSnapshot::connecting(server_id);
        self.shared.publish(&session);
        info!("Подключение к {} ({}:{})...", server.name, server.ip_address, server.port);

        let shared = Arc::clone(&self.shared);
        let sampler = Arc::clone(&self.sampler);
        let delay = self.settle_delay;
        session.pending = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            shared.settle(generation, &server, sampler.as_ref());
        }));

        Ok(session.snapshot.clone())
    }

    /// Отключиться. Незавершённое подключение отменяется и не доходит до `Connected`.
    pub fn disconnect(&self) -> ConnectionSnapshot {
        let mut session = self.shared.lock();
        if session.snapshot.state == ConnectionState::Disconnected {
            return session.snapshot.clone();
        }

        session.generation += 1;
        if let Some(task) = session.pending.take() {
            task.abort();
        }
        let previous = session.snapshot.server_id;
        session.snapshot = ConnectionSnapshot::default();
        self.shared.publish(&session);
        info!("Отключено от сервера {previous:?}");

        session.snapshot.clone()
    }
}

impl Drop for ConnectionController {
    fn drop(&mut self) {
        if let Some(task) = self.shared.lock().pending.take() {
            task.abort();
        }
    }
}
