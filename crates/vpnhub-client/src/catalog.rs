//! Снимок реестра, с которым сверяется контроллер подключения.

use vpnhub_entities::ServerRecord;

/// Источник сведений о серверах для контроллера подключения.
pub trait ServerCatalog: Send + Sync {
    fn find(&self, id: i32) -> Option<ServerRecord>;
}

/// Список серверов, полученный от реестра в один момент времени.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    servers: Vec<ServerRecord>,
}

impl RegistrySnapshot {
    pub fn new(servers: Vec<ServerRecord>) -> Self {
        Self { servers }
    }

    pub fn servers(&self) -> &[ServerRecord] {
        &self.servers
    }

    /// Активные серверы в порядке реестра.
    pub fn active(&self) -> impl Iterator<Item = &ServerRecord> {
        self.servers.iter().filter(|s| s.is_active)
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

impl ServerCatalog for RegistrySnapshot {
    fn find(&self, id: i32) -> Option<ServerRecord> {
        self.servers.iter().find(|s| s.id == id).cloned()
    }
}
