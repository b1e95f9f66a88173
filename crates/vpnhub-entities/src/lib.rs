//! SeaORM-сущности реестра VPN-серверов.

pub mod vpn_servers;

/// Запись реестра в том виде, в каком её отдаёт API.
pub type ServerRecord = vpn_servers::Model;
