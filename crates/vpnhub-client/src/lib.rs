//! Клиентская часть VPN Hub: доступ к реестру и контроллер подключения.

pub mod catalog;
pub mod connection;
pub mod error;
pub mod registry_client;

pub use catalog::{RegistrySnapshot, ServerCatalog};
pub use connection::{ConnectionController, ConnectionSnapshot, ConnectionState};
pub use error::{ClientError, ConnectError};
pub use registry_client::{RegistryClient, ServerDraft};
