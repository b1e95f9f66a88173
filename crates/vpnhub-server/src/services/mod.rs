pub mod admin_service;
pub mod registry_service;
pub mod selection_service;
