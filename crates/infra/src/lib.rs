//! Infrastructure layer: stores, application services, config, bootstrap.

pub mod auth_service;
pub mod bootstrap;
pub mod config;
pub mod deadline;
pub mod error;
pub mod inventory_service;
pub mod store;

pub use auth_service::Authenticator;
pub use bootstrap::{AdminSeed, ensure_admin};
pub use config::{AppConfig, ConfigError};
pub use error::ServiceError;
pub use inventory_service::InventoryService;
pub use store::{CredentialStore, InMemoryCredentialStore, InMemoryInventoryStore, InventoryStore, StoreError};
#[cfg(feature = "postgres")]
pub use store::postgres::{PostgresCredentialStore, PostgresInventoryStore, connect, migrate};
