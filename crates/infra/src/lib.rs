//! Infrastructure layer: storage adapters, configuration, service wiring.

pub mod config;
pub mod memory;
pub mod postgres;
pub mod services;

pub use config::{ConfigError, InfraConfig};
pub use services::{InMemoryServices, InMemoryStores, PostgresServices, Services, postgres_services};
