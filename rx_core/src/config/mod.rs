//! Layered configuration: defaults, optional `config.toml`, then `APP__*` environment variables.

pub mod settings;

pub use settings::{AppConfig, CacheConfig, HealthConfig, ServerConfig};
