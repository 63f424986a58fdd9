use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cache::CacheStrategy;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub health: HealthConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    pub liveness_path: String,
    pub readiness_path: String,
    pub deep_path: String,
    /// Shared secret compared against the `Authorization` header on the deep
    /// endpoint. Unset means the deep endpoint is open.
    #[serde(default)]
    pub authorization_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub strategy: CacheStrategy,
    pub ttl_seconds: u64,
    pub max_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            liveness_path: "/liveness".to_string(),
            readiness_path: "/readiness".to_string(),
            deep_path: "/deep".to_string(),
            authorization_token: None,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            strategy: CacheStrategy::Lru,
            ttl_seconds: 5,
            max_size: 16,
        }
    }
}

impl HealthConfig {
    pub fn paths(&self) -> [&str; 3] {
        [
            self.liveness_path.as_str(),
            self.readiness_path.as_str(),
            self.deep_path.as_str(),
        ]
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let paths = self.paths();

        for path in paths {
            if path.is_empty() {
                return Err(ConfigError::Message(
                    "Health check paths cannot be empty".to_string(),
                ));
            }
            if !path.starts_with('/') {
                return Err(ConfigError::Message(format!(
                    "Health check path '{}' must start with '/'",
                    path
                )));
            }
        }

        if paths[0] == paths[1] || paths[0] == paths[2] || paths[1] == paths[2] {
            return Err(ConfigError::Message(
                "Liveness, readiness and deep paths must be distinct".to_string(),
            ));
        }

        if matches!(&self.authorization_token, Some(token) if token.is_empty()) {
            return Err(ConfigError::Message(
                "Authorization token cannot be empty when set".to_string(),
            ));
        }

        Ok(())
    }
}

impl CacheConfig {
    pub fn disabled() -> Self {
        Self {
            strategy: CacheStrategy::None,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.strategy == CacheStrategy::None {
            return Ok(());
        }

        if self.ttl_seconds == 0 {
            return Err(ConfigError::Message(
                "Cache TTL must be greater than 0".to_string(),
            ));
        }

        if self.strategy == CacheStrategy::Lru && self.max_size == 0 {
            return Err(ConfigError::Message(
                "Cache max size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?);

        if Path::new("config.toml").exists() {
            builder = builder.add_source(File::with_name("config"));
        }

        Self::finish(builder)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(File::from(path.as_ref()));

        Self::finish(builder)
    }

    fn finish(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        let config = builder
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app_config: AppConfig = config.try_deserialize()?;

        app_config.validate()?;

        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port cannot be 0".to_string()));
        }

        self.health.validate()?;
        self.cache.validate()?;

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
