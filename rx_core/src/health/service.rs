//! Check sets, cache and authorization wired together for the three probe endpoints

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use super::aggregate::{summarize, HealthReport};
use super::check::HealthCheck;
use super::runner;
use crate::cache::ResponseCache;
use crate::config::{CacheConfig, HealthConfig};
use crate::error::Result;
use crate::middleware::authorization::Authorization;

pub const DEEP_CACHE_KEY: &str = "deep";

/// Which probe endpoint a request path maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Liveness,
    Readiness,
    Deep,
}

pub struct HealthService {
    liveness: Vec<Arc<dyn HealthCheck>>,
    readiness: Vec<Arc<dyn HealthCheck>>,
    deep_critical: Vec<Arc<dyn HealthCheck>>,
    deep_secondary: Vec<Arc<dyn HealthCheck>>,
    secondary_names: HashSet<String>,
    cache: ResponseCache<HealthReport>,
    authorization: Authorization,
    config: HealthConfig,
}

impl std::fmt::Debug for HealthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthService")
            .field("liveness", &self.liveness.len())
            .field("readiness", &self.readiness.len())
            .field("deep_critical", &self.deep_critical.len())
            .field("deep_secondary", &self.deep_secondary.len())
            .field("cache", &self.cache.strategy())
            .field("config", &self.config)
            .finish()
    }
}

impl HealthService {
    pub fn builder() -> HealthServiceBuilder {
        HealthServiceBuilder::default()
    }

    pub fn config(&self) -> &HealthConfig {
        &self.config
    }

    pub fn cache(&self) -> &ResponseCache<HealthReport> {
        &self.cache
    }

    pub fn authorization(&self) -> &Authorization {
        &self.authorization
    }

    pub fn endpoint_for(&self, path: &str) -> Option<Endpoint> {
        if path == self.config.liveness_path {
            Some(Endpoint::Liveness)
        } else if path == self.config.readiness_path {
            Some(Endpoint::Readiness)
        } else if path == self.config.deep_path {
            Some(Endpoint::Deep)
        } else {
            None
        }
    }

    /// A check is required unless it is registered as deep-secondary.
    pub fn is_required(&self, name: &str) -> bool {
        !self.secondary_names.contains(name)
    }

    pub async fn liveness(&self) -> HealthReport {
        self.check_set(&self.liveness).await
    }

    pub async fn readiness(&self) -> HealthReport {
        self.check_set(&self.readiness).await
    }

    /// Runs critical and secondary sets together, served from the cache while fresh.
    pub async fn deep(&self) -> HealthReport {
        let report = self
            .cache
            .cached(DEEP_CACHE_KEY, move || async move {
                debug!("Computing deep health report");
                let (critical, secondary) = tokio::join!(
                    runner::run(&self.deep_critical),
                    runner::run(&self.deep_secondary),
                );

                let is_required = |name: &str| self.is_required(name);
                HealthReport::deep(
                    summarize(&critical, is_required),
                    summarize(&secondary, is_required),
                )
            })
            .await;

        let stats = self.cache.stats();
        debug!(
            hits = stats.hits,
            misses = stats.misses,
            evictions = stats.evictions,
            hit_rate = stats.hit_rate(),
            "Deep report cache stats"
        );

        report
    }

    async fn check_set(&self, checks: &[Arc<dyn HealthCheck>]) -> HealthReport {
        let results = runner::run(checks).await;
        HealthReport::from_components(summarize(&results, |name| self.is_required(name)))
    }
}

#[derive(Default)]
pub struct HealthServiceBuilder {
    liveness: Vec<Arc<dyn HealthCheck>>,
    readiness: Vec<Arc<dyn HealthCheck>>,
    deep_critical: Vec<Arc<dyn HealthCheck>>,
    deep_secondary: Vec<Arc<dyn HealthCheck>>,
    authorization: Option<Authorization>,
    health_config: HealthConfig,
    cache_config: CacheConfig,
}

impl HealthServiceBuilder {
    pub fn liveness<T: HealthCheck + 'static>(mut self, check: T) -> Self {
        self.liveness.push(Arc::new(check));
        self
    }

    pub fn readiness<T: HealthCheck + 'static>(mut self, check: T) -> Self {
        self.readiness.push(Arc::new(check));
        self
    }

    pub fn deep_critical<T: HealthCheck + 'static>(mut self, check: T) -> Self {
        self.deep_critical.push(Arc::new(check));
        self
    }

    pub fn deep_secondary<T: HealthCheck + 'static>(mut self, check: T) -> Self {
        self.deep_secondary.push(Arc::new(check));
        self
    }

    /// Registers one shared check on both the liveness and readiness sets.
    pub fn liveness_and_readiness(mut self, check: Arc<dyn HealthCheck>) -> Self {
        self.liveness.push(Arc::clone(&check));
        self.readiness.push(check);
        self
    }

    /// Overrides the token-based authorization derived from the health config.
    pub fn authorization(mut self, authorization: Authorization) -> Self {
        self.authorization = Some(authorization);
        self
    }

    pub fn health_config(mut self, config: HealthConfig) -> Self {
        self.health_config = config;
        self
    }

    pub fn cache_config(mut self, config: CacheConfig) -> Self {
        self.cache_config = config;
        self
    }

    pub fn build(self) -> Result<HealthService> {
        self.health_config.validate()?;
        self.cache_config.validate()?;

        let cache = ResponseCache::from_config(&self.cache_config)?;
        let authorization = self
            .authorization
            .unwrap_or_else(|| Authorization::from_config(&self.health_config));

        let secondary_names = self
            .deep_secondary
            .iter()
            .map(|check| check.name().to_string())
            .collect();

        info!(
            "Checks: {} liveness, {} readiness, {} deep critical, {} deep secondary",
            self.liveness.len(),
            self.readiness.len(),
            self.deep_critical.len(),
            self.deep_secondary.len()
        );
        info!(
            "Deep report cache: {} (TTL: {:?})",
            cache.strategy(),
            cache.ttl()
        );

        Ok(HealthService {
            liveness: self.liveness,
            readiness: self.readiness,
            deep_critical: self.deep_critical,
            deep_secondary: self.deep_secondary,
            secondary_names,
            cache,
            authorization,
            config: self.health_config,
        })
    }
}
