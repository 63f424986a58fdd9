pub mod aggregate;
pub mod check;
pub mod runner;
pub mod service;


pub use aggregate::{deep_status, overall_status, summarize, Component, HealthReport, HealthStatus};
pub use check::{CheckResult, FnCheck, HealthCheck};
pub use runner::run;
pub use service::{Endpoint, HealthService, HealthServiceBuilder, DEEP_CACHE_KEY};
