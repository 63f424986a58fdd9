//! Probe abstraction and the immutable result every probe produces

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use async_trait::async_trait;

/// Outcome of a single check invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    name: String,
    ok: bool,
    duration: Option<Duration>,
    message: String,
}

impl CheckResult {
    pub fn new(
        name: impl Into<String>,
        ok: bool,
        duration: Duration,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            ok,
            duration: Some(duration),
            message: message.into(),
        }
    }

    /// A passing result with no timing of its own; the runner fills it in.
    pub fn passed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ok: true,
            duration: None,
            message: String::new(),
        }
    }

    /// A failing result with no timing of its own; the runner fills it in.
    pub fn failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ok: false,
            duration: None,
            message: message.into(),
        }
    }

    /// Times a fallible probe and folds its outcome into a result.
    ///
    /// `Ok(false)` and `Err(_)` both fail; the error text becomes the message.
    pub async fn from_probe<Fut>(name: impl Into<String>, probe: Fut) -> Self
    where
        Fut: Future<Output = anyhow::Result<bool>>,
    {
        let name = name.into();
        let start = Instant::now();
        let outcome = probe.await;
        let elapsed = start.elapsed();

        match outcome {
            Ok(true) => Self::new(name, true, elapsed, ""),
            Ok(false) => Self::new(name, false, elapsed, "check reported failure"),
            Err(e) => Self::new(name, false, elapsed, format!("{:#}", e)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ok(&self) -> bool {
        self.ok
    }

    pub fn timing(&self) -> Duration {
        self.duration.unwrap_or_default()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn has_timing(&self) -> bool {
        self.duration.is_some()
    }

    pub(crate) fn with_timing(self, duration: Duration) -> Self {
        Self {
            duration: Some(duration),
            ..self
        }
    }
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    fn name(&self) -> &str;
    async fn check(&self) -> CheckResult;
}

type ProbeFuture = Pin<Box<dyn Future<Output = anyhow::Result<bool>> + Send>>;

/// Check backed by an async closure.
pub struct FnCheck {
    name: String,
    probe: Box<dyn Fn() -> ProbeFuture + Send + Sync>,
}

impl FnCheck {
    pub fn new<F, Fut>(name: impl Into<String>, probe: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<bool>> + Send + 'static,
    {
        Self {
            name: name.into(),
            probe: Box::new(move || -> ProbeFuture { Box::pin(probe()) }),
        }
    }
}

impl std::fmt::Debug for FnCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnCheck").field("name", &self.name).finish()
    }
}

#[async_trait]
impl HealthCheck for FnCheck {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> CheckResult {
        CheckResult::from_probe(self.name.clone(), (self.probe)()).await
    }
}
