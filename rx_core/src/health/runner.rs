//! Concurrent execution of a check set

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join_all;
use futures_util::FutureExt;
use tracing::{debug, error, warn};

use super::check::{CheckResult, HealthCheck};

/// Runs every check on its own task and waits for all of them.
///
/// Results come back in input order. A check that panics, or whose task is
/// torn down, is reported as a failing result instead of aborting the batch.
/// There is no timeout: a hanging check holds up the whole call.
pub async fn run(checks: &[Arc<dyn HealthCheck>]) -> Vec<CheckResult> {
    if checks.is_empty() {
        return Vec::new();
    }

    debug!("Running {} health checks", checks.len());

    let handles: Vec<_> = checks
        .iter()
        .map(|check| {
            let check = Arc::clone(check);
            tokio::spawn(async move { execute(check).await })
        })
        .collect();

    join_all(handles)
        .await
        .into_iter()
        .zip(checks)
        .map(|(joined, check)| match joined {
            Ok(result) => result,
            Err(e) => {
                error!("Health check '{}' task failed: {}", check.name(), e);
                CheckResult::failed(check.name(), format!("check task failed: {}", e))
            }
        })
        .collect()
}

async fn execute(check: Arc<dyn HealthCheck>) -> CheckResult {
    let start = Instant::now();
    let outcome = AssertUnwindSafe(check.check()).catch_unwind().await;
    let elapsed = start.elapsed();

    let result = match outcome {
        Ok(result) if result.has_timing() => result,
        Ok(result) => result.with_timing(elapsed),
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            error!("Health check '{}' panicked: {}", check.name(), message);
            CheckResult::new(check.name(), false, elapsed, format!("check panicked: {}", message))
        }
    };

    if result.ok() {
        debug!("Health check '{}' passed in {:?}", result.name(), result.timing());
    } else {
        warn!(
            "Health check '{}' failed in {:?}: {}",
            result.name(),
            result.timing(),
            result.message()
        );
    }

    result
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
