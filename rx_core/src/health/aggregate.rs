//! Folding check results into components and an overall verdict

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use super::check::CheckResult;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
    Error,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Ok => "ok",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Error => "error",
        }
    }

    /// Degraded still counts as serving; only `Error` is a failure.
    pub fn is_success(&self) -> bool {
        !matches!(self, HealthStatus::Error)
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-check summary exposed in the response payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub name: String,
    pub alive: bool,
    /// Elapsed time in milliseconds.
    pub duration: f64,
    pub required: bool,
    pub message: Option<String>,
}

impl Component {
    pub fn from_result(result: &CheckResult, required: bool) -> Self {
        let message = if result.ok() || result.message().is_empty() {
            None
        } else {
            Some(result.message().to_string())
        };

        Self {
            name: result.name().to_string(),
            alive: result.ok(),
            duration: result.timing().as_secs_f64() * 1000.0,
            required,
            message,
        }
    }
}

#[derive(Serialize)]
struct ComponentDetails<'a> {
    alive: bool,
    duration: f64,
    required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
}

// Rendered as a single-key object: {"<name>": {"alive": .., "duration": .., "required": ..}}
impl Serialize for Component {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(
            &self.name,
            &ComponentDetails {
                alive: self.alive,
                duration: self.duration,
                required: self.required,
                message: self.message.as_deref(),
            },
        )?;
        map.end()
    }
}

pub fn summarize<F>(results: &[CheckResult], is_required: F) -> Vec<Component>
where
    F: Fn(&str) -> bool,
{
    results
        .iter()
        .map(|result| Component::from_result(result, is_required(result.name())))
        .collect()
}

/// Binary verdict used by liveness and readiness. Empty input is `Ok`.
pub fn overall_status(components: &[Component]) -> HealthStatus {
    if components.iter().all(|component| component.alive) {
        HealthStatus::Ok
    } else {
        HealthStatus::Error
    }
}

/// Critical failure dominates; secondary failure only downgrades to `Degraded`.
pub fn deep_status(critical: &[Component], secondary: &[Component]) -> HealthStatus {
    match (overall_status(critical), overall_status(secondary)) {
        (HealthStatus::Error, _) => HealthStatus::Error,
        (_, HealthStatus::Error) => HealthStatus::Degraded,
        _ => HealthStatus::Ok,
    }
}

/// Status plus the ordered component list behind it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    #[serde(rename = "integrations")]
    pub components: Vec<Component>,
}

impl HealthReport {
    pub fn from_components(components: Vec<Component>) -> Self {
        Self {
            status: overall_status(&components),
            components,
        }
    }

    pub fn deep(critical: Vec<Component>, secondary: Vec<Component>) -> Self {
        let status = deep_status(&critical, &secondary);
        let mut components = critical;
        components.extend(secondary);

        Self { status, components }
    }

    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|component| component.name == name)
    }
}
