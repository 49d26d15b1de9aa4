use crate::backoff::DEFAULT_ERROR_BACKOFFS;
use crate::error::{Error, Result};
use std::time::Duration;

pub const DEFAULT_FINALIZER: &str = "mysqls.otus.homework/finalizer";
pub const DEFAULT_FIELD_MANAGER: &str = "mysql-operator";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperatorConfig {
    /// Namespace to watch; `None` watches all namespaces.
    pub namespace: Option<String>,
    pub finalizer: String,
    pub field_manager: String,
    pub error_backoffs: Vec<Duration>,
    /// Periodic requeue after a successful pass; `None` waits for a change.
    pub requeue_after: Option<Duration>,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            finalizer: DEFAULT_FINALIZER.to_string(),
            field_manager: DEFAULT_FIELD_MANAGER.to_string(),
            error_backoffs: DEFAULT_ERROR_BACKOFFS
                .iter()
                .map(|s| Duration::from_secs(*s))
                .collect(),
            requeue_after: None,
        }
    }
}

impl OperatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespace(mut self, ns: impl Into<String>) -> Self {
        let ns = ns.into();
        self.namespace = if ns.is_empty() { None } else { Some(ns) };
        self
    }

    pub fn finalizer(mut self, name: impl Into<String>) -> Self {
        self.finalizer = name.into();
        self
    }

    pub fn field_manager(mut self, name: impl Into<String>) -> Self {
        self.field_manager = name.into();
        self
    }

    pub fn error_backoffs(mut self, delays: Vec<Duration>) -> Self {
        self.error_backoffs = delays;
        self
    }

    pub fn requeue_after(mut self, duration: Duration) -> Self {
        self.requeue_after = if duration.is_zero() {
            None
        } else {
            Some(duration)
        };
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.finalizer.trim().is_empty() {
            return Err(Error::InvalidConfig("finalizer must not be empty".to_string()));
        }
        if self.field_manager.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "field manager must not be empty".to_string(),
            ));
        }
        if self.error_backoffs.is_empty() {
            return Err(Error::InvalidConfig(
                "error back-off schedule is empty".to_string(),
            ));
        }
        if self.error_backoffs.iter().any(Duration::is_zero) {
            return Err(Error::InvalidConfig(
                "error back-off delays must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parses a comma-separated list of delays in seconds, e.g. `10,20,30`.
pub fn parse_backoffs(value: &str) -> Result<Vec<Duration>> {
    let delays = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| Error::InvalidConfig(format!("invalid back-off delay '{s}'")))
        })
        .collect::<Result<Vec<_>>>()?;

    if delays.is_empty() {
        return Err(Error::InvalidConfig(
            "error back-off schedule is empty".to_string(),
        ));
    }
    Ok(delays)
}
