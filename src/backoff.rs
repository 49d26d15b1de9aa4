use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_ERROR_BACKOFFS: [u64; 3] = [10, 20, 30];

/// Delay between failed reconciliation attempts of one object.
///
/// The n-th consecutive failure waits `schedule[n]`; once the schedule is
/// exhausted the last entry repeats.
pub struct ErrorBackoff {
    schedule: Vec<Duration>,
    attempts: Mutex<HashMap<String, usize>>,
}

impl ErrorBackoff {
    pub fn new(schedule: Vec<Duration>) -> Result<Self> {
        if schedule.is_empty() {
            return Err(Error::InvalidConfig(
                "error back-off schedule is empty".to_string(),
            ));
        }
        if schedule.iter().any(Duration::is_zero) {
            return Err(Error::InvalidConfig(
                "error back-off delays must be positive".to_string(),
            ));
        }
        Ok(Self {
            schedule,
            attempts: Mutex::new(HashMap::new()),
        })
    }

    pub fn schedule(&self) -> &[Duration] {
        &self.schedule
    }

    pub fn delay_for(&self, attempt: usize) -> Duration {
        let last = self.schedule.len() - 1;
        self.schedule[attempt.min(last)]
    }

    /// Records a failure for `key` and returns how long to wait before retrying.
    pub fn next_delay(&self, key: &str) -> Duration {
        let mut attempts = self.attempts.lock();
        let attempt = attempts.entry(key.to_string()).or_insert(0);
        let delay = self.delay_for(*attempt);
        *attempt += 1;
        delay
    }

    pub fn attempts(&self, key: &str) -> usize {
        self.attempts.lock().get(key).copied().unwrap_or(0)
    }

    pub fn reset(&self, key: &str) {
        self.attempts.lock().remove(key);
    }

    /// Number of objects with at least one recorded failure.
    pub fn tracked(&self) -> usize {
        self.attempts.lock().len()
    }

    /// Forgets every object for which `live` returns false.
    pub fn retain(&self, mut live: impl FnMut(&str) -> bool) {
        self.attempts.lock().retain(|key, _| live(key));
    }
}

impl Default for ErrorBackoff {
    fn default() -> Self {
        Self {
            schedule: DEFAULT_ERROR_BACKOFFS
                .iter()
                .map(|s| Duration::from_secs(*s))
                .collect(),
            attempts: Mutex::new(HashMap::new()),
        }
    }
}
