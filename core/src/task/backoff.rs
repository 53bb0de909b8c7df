use std::time::Duration;

use crate::config::PollingConfig;

/// Multiplicative backoff between status polls.
///
/// The delay before attempt `n` (1-based) is `base * factor^(n-1)`, capped at
/// `max_delay`. Attempts past `max_attempts` get no delay, which ends polling.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    pub base_delay: Duration,
    pub factor: f64,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl BackoffPolicy {
    pub fn new(base_delay: Duration, factor: f64, max_delay: Duration, max_attempts: u32) -> Self {
        Self {
            base_delay,
            // A shrinking factor would make the sequence decrease.
            factor: if factor.is_finite() && factor >= 1.0 { factor } else { 1.0 },
            max_delay,
            max_attempts,
        }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let max_ms = self.max_delay.as_millis() as f64;
        let ms = (self.base_delay.as_millis() as f64 * self.factor.powi(exp)).min(max_ms);
        Duration::from_millis(ms.round() as u64)
    }

    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        Some(self.delay_for(attempt))
    }

    /// Upper bound on time spent sleeping across all attempts.
    pub fn total_budget(&self) -> Duration {
        (1..=self.max_attempts).map(|a| self.delay_for(a)).sum()
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from(&PollingConfig::default())
    }
}

impl From<&PollingConfig> for BackoffPolicy {
    fn from(cfg: &PollingConfig) -> Self {
        Self::new(
            Duration::from_millis(cfg.base_delay_ms),
            cfg.factor,
            Duration::from_millis(cfg.max_delay_ms),
            cfg.max_attempts,
        )
    }
}
