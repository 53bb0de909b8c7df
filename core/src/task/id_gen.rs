use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

/// Issues `<prefix>-<unix millis>` ids for locally resolved tasks.
///
/// Ids stay unique within the process: when the clock has not moved past
/// the last issued value, the last value + 1 is used instead.
#[derive(Debug, Default)]
pub struct TimestampIdGenerator {
    last: AtomicI64,
}

impl TimestampIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self, prefix: &str) -> String {
        self.next_at(prefix, Utc::now().timestamp_millis())
    }

    pub fn next_at(&self, prefix: &str, now_ms: i64) -> String {
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now_ms.max(prev + 1);
            match self
                .last
                .compare_exchange_weak(prev, candidate, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return format!("{prefix}-{candidate}"),
                Err(actual) => prev = actual,
            }
        }
    }
}
