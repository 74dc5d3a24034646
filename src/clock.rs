use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

/// Source of "now" in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

pub type SharedClock = Arc<dyn Clock>;

#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => elapsed.as_millis() as u64,
            // System clock set before 1970
            Err(_) => 0,
        }
    }
}

#[cfg(test)]
pub use manual::ManualClock;
