use std::time::Instant;

// Time source for rate limit windows
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

// Wall clock used by the running server
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[cfg(test)]
pub use manual::ManualClock;
