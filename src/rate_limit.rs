use dashmap::DashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;
use crate::clock::Clock;

// Rate limit window - tracks requests per client identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientWindow {
    pub count: u32,
    pub window_start: Instant,
}

impl ClientWindow {
    pub fn new(now: Instant) -> Self {
        Self {
            count: 0,
            window_start: now,
        }
    }

    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.window_start)
    }

    pub fn is_expired(&self, now: Instant, window: Duration) -> bool {
        self.age(now) > window
    }
}

/// Storage for per-client windows.
///
/// Implementations only need to be safe for concurrent use; the
/// read-check-write sequence is serialized by [`AdmissionController`].
pub trait WindowStore: Send + Sync {
    fn get(&self, client: &str) -> Option<ClientWindow>;
    fn put(&self, client: &str, window: ClientWindow);
    /// Drops every window older than `window`, returns how many were removed.
    fn sweep(&self, now: Instant, window: Duration) -> usize;
    fn len(&self) -> usize;
}

// In-process store, lost on restart
#[derive(Default)]
pub struct MemoryWindowStore {
    windows: DashMap<String, ClientWindow>,
}

impl WindowStore for MemoryWindowStore {
    fn get(&self, client: &str) -> Option<ClientWindow> {
        self.windows.get(client).map(|entry| *entry)
    }

    fn put(&self, client: &str, window: ClientWindow) {
        self.windows.insert(client.to_string(), window);
    }

    fn sweep(&self, now: Instant, window: Duration) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, entry| !entry.is_expired(now, window));
        before.saturating_sub(self.windows.len())
    }

    fn len(&self) -> usize {
        self.windows.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted { remaining: u32 },
    Limited { retry_after: u64 },
}

// Fixed-window limiter keyed by client identifier
pub struct AdmissionController {
    store: Arc<dyn WindowStore>,
    clock: Arc<dyn Clock>,
    max_requests: u32,
    window: Duration,
    lock: Mutex<()>,
}

impl AdmissionController {
    pub fn new(
        store: Arc<dyn WindowStore>,
        clock: Arc<dyn Clock>,
        max_requests: u32,
        window: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            max_requests,
            window,
            lock: Mutex::new(()),
        }
    }

    pub fn check(&self, client: &str) -> Admission {
        // the guard protects no data, a poisoned lock is still usable
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let now = self.clock.now();

        let swept = self.store.sweep(now, self.window);
        if swept > 0 {
            debug!(swept, "evicted expired rate limit windows");
        }

        let mut entry = self
            .store
            .get(client)
            .unwrap_or_else(|| ClientWindow::new(now));

        // window expired..? Reset it
        if entry.is_expired(now, self.window) {
            entry = ClientWindow::new(now);
        }

        if entry.count >= self.max_requests {
            return Admission::Limited {
                retry_after: retry_after_secs(self.window, entry.age(now)),
            };
        }

        entry.count += 1;
        self.store.put(client, entry);

        Admission::Admitted {
            remaining: self.max_requests - entry.count,
        }
    }

    pub fn tracked_clients(&self) -> usize {
        self.store.len()
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

// Whole seconds until the window resets, never less than one
fn retry_after_secs(window: Duration, age: Duration) -> u64 {
    let remaining_ms = window.saturating_sub(age).as_millis();
    let secs = remaining_ms.div_ceil(1000);
    u64::try_from(secs).unwrap_or(u64::MAX).max(1)
}
