//! Millisecond time sources for recording and playback.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

pub trait Clock: Send + Sync {
    /// Monotonic milliseconds since an arbitrary origin
    fn now_ms(&self) -> u64;
}

/// Wall clock backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Clock that only moves when told to. Hosts with their own frame counter and
/// tests use this to control elapsed time exactly.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Pausable elapsed-time counter driven by explicit clock readings.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stopwatch {
    started_at: Option<u64>,
    accumulated: u64,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero the counter and start running
    pub fn restart(&mut self, now: u64) {
        self.accumulated = 0;
        self.started_at = Some(now);
    }

    /// Continue counting from the frozen value
    pub fn resume(&mut self, now: u64) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    /// Freeze the counter at its current value
    pub fn stop(&mut self, now: u64) {
        if let Some(start) = self.started_at.take() {
            self.accumulated += now.saturating_sub(start);
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn elapsed(&self, now: u64) -> u64 {
        match self.started_at {
            Some(start) => self.accumulated + now.saturating_sub(start),
            None => self.accumulated,
        }
    }
}
