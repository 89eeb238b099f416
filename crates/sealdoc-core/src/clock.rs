//! Ledger time.
//!
//! Timestamps on document records come from a [`LedgerClock`]. The clock
//! reads a [`TimeSource`] but never hands out a value less than or equal to
//! the previous one, so successive mutations always carry strictly
//! increasing times even within the same millisecond.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// A source of wall-clock milliseconds.
pub trait TimeSource: Send + Sync {
    /// Current time in Unix milliseconds.
    fn now_millis(&self) -> i64;
}

/// Reads the system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_millis(&self) -> i64 {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// A time source that only moves when told to. For tests.
#[derive(Debug, Default)]
pub struct ManualTimeSource(AtomicI64);

impl ManualTimeSource {
    /// Start at the given time.
    pub fn new(start: i64) -> Self {
        Self(AtomicI64::new(start))
    }

    /// Move the clock forward.
    pub fn advance(&self, millis: i64) {
        self.0.fetch_add(millis, Ordering::SeqCst);
    }

    /// Jump to an absolute time (may go backwards).
    pub fn set(&self, millis: i64) {
        self.0.store(millis, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now_millis(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Strictly monotonic ledger clock.
pub struct LedgerClock {
    source: Arc<dyn TimeSource>,
    last: i64,
}

impl LedgerClock {
    /// Create a clock over a time source.
    pub fn new(source: Arc<dyn TimeSource>) -> Self {
        Self {
            source,
            last: i64::MIN,
        }
    }

    /// A clock over the system time.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemTimeSource))
    }

    /// Continue after a previously committed timestamp.
    pub fn resume_after(mut self, last: i64) -> Self {
        self.last = self.last.max(last);
        self
    }

    /// The last timestamp handed out, if any.
    pub fn last(&self) -> Option<i64> {
        (self.last != i64::MIN).then_some(self.last)
    }

    /// Produce the next ledger timestamp.
    pub fn tick(&mut self) -> i64 {
        let now = self.source.now_millis();
        self.last = if self.last == i64::MIN {
            now
        } else {
            now.max(self.last + 1)
        };
        self.last
    }
}

impl std::fmt::Debug for LedgerClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerClock").field("last", &self.last()).finish()
    }
}
