//! Wait configuration, cancellation, and the shared condvar wait loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, MutexGuard};

// ── WaitConfig ────────────────────────────────────────────────────────────────

/// Timing parameters for blocking acquisitions.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WaitConfig {
    /// Upper bound on how long a waiter sleeps before re-checking its
    /// cancellation token.  Releases wake waiters immediately regardless.
    pub poll_interval: Duration,
    /// Default time a blocking acquisition may wait before giving up.
    pub timeout: Duration,
}

impl WaitConfig {
    pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);
    pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(30);
    pub const MIN_TIMEOUT: Duration = Duration::from_millis(10);
    pub const MAX_TIMEOUT: Duration = Duration::from_secs(3_600);

    /// Build a config, clamping both values into their allowed ranges.
    pub fn new(poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            poll_interval: poll_interval.clamp(Self::MIN_POLL_INTERVAL, Self::MAX_POLL_INTERVAL),
            timeout: timeout.clamp(Self::MIN_TIMEOUT, Self::MAX_TIMEOUT),
        }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self::new(self.poll_interval, timeout)
    }

    pub fn with_poll_interval(self, poll_interval: Duration) -> Self {
        Self::new(poll_interval, self.timeout)
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(10),
            timeout: Duration::from_secs(10),
        }
    }
}

// ── CancelToken ───────────────────────────────────────────────────────────────

/// Cloneable, one-way cancellation flag shared between a waiter and whoever
/// may want to abort it.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

// ── Wait loop ─────────────────────────────────────────────────────────────────

/// Block on `cond` until `ready` returns `true`, the timeout elapses, or
/// `cancel` fires.  Returns whether `ready` was satisfied.
///
/// `ready` runs with the lock held, so it may also claim the resource.
pub(crate) fn wait_until<T, F>(
    cond: &Condvar,
    guard: &mut MutexGuard<'_, T>,
    timeout: Duration,
    poll_interval: Duration,
    cancel: Option<&CancelToken>,
    mut ready: F,
) -> bool
where
    F: FnMut(&mut T) -> bool,
{
    let deadline = Instant::now() + timeout;
    loop {
        if cancel.is_some_and(CancelToken::is_cancelled) {
            return false;
        }
        if ready(&mut **guard) {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        cond.wait_for(guard, (deadline - now).min(poll_interval));
    }
}
