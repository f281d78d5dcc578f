//! `RwLockSet` — reader/writer locks keyed by resource id.
//!
//! Rules, per resource id:
//!
//! 1. Readers do not block readers.
//! 2. Readers block writers: a writer waits for active readers to finish.
//! 3. A writer blocks new readers: read acquisition fails while the
//!    exclusive lock is held, including while the writer is still draining.
//! 4. Writers block writers.
//!
//! There is no fairness between waiting readers and writers: a steady stream
//! of readers can keep a writer draining until its timeout.

use std::hash::Hash;
use std::time::{Duration, Instant};

use log::warn;

use crate::mutex_set::MutexSet;
use crate::semaphore_set::SemaphoreSet;
use crate::wait::{CancelToken, WaitConfig};

pub struct RwLockSet<K> {
    reads: SemaphoreSet<K>,
    writes: MutexSet<K>,
    config: WaitConfig,
}

impl<K: Eq + Hash + Clone> RwLockSet<K> {
    /// Unbounded readers per resource.
    pub fn new() -> Self {
        Self::with_config(usize::MAX, WaitConfig::default())
    }

    pub fn with_config(max_readers: usize, config: WaitConfig) -> Self {
        Self {
            reads: SemaphoreSet::with_config(max_readers, config),
            writes: MutexSet::with_config(config),
            config,
        }
    }

    pub fn config(&self) -> WaitConfig {
        self.config
    }

    // ── Readers ───────────────────────────────────────────────────────────

    pub fn try_acquire_read(&self, id: K) -> bool {
        !self.writes.is_locked(&id) && self.reads.try_acquire(id)
    }

    /// Wait for a reader slot.  Fails immediately, without waiting, if a
    /// writer currently holds `id`.
    pub fn acquire_read_or_wait(&self, id: K, cancel: Option<&CancelToken>) -> bool {
        if self.writes.is_locked(&id) {
            return false;
        }
        self.reads.acquire_or_wait(id, cancel)
    }

    pub fn release_read(&self, id: &K) -> bool {
        self.reads.release(id)
    }

    pub fn reader_count(&self, id: &K) -> usize {
        self.reads.count(id)
    }

    // ── Writers ───────────────────────────────────────────────────────────

    /// Take the write lock only if nobody is reading or writing `id`.
    pub fn try_acquire_write(&self, id: K) -> bool {
        if self.reads.is_used(&id) || !self.writes.try_acquire(id.clone()) {
            return false;
        }
        // A reader may have slipped in between the two checks.
        if self.reads.is_used(&id) {
            self.writes.release(&id);
            return false;
        }
        true
    }

    /// Take the exclusive lock, then wait for active readers to drain.
    ///
    /// Both steps share one timeout budget.  If draining does not finish in
    /// time the exclusive lock is given back and `false` is returned.
    pub fn acquire_write_or_wait(&self, id: K, cancel: Option<&CancelToken>) -> bool {
        self.acquire_write_or_wait_for(id, self.config.timeout, cancel)
    }

    pub fn acquire_write_or_wait_for(
        &self,
        id: K,
        timeout: Duration,
        cancel: Option<&CancelToken>,
    ) -> bool {
        let start = Instant::now();
        if !self.writes.acquire_or_wait_for(id.clone(), timeout, cancel) {
            return false;
        }
        let remaining = timeout.saturating_sub(start.elapsed());
        if !self.reads.wait_unused(&id, remaining, cancel) {
            let cause = if cancel.is_some_and(CancelToken::is_cancelled) {
                "cancelled"
            } else {
                "timed out"
            };
            warn!(
                "write lock abandoned: reader drain {cause} after {:?} ({} reader(s) active)",
                start.elapsed(),
                self.reads.count(&id)
            );
            self.writes.release(&id);
            return false;
        }
        true
    }

    pub fn release_write(&self, id: &K) -> bool {
        self.writes.release(id)
    }

    pub fn is_write_locked(&self, id: &K) -> bool {
        self.writes.is_locked(id)
    }

    // ── Recovery ──────────────────────────────────────────────────────────

    pub fn force_release_reads(&self) {
        self.reads.force_release_all();
    }

    pub fn force_release_writes(&self) {
        self.writes.force_release_all();
    }
}

impl<K: Eq + Hash + Clone> Default for RwLockSet<K> {
    fn default() -> Self {
        Self::new()
    }
}
